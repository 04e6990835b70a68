//! File-system storage for uploaded fundus images: one file per upload,
//! named `{PATIENTID}_{token}{ext}` under the configured uploads directory.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Generate a collision-resistant stored filename for an upload.
///
/// The random token makes collisions practically impossible; the original
/// extension is kept (sanitized) so served files get a sensible MIME type.
pub fn generate_filename(patient_id: &str, original_filename: &str) -> String {
    let token = Uuid::new_v4().simple();
    let ext = sanitize_extension(original_filename);
    format!("{patient_id}_{token}{ext}")
}

/// Extract and sanitize the extension of a client-supplied filename.
/// Returns either an empty string or a lowercased `.ext` of safe characters.
fn sanitize_extension(filename: &str) -> String {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext.len() <= 8 => {
            let clean: String = ext
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if clean.is_empty() {
                String::new()
            } else {
                format!(".{clean}")
            }
        }
        _ => String::new(),
    }
}

/// Write upload bytes under the uploads directory, creating it if needed.
/// Returns the full path of the stored file.
pub fn save_upload(uploads_dir: &Path, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    std::fs::create_dir_all(uploads_dir)?;
    let path = uploads_dir.join(filename);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Read a stored file back by its filename.
///
/// Rejects anything that is not a bare filename (path separators, dot-dot)
/// so clients cannot traverse out of the uploads directory.
pub fn read_stored(uploads_dir: &Path, filename: &str) -> Option<Vec<u8>> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || filename.contains('\0')
    {
        return None;
    }
    let path = uploads_dir.join(filename);
    if !path.is_file() {
        return None;
    }
    std::fs::read(&path).ok()
}
