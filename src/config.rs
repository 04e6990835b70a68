use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "RopScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ordered class labels, index-aligned with the classifier output vector.
///
/// This mapping is configuration, not inferred from the model: the pipeline
/// validates the model's output cardinality against this list on every run.
pub const CLASS_LABELS: [&str; 4] = [
    "Stage 0 (Normal)",
    "Stage 1",
    "Stage 2",
    "Stage 3 (High-Risk)",
];

/// Predictions that route an image record to the doctor review queue.
pub const HIGH_RISK_LABELS: [&str; 2] = ["Stage 3 (High-Risk)", "Urgent Referral"];

/// Square input resolution expected by the classifier (ResNet-style CNN).
pub const MODEL_INPUT_SIZE: u32 = 224;

/// Maximum accepted upload size. Fundus camera exports stay well under this.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024; // 25 MB

/// Get the application data directory.
/// `$ROPSCAN_DATA_DIR` if set, otherwise ~/RopScan/.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ROPSCAN_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("RopScan")
}

/// Directory where uploaded fundus images are stored, one file per upload.
pub fn uploads_dir() -> PathBuf {
    data_dir().join("uploads")
}

/// SQLite database file path.
pub fn database_path() -> PathBuf {
    data_dir().join("ropscan.db")
}

/// On-disk path of the pre-trained ONNX classifier.
pub fn model_path() -> PathBuf {
    data_dir().join("models").join("rop_classifier.onnx")
}

/// Socket address the HTTP server binds to.
/// `$ROPSCAN_ADDR` if set, otherwise 127.0.0.1:5000.
pub fn bind_addr() -> SocketAddr {
    std::env::var("ROPSCAN_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5000)))
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,ropscan=debug".to_string()
}
