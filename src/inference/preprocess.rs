//! Image preprocessing: raw encoded bytes → model-ready tensor.
//!
//! The steps mirror what the classifier was trained with: decode, force RGB,
//! resize (not crop) to the model's square input, rescale to [0,1], and add
//! a leading batch dimension so downstream inference always sees NHWC.

use image::imageops::FilterType;
use ndarray::Array4;

use super::InferenceError;

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Normalizes raw image bytes into a fixed-shape `[1, size, size, 3]` tensor.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    target_size: u32,
}

impl ImagePreprocessor {
    pub fn new(target_size: u32) -> Self {
        Self { target_size }
    }

    /// Decode, convert to RGB, resize, and rescale into a batch-of-one tensor.
    ///
    /// Grayscale, RGBA, and palette sources all pass through the same RGB
    /// conversion; the target resolution is configuration, never inferred
    /// from the input.
    pub fn prepare(&self, bytes: &[u8]) -> Result<Array4<f32>, InferenceError> {
        if bytes.len() < MIN_IMAGE_BYTES {
            return Err(InferenceError::Decode(format!(
                "input too small to be an image ({} bytes)",
                bytes.len()
            )));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(InferenceError::Decode(format!(
                "input exceeds {MAX_IMAGE_BYTES} byte limit"
            )));
        }

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        let size = self.target_size;
        let rgb = decoded
            .resize_exact(size, size, FilterType::CatmullRom)
            .to_rgb8();

        let tensor = Array4::from_shape_fn(
            (1, size as usize, size as usize, 3),
            |(_, y, x, c)| f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0,
        );

        Ok(tensor)
    }
}
