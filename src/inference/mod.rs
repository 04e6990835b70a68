pub mod classifier;
pub mod pipeline;
pub mod preprocess;

pub use classifier::{Classifier, MockClassifier};
#[cfg(feature = "onnx-model")]
pub use classifier::OnnxClassifier;
pub use pipeline::{ClassificationResult, InferencePipeline};
pub use preprocess::ImagePreprocessor;

use thiserror::Error;

/// Failures along the preprocess → classify path.
///
/// The pipeline folds every variant into a well-formed failed
/// `ClassificationResult`; these never cross the HTTP boundary as errors.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}
