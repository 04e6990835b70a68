//! Classifier backends: a trait over "tensor in, probability vector out",
//! with an ONNX Runtime implementation behind the `onnx-model` feature and
//! a deterministic mock for tests and model-less builds.

use ndarray::Array4;

use super::InferenceError;

/// A loaded classification model. Implementations must be safe to share
/// across request handlers; the session itself is immutable after load.
pub trait Classifier: Send + Sync {
    /// Run forward inference on a batch-of-one tensor, returning the raw
    /// probability vector (index-aligned with the configured label list).
    fn classify(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier — behind `onnx-model` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-model")]
mod onnx {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use ndarray::Array4;
    use ort::session::Session;

    use super::{Classifier, InferenceError};

    /// Explicit load state. A failed load is cached so each request does not
    /// repeat an expensive failing disk/initialization attempt.
    enum ModelState {
        NotLoaded,
        Loaded(Session),
        Failed(String),
    }

    /// ONNX Runtime classifier with lazy, idempotent model loading.
    ///
    /// Uses interior mutability (Mutex) because `Session::run` requires
    /// `&mut self` and the load itself must be serialized anyway.
    pub struct OnnxClassifier {
        model_path: PathBuf,
        num_classes: usize,
        state: Mutex<ModelState>,
    }

    impl OnnxClassifier {
        /// Create a classifier for the model at `model_path`. The file is not
        /// touched until the first `classify` call.
        pub fn new(model_path: &Path, num_classes: usize) -> Self {
            Self {
                model_path: model_path.to_path_buf(),
                num_classes,
                state: Mutex::new(ModelState::NotLoaded),
            }
        }

        fn load_session(path: &Path) -> Result<Session, String> {
            if !path.exists() {
                return Err(format!("model file not found: {}", path.display()));
            }
            Session::builder()
                .map_err(|e: ort::Error| e.to_string())?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| e.to_string())?
                .commit_from_file(path)
                .map_err(|e: ort::Error| format!("ONNX load failed: {e}"))
        }
    }

    impl Classifier for OnnxClassifier {
        fn classify(&self, input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            use ort::value::TensorRef;

            let mut state = self
                .state
                .lock()
                .map_err(|_| InferenceError::Inference("model lock poisoned".into()))?;

            if matches!(*state, ModelState::NotLoaded) {
                match Self::load_session(&self.model_path) {
                    Ok(session) => {
                        tracing::info!(path = %self.model_path.display(), "Classifier model loaded");
                        *state = ModelState::Loaded(session);
                    }
                    Err(reason) => {
                        tracing::error!(path = %self.model_path.display(), %reason, "Classifier model load failed");
                        *state = ModelState::Failed(reason);
                    }
                }
            }

            let session = match &mut *state {
                ModelState::Loaded(session) => session,
                ModelState::Failed(reason) => {
                    return Err(InferenceError::ModelUnavailable(reason.clone()));
                }
                ModelState::NotLoaded => unreachable!("load attempted above"),
            };

            let tensor = TensorRef::from_array_view(input)
                .map_err(|e| InferenceError::Inference(e.to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| InferenceError::Inference(format!("ONNX inference failed: {e}")))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Inference(format!("Output extraction: {e}")))?;

            // Expect [1, num_classes]; anything else means the configured
            // label list does not match this model.
            if shape.len() != 2 || shape[0] != 1 || shape[1] as usize != self.num_classes {
                return Err(InferenceError::Inference(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {}]",
                    self.num_classes
                )));
            }

            Ok(data[..self.num_classes].to_vec())
        }
    }
}

#[cfg(feature = "onnx-model")]
pub use onnx::OnnxClassifier;

// ═══════════════════════════════════════════════════════════
// Mock classifier
// ═══════════════════════════════════════════════════════════

/// Deterministic classifier stand-in. Always predicts a fixed class with a
/// fixed confidence, spreading the remainder over the other classes.
pub struct MockClassifier {
    num_classes: usize,
    winner: usize,
    confidence: f32,
}

impl MockClassifier {
    /// Default mock: predicts class 0 with high confidence.
    pub fn new(num_classes: usize) -> Self {
        Self::predicting(num_classes, 0, 0.95)
    }

    /// Mock that always predicts `winner` with the given confidence.
    pub fn predicting(num_classes: usize, winner: usize, confidence: f32) -> Self {
        assert!(winner < num_classes, "winner index out of range");
        Self {
            num_classes,
            winner,
            confidence,
        }
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let rest = (1.0 - self.confidence) / (self.num_classes.max(2) - 1) as f32;
        let mut probs = vec![rest; self.num_classes];
        probs[self.winner] = self.confidence;
        Ok(probs)
    }
}
