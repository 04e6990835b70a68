//! The intake classification pipeline: raw image bytes in, a structured
//! risk classification out.
//!
//! Failures are result values, not faults: dashboards must always receive a
//! well-formed record, so every error folds into a `failed` classification
//! with a diagnostic label. Each call is independent; the only side effect
//! is the classifier's one-time model load.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::preprocess::ImagePreprocessor;
use super::{Classifier, InferenceError};

/// Diagnostic labels for failed classifications.
const PREPROCESSING_ERROR: &str = "Preprocessing Error";
const MODEL_ERROR: &str = "Model Error";
const INFERENCE_EXCEPTION: &str = "Inference Exception";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStatus {
    Processed,
    Failed,
}

/// Structured outcome of running one fundus image through the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub prediction: String,
    pub probability: f64,
    pub status: ClassificationStatus,
}

impl ClassificationResult {
    fn failed(prediction: &str) -> Self {
        Self {
            prediction: prediction.to_string(),
            probability: 0.0,
            status: ClassificationStatus::Failed,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.status == ClassificationStatus::Processed
    }
}

/// Composes preprocessing and classification into one call.
pub struct InferencePipeline {
    preprocessor: ImagePreprocessor,
    classifier: Arc<dyn Classifier>,
    labels: &'static [&'static str],
}

impl InferencePipeline {
    pub fn new(
        preprocessor: ImagePreprocessor,
        classifier: Arc<dyn Classifier>,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            preprocessor,
            classifier,
            labels,
        }
    }

    /// Classify raw encoded image bytes. Never errors.
    pub fn classify_image(&self, bytes: &[u8]) -> ClassificationResult {
        let _span = tracing::debug_span!("classify_image", image_size = bytes.len()).entered();
        let start = std::time::Instant::now();

        let tensor = match self.preprocessor.prepare(bytes) {
            Ok(tensor) => tensor,
            Err(e) => {
                tracing::warn!(error = %e, "Preprocessing failed");
                return ClassificationResult::failed(PREPROCESSING_ERROR);
            }
        };

        let probs = match self.classifier.classify(&tensor) {
            Ok(probs) => probs,
            Err(InferenceError::ModelUnavailable(reason)) => {
                tracing::warn!(%reason, "Classifier unavailable");
                return ClassificationResult::failed(MODEL_ERROR);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Inference failed");
                return ClassificationResult::failed(INFERENCE_EXCEPTION);
            }
        };

        // The label list is configuration; a cardinality mismatch means the
        // model on disk is not the one this deployment was configured for.
        if probs.len() != self.labels.len() {
            tracing::error!(
                model_classes = probs.len(),
                configured_labels = self.labels.len(),
                "Label list does not match model output cardinality"
            );
            return ClassificationResult::failed(INFERENCE_EXCEPTION);
        }

        // Argmax, ties broken by lowest index (strict > keeps first seen).
        let (best_idx, best_prob) = probs
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |(bi, bp), (i, &p)| {
                if p > bp {
                    (i, p)
                } else {
                    (bi, bp)
                }
            });

        let probability = (f64::from(best_prob) * 10_000.0).round() / 10_000.0;
        let prediction = self.labels[best_idx].to_string();

        tracing::debug!(
            %prediction,
            probability,
            elapsed_ms = %start.elapsed().as_millis(),
            "Image classified"
        );

        ClassificationResult {
            prediction,
            probability,
            status: ClassificationStatus::Processed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CLASS_LABELS, MODEL_INPUT_SIZE};
    use crate::inference::MockClassifier;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use ndarray::Array4;
    use std::io::Cursor;

    struct FailingClassifier(InferenceError);

    impl Classifier for FailingClassifier {
        fn classify(&self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            Err(match &self.0 {
                InferenceError::ModelUnavailable(s) => {
                    InferenceError::ModelUnavailable(s.clone())
                }
                InferenceError::Inference(s) => InferenceError::Inference(s.clone()),
                other => InferenceError::Inference(other.to_string()),
            })
        }
    }

    fn test_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(48, 48, image::Rgb([90, 40, 10])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    fn pipeline_with(classifier: Arc<dyn Classifier>) -> InferencePipeline {
        InferencePipeline::new(
            ImagePreprocessor::new(MODEL_INPUT_SIZE),
            classifier,
            &CLASS_LABELS,
        )
    }

    #[test]
    fn undecodable_bytes_fold_into_preprocessing_error() {
        let pipeline = pipeline_with(Arc::new(MockClassifier::new(CLASS_LABELS.len())));
        let result = pipeline.classify_image(&[0xDE; 300]);
        assert_eq!(result.prediction, "Preprocessing Error");
        assert_eq!(result.probability, 0.0);
        assert_eq!(result.status, ClassificationStatus::Failed);
    }

    #[test]
    fn unavailable_model_folds_into_model_error() {
        let pipeline = pipeline_with(Arc::new(FailingClassifier(
            InferenceError::ModelUnavailable("no file".into()),
        )));
        let result = pipeline.classify_image(&test_png());
        assert_eq!(result.prediction, "Model Error");
        assert_eq!(result.status, ClassificationStatus::Failed);
    }

    #[test]
    fn runtime_failure_folds_into_inference_exception() {
        let pipeline = pipeline_with(Arc::new(FailingClassifier(InferenceError::Inference(
            "shape mismatch".into(),
        ))));
        let result = pipeline.classify_image(&test_png());
        assert_eq!(result.prediction, "Inference Exception");
        assert_eq!(result.status, ClassificationStatus::Failed);
    }

    #[test]
    fn success_maps_argmax_to_configured_label() {
        let pipeline = pipeline_with(Arc::new(MockClassifier::predicting(
            CLASS_LABELS.len(),
            3,
            0.97,
        )));
        let result = pipeline.classify_image(&test_png());
        assert!(result.is_processed());
        assert_eq!(result.prediction, "Stage 3 (High-Risk)");
        assert!((0.0..=1.0).contains(&result.probability));
    }

    #[test]
    fn probability_rounded_to_four_decimals() {
        let pipeline = pipeline_with(Arc::new(MockClassifier::predicting(
            CLASS_LABELS.len(),
            1,
            0.912_345,
        )));
        let result = pipeline.classify_image(&test_png());
        assert_eq!(result.probability, 0.9123);
    }

    #[test]
    fn ties_break_to_lowest_index() {
        struct UniformClassifier;
        impl Classifier for UniformClassifier {
            fn classify(&self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
                Ok(vec![0.25; 4])
            }
        }
        let pipeline = pipeline_with(Arc::new(UniformClassifier));
        let result = pipeline.classify_image(&test_png());
        assert_eq!(result.prediction, CLASS_LABELS[0]);
    }

    #[test]
    fn cardinality_mismatch_is_a_failed_result() {
        struct WrongWidthClassifier;
        impl Classifier for WrongWidthClassifier {
            fn classify(&self, _input: &Array4<f32>) -> Result<Vec<f32>, InferenceError> {
                Ok(vec![0.5, 0.5])
            }
        }
        let pipeline = pipeline_with(Arc::new(WrongWidthClassifier));
        let result = pipeline.classify_image(&test_png());
        assert_eq!(result.prediction, "Inference Exception");
        assert_eq!(result.status, ClassificationStatus::Failed);
    }
}
