//! Image intake orchestration: validate patient → store file → create
//! record → classify → fold the result and route to the review queue.
//!
//! Per-record state machine: `uploaded → processing → processed | failed`.
//! The `reviewed` transition belongs to a future doctor action; the data
//! model reserves it but no endpoint drives it yet.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::db::repository::{image, patient};
use crate::db::DatabaseError;
use crate::inference::InferencePipeline;
use crate::models::enums::{ImageStatus, ReviewStatus};
use crate::models::{AiResult, ImageRecord};
use crate::storage;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Patient ID {0} not found")]
    PatientNotFound(String),

    #[error("No file data in upload")]
    EmptyFile,

    #[error("File storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Orchestrates the upload → classify → record flow for one image.
pub struct IntakeService {
    uploads_dir: PathBuf,
    pipeline: Arc<InferencePipeline>,
}

impl IntakeService {
    pub fn new(uploads_dir: PathBuf, pipeline: Arc<InferencePipeline>) -> Self {
        Self {
            uploads_dir,
            pipeline,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Accept one uploaded fundus image for an existing patient.
    ///
    /// The file is materialized on disk before the record is created, so a
    /// stored record always references a real file. Classification runs
    /// inline; its outcome (including failure) folds into the record rather
    /// than failing the upload.
    pub fn ingest(
        &self,
        conn: &Connection,
        patient_id: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<ImageRecord, IntakeError> {
        if bytes.is_empty() {
            return Err(IntakeError::EmptyFile);
        }

        let patient_id = patient_id.trim().to_uppercase();
        let patient = patient::get_patient(conn, &patient_id)?
            .ok_or_else(|| IntakeError::PatientNotFound(patient_id.clone()))?;

        let filename = storage::generate_filename(&patient_id, original_filename);
        storage::save_upload(&self.uploads_dir, &filename, bytes)?;

        let mut record = ImageRecord {
            id: Uuid::new_v4(),
            patient_id,
            patient_name: patient.name,
            filename,
            file_size: bytes.len() as i64,
            upload_time: chrono::Local::now().naive_local(),
            status: ImageStatus::Uploaded,
            ai_result: AiResult::processing(),
        };
        image::insert_image(conn, &record)?;

        image::set_image_status(conn, &record.id, ImageStatus::Processing)?;
        record.status = ImageStatus::Processing;

        let result = self.pipeline.classify_image(bytes);

        let (status, ai) = if result.is_processed() {
            let review = if is_high_risk(&result.prediction) {
                ReviewStatus::PendingReview
            } else {
                ReviewStatus::NotRequired
            };
            (
                ImageStatus::Processed,
                AiResult {
                    status: review,
                    prediction: Some(result.prediction),
                    probability: Some(result.probability),
                },
            )
        } else {
            (
                ImageStatus::Failed,
                AiResult {
                    status: ReviewStatus::Failed,
                    prediction: Some(result.prediction),
                    probability: Some(result.probability),
                },
            )
        };

        image::apply_classification(conn, &record.id, status, &ai)?;
        record.status = status;
        record.ai_result = ai;

        tracing::info!(
            image_id = %record.id,
            patient_id = %record.patient_id,
            status = record.status.as_str(),
            review = record.ai_result.status.as_str(),
            "Image intake complete"
        );

        Ok(record)
    }
}

/// Risk routing rule: these predictions require doctor review.
pub fn is_high_risk(prediction: &str) -> bool {
    config::HIGH_RISK_LABELS.contains(&prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CLASS_LABELS, MODEL_INPUT_SIZE};
    use crate::db::open_memory_database;
    use crate::db::repository::patient::insert_patient;
    use crate::inference::{ImagePreprocessor, MockClassifier};
    use crate::models::enums::PatientStatus;
    use crate::models::Patient;
    use ::image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn seed_patient(conn: &Connection) {
        let p = Patient {
            neonate_id: "N001".into(),
            name: "Baby Doe".into(),
            birth_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            gestational_age: None,
            weight: None,
            parent_name: "John Doe".into(),
            parent_phone: None,
            parent_email: None,
            status: PatientStatus::Active,
            created_at: chrono::Utc::now().naive_utc(),
        };
        insert_patient(conn, &p).unwrap();
    }

    fn test_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, ::image::Rgb([80, 30, 20])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    fn service_predicting(dir: &Path, winner: usize) -> IntakeService {
        let pipeline = Arc::new(InferencePipeline::new(
            ImagePreprocessor::new(MODEL_INPUT_SIZE),
            Arc::new(MockClassifier::predicting(CLASS_LABELS.len(), winner, 0.96)),
            &CLASS_LABELS,
        ));
        IntakeService::new(dir.to_path_buf(), pipeline)
    }

    #[test]
    fn unknown_patient_rejected_without_record() {
        let conn = open_memory_database().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let svc = service_predicting(dir.path(), 0);

        let err = svc.ingest(&conn, "n999", "scan.png", &test_png());
        assert!(matches!(err, Err(IntakeError::PatientNotFound(id)) if id == "N999"));
        assert_eq!(image::count_images(&conn).unwrap(), 0);
    }

    #[test]
    fn low_risk_upload_processed_not_queued() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn);
        let dir = tempfile::tempdir().unwrap();
        let svc = service_predicting(dir.path(), 0);

        let record = svc.ingest(&conn, "n001", "scan.png", &test_png()).unwrap();
        assert_eq!(record.status, ImageStatus::Processed);
        assert_eq!(record.ai_result.status, ReviewStatus::NotRequired);
        assert_eq!(
            record.ai_result.prediction.as_deref(),
            Some("Stage 0 (Normal)")
        );

        // File materialized under generated name.
        let stored = storage::read_stored(dir.path(), &record.filename).unwrap();
        assert_eq!(stored, test_png());
    }

    #[test]
    fn high_risk_upload_routed_to_review() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn);
        let dir = tempfile::tempdir().unwrap();
        let svc = service_predicting(dir.path(), 3);

        let record = svc.ingest(&conn, "N001", "scan.png", &test_png()).unwrap();
        assert_eq!(record.ai_result.status, ReviewStatus::PendingReview);

        let queue = image::review_queue(&conn, &crate::config::HIGH_RISK_LABELS).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, record.id);
    }

    #[test]
    fn undecodable_upload_still_accepted_as_failed() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn);
        let dir = tempfile::tempdir().unwrap();
        let svc = service_predicting(dir.path(), 0);

        let record = svc.ingest(&conn, "N001", "junk.bin", &[0x11; 256]).unwrap();
        assert_eq!(record.status, ImageStatus::Failed);
        assert_eq!(record.ai_result.status, ReviewStatus::Failed);
        assert_eq!(
            record.ai_result.prediction.as_deref(),
            Some("Preprocessing Error")
        );
    }

    #[test]
    fn empty_upload_rejected() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn);
        let dir = tempfile::tempdir().unwrap();
        let svc = service_predicting(dir.path(), 0);

        assert!(matches!(
            svc.ingest(&conn, "N001", "scan.png", &[]),
            Err(IntakeError::EmptyFile)
        ));
    }

    #[test]
    fn high_risk_rule_matches_configured_labels() {
        assert!(is_high_risk("Stage 3 (High-Risk)"));
        assert!(is_high_risk("Urgent Referral"));
        assert!(!is_high_risk("Stage 1"));
    }
}
