pub mod enums;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use enums::{AppointmentStatus, ImageStatus, PatientStatus, ReviewStatus};

/// A neonate enrolled for ROP screening.
///
/// `neonate_id` is the human-assigned code (e.g. "N001"), uppercased at the
/// API boundary so uniqueness is case-insensitive. Immutable after creation
/// except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub neonate_id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gestational_age: Option<String>,
    pub weight: Option<f64>,
    pub parent_name: String,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
    pub status: PatientStatus,
    pub created_at: NaiveDateTime,
}

/// A scheduled ROP scan appointment. Carries a denormalized patient name
/// so dashboard lists render without a join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: String,
    pub patient_name: String,
    pub scheduled_at: NaiveDateTime,
    #[serde(rename = "type")]
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
}

/// Classification outcome attached to an uploaded image.
///
/// `status` drives the review queues: high-risk predictions land in
/// `pending_review`, everything else in `not_required`. A failed pipeline
/// run is a valid business outcome, stored as `failed` with a diagnostic
/// label in place of a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResult {
    pub status: ReviewStatus,
    pub prediction: Option<String>,
    pub probability: Option<f64>,
}

impl AiResult {
    /// Initial state for a freshly created image record.
    pub fn processing() -> Self {
        Self {
            status: ReviewStatus::Processing,
            prediction: None,
            probability: None,
        }
    }
}

/// An uploaded fundus image and its classification state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub patient_name: String,
    pub filename: String,
    /// Size of the stored file in bytes.
    pub file_size: i64,
    pub upload_time: NaiveDateTime,
    pub status: ImageStatus,
    pub ai_result: AiResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_record_serializes_nested_ai_result() {
        let record = ImageRecord {
            id: Uuid::new_v4(),
            patient_id: "N001".into(),
            patient_name: "Baby Doe".into(),
            filename: "N001_abc.png".into(),
            file_size: 2048,
            upload_time: chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            status: ImageStatus::Processed,
            ai_result: AiResult {
                status: ReviewStatus::PendingReview,
                prediction: Some("Stage 3 (High-Risk)".into()),
                probability: Some(0.98),
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["patientId"], "N001");
        assert_eq!(json["fileSize"], 2048);
        assert_eq!(json["aiResult"]["status"], "pending_review");
        assert_eq!(json["aiResult"]["prediction"], "Stage 3 (High-Risk)");
    }

    #[test]
    fn appointment_type_serializes_as_type() {
        let appt = Appointment {
            id: Uuid::new_v4(),
            patient_id: "N001".into(),
            patient_name: "Baby Doe".into(),
            scheduled_at: chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            appointment_type: "Initial Screening".into(),
            status: AppointmentStatus::Scheduled,
            created_at: chrono::Utc::now().naive_utc(),
        };

        let json = serde_json::to_value(&appt).unwrap();
        assert_eq!(json["type"], "Initial Screening");
        assert_eq!(json["status"], "scheduled");
    }
}
