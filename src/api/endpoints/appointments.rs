//! Appointment scheduling endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::endpoints::patients::CreatedResponse;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{appointment, patient};
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub date_time: String,
    #[serde(default, rename = "type")]
    pub appointment_type: String,
}

/// Accepted scheduling layouts; clients send a few dialects of ISO-ish local time.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

fn parse_schedule_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// `POST /api/appointments` — schedule an ROP scan appointment.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    if req.patient_id.trim().is_empty()
        || req.date_time.trim().is_empty()
        || req.appointment_type.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Missing required appointment fields (patientId, dateTime, type).".into(),
        ));
    }

    let scheduled_at = parse_schedule_datetime(req.date_time.trim())
        .ok_or_else(|| ApiError::BadRequest("Invalid datetime format.".into()))?;

    let patient_id = req.patient_id.trim().to_uppercase();

    let conn = ctx.conn()?;
    let found = patient::get_patient(&conn, &patient_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Patient ID {patient_id} not found.")))?;

    let record = Appointment {
        id: Uuid::new_v4(),
        patient_id,
        patient_name: found.name,
        scheduled_at,
        appointment_type: req.appointment_type.trim().to_string(),
        status: AppointmentStatus::Scheduled,
        created_at: chrono::Local::now().naive_local(),
    };
    appointment::insert_appointment(&conn, &record)?;

    tracing::info!(appointment_id = %record.id, patient_id = %record.patient_id, "Appointment scheduled");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Appointment scheduled successfully.".into(),
            id: record.id.to_string(),
        }),
    ))
}

/// `GET /api/appointments/today` — today's appointments, time-ascending.
pub async fn today(State(ctx): State<ApiContext>) -> Result<Json<Vec<Appointment>>, ApiError> {
    let conn = ctx.conn()?;
    let today = chrono::Local::now().date_naive();
    let appointments = appointment::list_appointments_on(&conn, today)?;
    Ok(Json(appointments))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_datetime_layouts() {
        for s in [
            "2026-09-17T09:00:00",
            "2026-09-17T09:00",
            "2026-09-17 09:00:00",
            "2026-09-17 09:00",
        ] {
            assert!(parse_schedule_datetime(s).is_some(), "failed on {s}");
        }
    }

    #[test]
    fn rejects_garbage_datetime() {
        assert!(parse_schedule_datetime("tomorrow at nine").is_none());
        assert!(parse_schedule_datetime("2026-17-90 99:00").is_none());
    }
}
