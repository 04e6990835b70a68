//! Receptionist endpoints: patient registration and listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::patient;
use crate::models::enums::PatientStatus;
use crate::models::Patient;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    #[serde(default)]
    pub neonate_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: String,
    pub gestational_age: Option<String>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub parent_name: String,
    pub parent_phone: Option<String>,
    pub parent_email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
}

/// `POST /api/patients` — create a patient record.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    if req.neonate_id.trim().is_empty()
        || req.name.trim().is_empty()
        || req.birth_date.trim().is_empty()
        || req.parent_name.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Missing required patient fields.".into(),
        ));
    }

    let birth_date = NaiveDate::parse_from_str(req.birth_date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date format provided.".into()))?;

    if let Some(w) = req.weight {
        if !w.is_finite() || w < 0.0 {
            return Err(ApiError::BadRequest("Invalid number format provided.".into()));
        }
    }

    let neonate_id = req.neonate_id.trim().to_uppercase();

    let conn = ctx.conn()?;
    if patient::get_patient(&conn, &neonate_id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Patient ID {neonate_id} already exists."
        )));
    }

    let record = Patient {
        neonate_id: neonate_id.clone(),
        name: req.name.trim().to_string(),
        birth_date,
        gestational_age: req.gestational_age,
        weight: req.weight,
        parent_name: req.parent_name.trim().to_string(),
        parent_phone: req.parent_phone,
        parent_email: req.parent_email,
        status: PatientStatus::Active,
        created_at: chrono::Local::now().naive_local(),
    };
    patient::insert_patient(&conn, &record)?;

    tracing::info!(%neonate_id, "Patient record created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Patient record created successfully.".into(),
            id: neonate_id,
        }),
    ))
}

/// `GET /api/patients` — all patients, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.conn()?;
    let patients = patient::list_patients(&conn)?;
    Ok(Json(patients))
}
