//! `GET /api/stats` — aggregate counts for the role dashboards.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config;
use crate::db::repository::{appointment, image, patient};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_patients: i64,
    pub appointments_today: i64,
    /// Doctor: high-risk records awaiting review.
    pub pending_review: i64,
    /// Doctor: records already signed off.
    pub total_reviewed: i64,
    /// Scanner: uploads since midnight.
    pub images_uploaded_today: i64,
    pub total_uploads: i64,
    /// Scanner: records whose classification has not folded in yet.
    pub pending_processing: i64,
}

pub async fn dashboard(State(ctx): State<ApiContext>) -> Result<Json<StatsResponse>, ApiError> {
    let conn = ctx.conn()?;
    let today = chrono::Local::now().date_naive();

    Ok(Json(StatsResponse {
        total_patients: patient::count_patients(&conn)?,
        appointments_today: appointment::count_appointments_on(&conn, today)?,
        pending_review: image::count_pending_review(&conn, &config::HIGH_RISK_LABELS)?,
        total_reviewed: image::count_reviewed(&conn)?,
        images_uploaded_today: image::count_uploaded_on(&conn, today)?,
        total_uploads: image::count_images(&conn)?,
        pending_processing: image::count_pending_processing(&conn)?,
    }))
}
