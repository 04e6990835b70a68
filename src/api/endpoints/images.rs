//! Scanner and doctor endpoints: image upload, history, file serving, and
//! the high-risk review queue.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config;
use crate::db::repository::image;
use crate::models::{AiResult, ImageRecord};
use crate::storage;

/// Scanner history panel shows the 10 most recent uploads.
const HISTORY_LIMIT: i64 = 10;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub image_id: String,
    pub ai_result: AiResult,
}

/// `POST /api/images/upload` — accept a fundus image for classification.
///
/// Multipart form with a `file` part and a `patientId` field. The whole
/// intake chain (store, record, classify, route) runs inline; a failed
/// classification still yields 201 since the upload itself succeeded.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut patient_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "patientId" => {
                patient_id = field.text().await.ok();
            }
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read file data.".into()))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let patient_id = patient_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("Patient ID is required in the form data.".into())
        })?;
    let (filename, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file part in the request.".into()))?;
    if filename.is_empty() {
        return Err(ApiError::BadRequest("No selected file.".into()));
    }

    let conn = ctx.conn()?;
    let record = ctx.intake.ingest(&conn, &patient_id, &filename, &bytes)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Image uploaded successfully and sent for AI processing.".into(),
            image_id: record.id.to_string(),
            ai_result: record.ai_result,
        }),
    ))
}

/// `GET /api/images/history` — the 10 most recent uploads.
pub async fn history(State(ctx): State<ApiContext>) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    let conn = ctx.conn()?;
    let records = image::recent_images(&conn, HISTORY_LIMIT)?;
    Ok(Json(records))
}

/// `GET /api/image/:filename` — serve a stored upload.
pub async fn fetch_file(
    State(ctx): State<ApiContext>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = storage::read_stored(ctx.intake.uploads_dir(), &filename)
        .ok_or_else(|| ApiError::NotFound("Image not found.".into()))?;

    let mime = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .to_string();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .body(axum::body::Body::from(bytes))
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "Response build failed").into_response()
        }))
}

/// `GET /api/images/review` — high-risk records awaiting doctor review.
/// An empty queue is a normal outcome and returns an empty array.
pub async fn review(State(ctx): State<ApiContext>) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    let conn = ctx.conn()?;
    let records = image::review_queue(&conn, &config::HIGH_RISK_LABELS)?;
    Ok(Json(records))
}
