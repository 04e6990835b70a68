use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{ImageStatus, ReviewStatus};
use crate::models::{AiResult, ImageRecord};

use super::{format_datetime, parse_datetime};

const IMAGE_COLUMNS: &str = "id, patient_id, patient_name, filename, file_size, upload_time,
     status, ai_status, prediction, probability";

pub fn insert_image(conn: &Connection, record: &ImageRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO images (id, patient_id, patient_name, filename, file_size, upload_time,
         status, ai_status, prediction, probability)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id.to_string(),
            record.patient_id,
            record.patient_name,
            record.filename,
            record.file_size,
            format_datetime(&record.upload_time),
            record.status.as_str(),
            record.ai_result.status.as_str(),
            record.ai_result.prediction,
            record.ai_result.probability,
        ],
    )?;
    Ok(())
}

/// Advance the overall processing status of an image record.
pub fn set_image_status(
    conn: &Connection,
    id: &Uuid,
    status: ImageStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE images SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ImageRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Fold a classification outcome into the record: overall status plus the
/// nested ai result in one write.
pub fn apply_classification(
    conn: &Connection,
    id: &Uuid,
    status: ImageStatus,
    ai: &AiResult,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE images SET status = ?2, ai_status = ?3, prediction = ?4, probability = ?5
         WHERE id = ?1",
        params![
            id.to_string(),
            status.as_str(),
            ai.status.as_str(),
            ai.prediction,
            ai.probability,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ImageRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Most recent uploads, newest first (scanner history panel).
pub fn recent_images(conn: &Connection, limit: i64) -> Result<Vec<ImageRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images ORDER BY upload_time DESC LIMIT ?1"
    ))?;

    let rows = stmt.query_map(params![limit], map_image_row)?;
    collect_images(rows)
}

/// High-risk records awaiting doctor review, newest first.
///
/// Filters to pending-review records whose prediction is in the configured
/// high-risk label set, excluding anything a doctor already signed off.
pub fn review_queue(
    conn: &Connection,
    high_risk_labels: &[&str],
) -> Result<Vec<ImageRecord>, DatabaseError> {
    if high_risk_labels.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; high_risk_labels.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images
         WHERE ai_status = 'pending_review'
           AND status != 'reviewed'
           AND prediction IN ({placeholders})
         ORDER BY upload_time DESC"
    ))?;

    let rows = stmt.query_map(params_from_iter(high_risk_labels.iter()), map_image_row)?;
    collect_images(rows)
}

pub fn count_images(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?)
}

pub fn count_uploaded_on(conn: &Connection, day: NaiveDate) -> Result<i64, DatabaseError> {
    let start = format_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = format_datetime(
        &day.succ_opt()
            .unwrap_or(day)
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default(),
    );
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM images WHERE upload_time >= ?1 AND upload_time < ?2",
        params![start, end],
        |row| row.get(0),
    )?)
}

pub fn count_pending_review(
    conn: &Connection,
    high_risk_labels: &[&str],
) -> Result<i64, DatabaseError> {
    if high_risk_labels.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; high_risk_labels.len()].join(", ");
    Ok(conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM images
             WHERE ai_status = 'pending_review' AND prediction IN ({placeholders})"
        ),
        params_from_iter(high_risk_labels.iter()),
        |row| row.get(0),
    )?)
}

pub fn count_reviewed(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM images WHERE status = 'reviewed'",
        [],
        |row| row.get(0),
    )?)
}

/// Records still waiting on classification (uploaded but not yet folded).
pub fn count_pending_processing(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM images WHERE ai_status = 'processing'",
        [],
        |row| row.get(0),
    )?)
}

struct ImageRow {
    id: String,
    patient_id: String,
    patient_name: String,
    filename: String,
    file_size: i64,
    upload_time: String,
    status: String,
    ai_status: String,
    prediction: Option<String>,
    probability: Option<f64>,
}

fn map_image_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        filename: row.get(3)?,
        file_size: row.get(4)?,
        upload_time: row.get(5)?,
        status: row.get(6)?,
        ai_status: row.get(7)?,
        prediction: row.get(8)?,
        probability: row.get(9)?,
    })
}

fn collect_images(
    rows: impl Iterator<Item = rusqlite::Result<ImageRow>>,
) -> Result<Vec<ImageRecord>, DatabaseError> {
    let mut records = Vec::new();
    for row in rows {
        records.push(image_from_row(row?)?);
    }
    Ok(records)
}

fn image_from_row(row: ImageRow) -> Result<ImageRecord, DatabaseError> {
    Ok(ImageRecord {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: row.patient_id,
        patient_name: row.patient_name,
        filename: row.filename,
        file_size: row.file_size,
        upload_time: parse_datetime(&row.upload_time)?,
        status: ImageStatus::from_str(&row.status)?,
        ai_result: AiResult {
            status: ReviewStatus::from_str(&row.ai_status)?,
            prediction: row.prediction,
            probability: row.probability,
        },
    })
}
