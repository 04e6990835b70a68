pub mod appointment;
pub mod image;
pub mod patient;

use chrono::{NaiveDate, NaiveDateTime};

use crate::db::DatabaseError;

/// Parse a stored timestamp, tolerating both `T` and space separators.
/// A malformed value is a constraint violation, same as an unknown enum.
pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| DatabaseError::ConstraintViolation(format!("malformed timestamp: {s}")))
}

/// Parse a stored calendar date (`%Y-%m-%d`).
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| DatabaseError::ConstraintViolation(format!("malformed date: {s}")))
}

/// Canonical storage format for timestamps.
pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}
