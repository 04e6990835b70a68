use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::Appointment;

use super::{format_datetime, parse_datetime};

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, patient_name, scheduled_at,
         appointment_type, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            appt.id.to_string(),
            appt.patient_id,
            appt.patient_name,
            format_datetime(&appt.scheduled_at),
            appt.appointment_type,
            appt.status.as_str(),
            format_datetime(&appt.created_at),
        ],
    )?;
    Ok(())
}

/// Appointments scheduled on the given calendar day, time-ascending.
pub fn list_appointments_on(
    conn: &Connection,
    day: NaiveDate,
) -> Result<Vec<Appointment>, DatabaseError> {
    let start = format_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = format_datetime(
        &day.succ_opt()
            .unwrap_or(day)
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default(),
    );

    let mut stmt = conn.prepare(
        "SELECT id, patient_id, patient_name, scheduled_at, appointment_type, status, created_at
         FROM appointments
         WHERE scheduled_at >= ?1 AND scheduled_at < ?2
         ORDER BY scheduled_at ASC",
    )?;

    let rows = stmt.query_map(params![start, end], |row| {
        Ok(AppointmentRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            patient_name: row.get(2)?,
            scheduled_at: row.get(3)?,
            appointment_type: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    })?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Count of appointments scheduled on the given calendar day (stats).
pub fn count_appointments_on(conn: &Connection, day: NaiveDate) -> Result<i64, DatabaseError> {
    let start = format_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = format_datetime(
        &day.succ_opt()
            .unwrap_or(day)
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default(),
    );
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE scheduled_at >= ?1 AND scheduled_at < ?2",
        params![start, end],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct AppointmentRow {
    id: String,
    patient_id: String,
    patient_name: String,
    scheduled_at: String,
    appointment_type: String,
    status: String,
    created_at: String,
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: row.patient_id,
        patient_name: row.patient_name,
        scheduled_at: parse_datetime(&row.scheduled_at)?,
        appointment_type: row.appointment_type,
        status: AppointmentStatus::from_str(&row.status)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}
