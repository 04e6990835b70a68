use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::PatientStatus;
use crate::models::Patient;

use super::{format_datetime, parse_date, parse_datetime};

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (neonate_id, name, birth_date, gestational_age, weight,
         parent_name, parent_phone, parent_email, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            patient.neonate_id,
            patient.name,
            patient.birth_date.to_string(),
            patient.gestational_age,
            patient.weight,
            patient.parent_name,
            patient.parent_phone,
            patient.parent_email,
            patient.status.as_str(),
            format_datetime(&patient.created_at),
        ],
    )?;
    Ok(())
}

/// Look up a patient by their (already uppercased) neonate id.
pub fn get_patient(conn: &Connection, neonate_id: &str) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT neonate_id, name, birth_date, gestational_age, weight,
         parent_name, parent_phone, parent_email, status, created_at
         FROM patients WHERE neonate_id = ?1",
    )?;

    let result = stmt.query_row(params![neonate_id], |row| {
        Ok(PatientRow {
            neonate_id: row.get(0)?,
            name: row.get(1)?,
            birth_date: row.get(2)?,
            gestational_age: row.get(3)?,
            weight: row.get(4)?,
            parent_name: row.get(5)?,
            parent_phone: row.get(6)?,
            parent_email: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All patients, newest first (receptionist dashboard).
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT neonate_id, name, birth_date, gestational_age, weight,
         parent_name, parent_phone, parent_email, status, created_at
         FROM patients ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(PatientRow {
            neonate_id: row.get(0)?,
            name: row.get(1)?,
            birth_date: row.get(2)?,
            gestational_age: row.get(3)?,
            weight: row.get(4)?,
            parent_name: row.get(5)?,
            parent_phone: row.get(6)?,
            parent_email: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
        })
    })?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

struct PatientRow {
    neonate_id: String,
    name: String,
    birth_date: String,
    gestational_age: Option<String>,
    weight: Option<f64>,
    parent_name: String,
    parent_phone: Option<String>,
    parent_email: Option<String>,
    status: String,
    created_at: String,
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        neonate_id: row.neonate_id,
        name: row.name,
        birth_date: parse_date(&row.birth_date)?,
        gestational_age: row.gestational_age,
        weight: row.weight,
        parent_name: row.parent_name,
        parent_phone: row.parent_phone,
        parent_email: row.parent_email,
        status: PatientStatus::from_str(&row.status)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}
