use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts, LIST_LIMIT};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str =
    "patient_id, name, email, phone, birth_date, notes, created_at, created_by";

type PatientRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn patient_row(row: &Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn patient_from_row(raw: PatientRow) -> Result<Patient, DatabaseError> {
    let (patient_id, name, email, phone, birth_date, notes, created_at, created_by) = raw;
    Ok(Patient {
        patient_id,
        name,
        email,
        phone,
        birth_date,
        notes,
        created_at: parse_ts("created_at", &created_at)?,
        created_by,
    })
}

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (patient_id, name, email, phone, birth_date, notes, created_at,
         created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.patient_id,
            patient.name,
            patient.email,
            patient.phone,
            patient.birth_date,
            patient.notes,
            format_ts(&patient.created_at),
            patient.created_by,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?1"),
            params![patient_id],
            patient_row,
        )
        .optional()?;
    raw.map(patient_from_row).transpose()
}

/// First patient registered under `email` (oldest wins, case-insensitive).
pub fn get_patient_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {PATIENT_COLUMNS} FROM patients WHERE email = ?1 COLLATE NOCASE
                 ORDER BY created_at ASC LIMIT 1"
            ),
            params![email],
            patient_row,
        )
        .optional()?;
    raw.map(patient_from_row).transpose()
}

/// Display name only, for denormalizing list responses.
pub fn get_patient_name(conn: &Connection, patient_id: &str) -> Result<Option<String>, DatabaseError> {
    let name = conn
        .query_row(
            "SELECT name FROM patients WHERE patient_id = ?1",
            params![patient_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(name)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC LIMIT {LIST_LIMIT}"
    ))?;
    let rows = stmt.query_map([], patient_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

pub fn patient_exists(conn: &Connection, patient_id: &str) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE patient_id = ?1)",
        params![patient_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}
