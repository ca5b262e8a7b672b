use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "appointment_id, patient_id, procedure, diagnosis, notes,
     appointment_date, created_at, created_by";

type AppointmentRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    String,
);

fn appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
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

fn appointment_from_row(raw: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let (appointment_id, patient_id, procedure, diagnosis, notes, date, created_at, created_by) =
        raw;
    Ok(Appointment {
        appointment_id,
        patient_id,
        procedure,
        diagnosis,
        notes,
        appointment_date: parse_ts("appointment_date", &date)?,
        created_at: parse_ts("created_at", &created_at)?,
        created_by,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (appointment_id, patient_id, procedure, diagnosis, notes,
         appointment_date, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            appt.appointment_id,
            appt.patient_id,
            appt.procedure,
            appt.diagnosis,
            appt.notes,
            format_ts(&appt.appointment_date),
            format_ts(&appt.created_at),
            appt.created_by,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    appointment_id: &str,
) -> Result<Option<Appointment>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"),
            params![appointment_id],
            appointment_row,
        )
        .optional()?;
    raw.map(appointment_from_row).transpose()
}

/// Appointments, newest first, optionally restricted to one patient.
pub fn list_appointments(
    conn: &Connection,
    patient_id: Option<&str>,
    limit: u32,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE (?1 IS NULL OR patient_id = ?1)
         ORDER BY created_at DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id, limit], appointment_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}
