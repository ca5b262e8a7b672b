use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_opt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const REMINDER_COLUMNS: &str = "reminder_id, patient_id, appointment_id, message, reminder_type,
     scheduled_for, sent, sent_at, created_at, created_by";

type ReminderRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    bool,
    Option<String>,
    String,
    String,
);

fn reminder_row(row: &Row<'_>) -> rusqlite::Result<ReminderRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn reminder_from_row(raw: ReminderRow) -> Result<Reminder, DatabaseError> {
    let (
        reminder_id,
        patient_id,
        appointment_id,
        message,
        reminder_type,
        scheduled_for,
        sent,
        sent_at,
        created_at,
        created_by,
    ) = raw;
    Ok(Reminder {
        reminder_id,
        patient_id,
        appointment_id,
        message,
        reminder_type: ReminderChannel::from_str(&reminder_type)?,
        scheduled_for: parse_ts("scheduled_for", &scheduled_for)?,
        sent,
        sent_at: parse_opt_ts("sent_at", sent_at)?,
        created_at: parse_ts("created_at", &created_at)?,
        created_by,
    })
}

pub fn insert_reminder(conn: &Connection, reminder: &Reminder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (reminder_id, patient_id, appointment_id, message, reminder_type,
         scheduled_for, sent, sent_at, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            reminder.reminder_id,
            reminder.patient_id,
            reminder.appointment_id,
            reminder.message,
            reminder.reminder_type.as_str(),
            format_ts(&reminder.scheduled_for),
            reminder.sent,
            reminder.sent_at.as_ref().map(format_ts),
            format_ts(&reminder.created_at),
            reminder.created_by,
        ],
    )?;
    Ok(())
}

pub fn get_reminder(conn: &Connection, reminder_id: &str) -> Result<Option<Reminder>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE reminder_id = ?1"),
            params![reminder_id],
            reminder_row,
        )
        .optional()?;
    raw.map(reminder_from_row).transpose()
}

/// Reminders ordered by when they are due, optionally for one patient.
pub fn list_reminders(
    conn: &Connection,
    patient_id: Option<&str>,
    limit: u32,
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REMINDER_COLUMNS} FROM reminders
         WHERE (?1 IS NULL OR patient_id = ?1)
         ORDER BY scheduled_for ASC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id, limit], reminder_row)?;

    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(reminder_from_row(row?)?);
    }
    Ok(reminders)
}
