use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::{check_references, parse_when, required_text, RecordError};
use crate::authorization::{ensure_can_read, list_scope, require_staff, ListScope, Principal};
use crate::db::{self, LIST_LIMIT};
use crate::models::{new_id, Reminder, ReminderChannel, ReminderView, REMINDER_ID_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct NewReminder {
    pub patient_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub reminder_type: ReminderChannel,
    pub scheduled_for: String,
}

fn with_patient_names(
    conn: &Connection,
    reminders: Vec<Reminder>,
) -> Result<Vec<ReminderView>, RecordError> {
    reminders
        .into_iter()
        .map(|reminder| {
            let patient_name = db::get_patient_name(conn, &reminder.patient_id)?;
            Ok(ReminderView {
                reminder,
                patient_name,
            })
        })
        .collect()
}

/// Schedule a reminder. Delivery belongs to an external dispatcher, so
/// reminders are always stored unsent.
pub fn create_reminder(
    conn: &Connection,
    principal: &Principal,
    input: NewReminder,
) -> Result<ReminderView, RecordError> {
    require_staff(principal)?;
    let appointment_id = input.appointment_id.filter(|id| !id.trim().is_empty());
    check_references(conn, &input.patient_id, appointment_id.as_deref())?;

    let reminder = Reminder {
        reminder_id: new_id(REMINDER_ID_PREFIX),
        patient_id: input.patient_id,
        appointment_id,
        message: required_text("message", &input.message)?,
        reminder_type: input.reminder_type,
        scheduled_for: parse_when("scheduled_for", &input.scheduled_for)?,
        sent: false,
        sent_at: None,
        created_at: Utc::now(),
        created_by: principal.user_id.clone(),
    };
    db::insert_reminder(conn, &reminder)?;
    tracing::info!(
        reminder_id = %reminder.reminder_id,
        channel = %reminder.reminder_type,
        "Reminder scheduled"
    );

    let patient_name = db::get_patient_name(conn, &reminder.patient_id)?;
    Ok(ReminderView {
        reminder,
        patient_name,
    })
}

/// Reminders visible to the principal, soonest first.
pub fn list_reminders(
    conn: &Connection,
    principal: &Principal,
    patient_filter: Option<&str>,
) -> Result<Vec<ReminderView>, RecordError> {
    let scope = list_scope(conn, principal, patient_filter)?;
    if scope == ListScope::Nothing {
        return Ok(Vec::new());
    }
    let reminders = db::list_reminders(conn, scope.patient_filter(), LIST_LIMIT)?;
    with_patient_names(conn, reminders)
}

pub fn get_reminder(
    conn: &Connection,
    principal: &Principal,
    reminder_id: &str,
) -> Result<ReminderView, RecordError> {
    let reminder = db::get_reminder(conn, reminder_id)?
        .ok_or_else(|| RecordError::not_found("Reminder", reminder_id))?;
    ensure_can_read(conn, principal, &reminder.patient_id)?;
    let patient_name = db::get_patient_name(conn, &reminder.patient_id)?;
    Ok(ReminderView {
        reminder,
        patient_name,
    })
}
