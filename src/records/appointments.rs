use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::{optional_text, parse_when, required_text, RecordError};
use crate::authorization::{ensure_can_read, list_scope, require_staff, ListScope, Principal};
use crate::db::{self, LIST_LIMIT};
use crate::models::{new_id, Appointment, AppointmentView, APPOINTMENT_ID_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub procedure: String,
    pub diagnosis: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub appointment_date: Option<String>,
}

/// Join the patient's display name onto each appointment.
pub(crate) fn with_patient_names(
    conn: &Connection,
    appointments: Vec<Appointment>,
) -> Result<Vec<AppointmentView>, RecordError> {
    appointments
        .into_iter()
        .map(|appointment| {
            let patient_name = db::get_patient_name(conn, &appointment.patient_id)?;
            Ok(AppointmentView {
                appointment,
                patient_name,
            })
        })
        .collect()
}

pub fn create_appointment(
    conn: &Connection,
    principal: &Principal,
    input: NewAppointment,
) -> Result<AppointmentView, RecordError> {
    require_staff(principal)?;

    let patient_name = db::get_patient_name(conn, &input.patient_id)?
        .ok_or_else(|| RecordError::not_found("Patient", &input.patient_id))?;

    let now = Utc::now();
    let appointment_date = match input.appointment_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_when("appointment_date", raw)?,
        _ => now,
    };

    let appointment = Appointment {
        appointment_id: new_id(APPOINTMENT_ID_PREFIX),
        patient_id: input.patient_id,
        procedure: required_text("procedure", &input.procedure)?,
        diagnosis: required_text("diagnosis", &input.diagnosis)?,
        notes: optional_text(input.notes),
        appointment_date,
        created_at: now,
        created_by: principal.user_id.clone(),
    };
    db::insert_appointment(conn, &appointment)?;

    tracing::info!(
        appointment_id = %appointment.appointment_id,
        patient_id = %appointment.patient_id,
        "Appointment created"
    );
    Ok(AppointmentView {
        appointment,
        patient_name: Some(patient_name),
    })
}

/// Appointments visible to the principal, newest first.
pub fn list_appointments(
    conn: &Connection,
    principal: &Principal,
    patient_filter: Option<&str>,
) -> Result<Vec<AppointmentView>, RecordError> {
    let scope = list_scope(conn, principal, patient_filter)?;
    if scope == ListScope::Nothing {
        return Ok(Vec::new());
    }
    let appointments = db::list_appointments(conn, scope.patient_filter(), LIST_LIMIT)?;
    with_patient_names(conn, appointments)
}

pub fn get_appointment(
    conn: &Connection,
    principal: &Principal,
    appointment_id: &str,
) -> Result<AppointmentView, RecordError> {
    let appointment = db::get_appointment(conn, appointment_id)?
        .ok_or_else(|| RecordError::not_found("Appointment", appointment_id))?;
    ensure_can_read(conn, principal, &appointment.patient_id)?;
    let patient_name = db::get_patient_name(conn, &appointment.patient_id)?;
    Ok(AppointmentView {
        appointment,
        patient_name,
    })
}
