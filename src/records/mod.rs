//! Clinical record operations: role checks, reference validation and
//! denormalized views over the repository layer.
//!
//! Every function takes a borrowed connection and the calling
//! [`Principal`]. Staff-only operations check the role before looking
//! anything up; reads look the record up first, then check ownership.

pub mod appointments;
pub mod dashboard;
pub mod followups;
pub mod instructions;
pub mod patients;
pub mod portal;
pub mod reminders;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::authorization::AccessError;
use crate::db::{self, DatabaseError};
use crate::models::parse_timestamp;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl RecordError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Trimmed, non-empty text field.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn parse_when(field: &str, value: &str) -> Result<DateTime<Utc>, RecordError> {
    parse_timestamp(value)
        .ok_or_else(|| RecordError::InvalidInput(format!("Invalid {field}: {value}")))
}

/// The patient must exist; an optional appointment must exist and
/// belong to that patient.
pub(crate) fn check_references(
    conn: &Connection,
    patient_id: &str,
    appointment_id: Option<&str>,
) -> Result<(), RecordError> {
    if !db::patient_exists(conn, patient_id)? {
        return Err(RecordError::not_found("Patient", patient_id));
    }
    if let Some(appointment_id) = appointment_id {
        let appointment = db::get_appointment(conn, appointment_id)?
            .ok_or_else(|| RecordError::not_found("Appointment", appointment_id))?;
        if appointment.patient_id != patient_id {
            return Err(RecordError::InvalidInput(format!(
                "Appointment {appointment_id} does not belong to patient {patient_id}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use rusqlite::Connection;

    use crate::authorization::Principal;
    use crate::db::{self, repository::fixtures};
    use crate::models::{new_id, Patient, Role, User, USER_ID_PREFIX};

    pub fn staff(conn: &Connection) -> Principal {
        let email = format!("{}@clinic.example", new_id("staff"));
        Principal::from_user(&fixtures::staff_user(conn, &email))
    }

    /// Patient record plus a linked patient-role principal.
    pub fn patient_with_account(conn: &Connection, name: &str) -> (Patient, Principal) {
        let email = format!("{}@example.com", new_id("p"));
        let patient = fixtures::patient(conn, name, &email);
        let user = User {
            user_id: new_id(USER_ID_PREFIX),
            email,
            password_hash: None,
            name: name.into(),
            role: Role::Patient,
            phone: None,
            picture: None,
            patient_id: Some(patient.patient_id.clone()),
            created_at: chrono::Utc::now(),
        };
        db::insert_user(conn, &user).unwrap();
        (patient, Principal::from_user(&user))
    }
}
