use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::{optional_text, required_text, RecordError};
use crate::auth::{normalize_email, validate_email, AuthService};
use crate::authorization::{ensure_can_read, require_staff, Principal};
use crate::db::{self, DatabaseError};
use crate::models::{new_id, Patient, Role, User, PATIENT_ID_PREFIX, USER_ID_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// How the patient's login account was provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    Created,
    LinkedExisting,
    /// An account with this email exists and cannot be linked
    /// (staff, or already linked to another patient).
    Skipped,
}

/// Create a patient and its patient-role login account.
///
/// The account gets `temp_password` and is linked to the new patient in
/// the same transaction. An existing unlinked patient-role account with
/// the same email is linked instead; staff accounts are left untouched.
pub fn create_patient(
    conn: &Connection,
    principal: &Principal,
    auth: &AuthService,
    temp_password: &str,
    input: NewPatient,
) -> Result<(Patient, AccountOutcome), RecordError> {
    require_staff(principal)?;

    let email = normalize_email(&input.email);
    validate_email(&email).map_err(|e| RecordError::InvalidInput(e.to_string()))?;

    let patient = Patient {
        patient_id: new_id(PATIENT_ID_PREFIX),
        name: required_text("name", &input.name)?,
        email,
        phone: input.phone.trim().to_string(),
        birth_date: optional_text(input.birth_date),
        notes: optional_text(input.notes),
        created_at: Utc::now(),
        created_by: principal.user_id.clone(),
    };

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    db::insert_patient(&tx, &patient)?;
    let outcome = provision_account(&tx, auth, temp_password, &patient)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        patient_id = %patient.patient_id,
        created_by = %principal.user_id,
        account = ?outcome,
        "Patient created"
    );
    Ok((patient, outcome))
}

fn provision_account(
    conn: &Connection,
    auth: &AuthService,
    temp_password: &str,
    patient: &Patient,
) -> Result<AccountOutcome, RecordError> {
    if let Some(existing) = db::get_user_by_email(conn, &patient.email)? {
        return Ok(match (existing.role, existing.patient_id.as_deref()) {
            (Role::Patient, None) => {
                db::link_user_to_patient(conn, &existing.user_id, &patient.patient_id)?;
                AccountOutcome::LinkedExisting
            }
            _ => {
                tracing::warn!(
                    user_id = %existing.user_id,
                    patient_id = %patient.patient_id,
                    "Email already belongs to an account that cannot be linked"
                );
                AccountOutcome::Skipped
            }
        });
    }

    let user = User {
        user_id: new_id(USER_ID_PREFIX),
        email: patient.email.clone(),
        password_hash: Some(auth.hash(temp_password)),
        name: patient.name.clone(),
        role: Role::Patient,
        phone: Some(patient.phone.clone()).filter(|p| !p.is_empty()),
        picture: None,
        patient_id: Some(patient.patient_id.clone()),
        created_at: patient.created_at,
    };
    db::insert_user(conn, &user)?;
    Ok(AccountOutcome::Created)
}

/// All patients, newest first. Staff only.
pub fn list_patients(conn: &Connection, principal: &Principal) -> Result<Vec<Patient>, RecordError> {
    require_staff(principal)?;
    Ok(db::list_patients(conn)?)
}

/// One patient. A patient account may read only its own record.
pub fn get_patient(
    conn: &Connection,
    principal: &Principal,
    patient_id: &str,
) -> Result<Patient, RecordError> {
    let patient = db::get_patient(conn, patient_id)?
        .ok_or_else(|| RecordError::not_found("Patient", patient_id))?;
    ensure_can_read(conn, principal, &patient.patient_id)?;
    Ok(patient)
}
