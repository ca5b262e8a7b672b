//! API endpoint handlers.
//!
//! One module per resource. Handlers stay thin: open a connection,
//! call into `auth`, `records` or `pipeline`, map the error.

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod followups;
pub mod health;
pub mod instructions;
pub mod patients;
pub mod portal;
pub mod reminders;

use serde::Deserialize;

/// `?patient_id=` filter accepted by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PatientFilter {
    pub patient_id: Option<String>,
}
