use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub procedure: String,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Appointment with the patient's display name joined in.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: Option<String>,
}
