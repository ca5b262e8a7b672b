use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followup {
    pub followup_id: String,
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub follow_up_date: DateTime<Utc>,
    pub reason: String,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowupView {
    #[serde(flatten)]
    pub followup: Followup,
    pub patient_name: Option<String>,
}
