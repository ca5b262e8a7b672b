use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ReminderChannel;

/// Scheduled patient notification. `sent`/`sent_at` belong to an
/// external dispatcher; this service only ever writes them as unsent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub reminder_id: String,
    pub patient_id: String,
    pub appointment_id: Option<String>,
    pub message: String,
    pub reminder_type: ReminderChannel,
    pub scheduled_for: DateTime<Utc>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderView {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub patient_name: Option<String>,
}
