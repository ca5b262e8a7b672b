use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Account record. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    /// `None` for accounts created through an external session.
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub picture: Option<String>,
    /// Linked patient record for patient-role accounts.
    pub patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
