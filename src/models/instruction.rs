use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// AI-generated aftercare text, optionally narrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareInstruction {
    pub instruction_id: String,
    pub appointment_id: String,
    pub patient_id: String,
    pub text_content: String,
    /// Self-contained `data:audio/mpeg;base64,...` URI.
    pub audio_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
