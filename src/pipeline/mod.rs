//! Care-instruction pipeline: prompt → text generation → sanitize →
//! optional speech synthesis → persistence.

pub mod types;
pub mod prompt;
pub mod sanitize;
pub mod llm;
pub mod speech;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use sanitize::*;
pub use llm::*;
pub use speech::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::authorization::AccessError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Text generation service unreachable at {0}")]
    Connection(String),

    #[error("Text generation service returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("Text generation returned no content")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech service request failed: {0}")]
    HttpClient(String),

    #[error("Speech service returned status {0}")]
    Upstream(u16),

    #[error("Speech service returned no audio")]
    EmptyAudio,

    #[error("I/O error while reading audio: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum InstructionError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
