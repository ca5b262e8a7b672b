pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Token signing key rejected")]
    InvalidKey,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}
