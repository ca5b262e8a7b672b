//! HTTP API.
//!
//! Exposes the clinic records, instruction pipeline and patient portal
//! as JSON endpoints under `/api/`. Protected routes pass through
//! Auth → Audit → Handler.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
