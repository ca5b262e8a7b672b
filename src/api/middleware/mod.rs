//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token → `Principal` (protected routes only)
//! 2. Audit logger: method, path, user, status

pub mod audit;
pub mod auth;
