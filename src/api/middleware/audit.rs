//! Audit logging middleware.
//!
//! Logs every API request with user id, method, path and response
//! status. Runs inside auth on protected routes, so the principal is
//! known there; public routes log `anonymous`.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::authorization::Principal;

/// Log API access for the audit trail. Never logs bodies.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_id = req
        .extensions()
        .get::<Principal>()
        .map(|p| p.user_id.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, path = %path, user_id = %user_id, status, elapsed_ms, "API request failed");
    } else {
        tracing::info!(%method, path = %path, user_id = %user_id, status, elapsed_ms, "API request");
    }

    response
}
