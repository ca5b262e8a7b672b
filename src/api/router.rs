//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS → 2. Auth validator (protected routes) → 3. Audit logger

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // Layers run bottom (outermost) to top (innermost):
    //   Extension → Auth → Audit → Handler
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route(
            "/patients",
            post(endpoints::patients::create).get(endpoints::patients::list),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route(
            "/appointments",
            post(endpoints::appointments::create).get(endpoints::appointments::list),
        )
        .route("/appointments/:id", get(endpoints::appointments::detail))
        .route(
            "/instructions/generate",
            post(endpoints::instructions::generate),
        )
        .route("/instructions", get(endpoints::instructions::list))
        .route(
            "/instructions/:id",
            get(endpoints::instructions::detail).delete(endpoints::instructions::delete),
        )
        .route(
            "/reminders",
            post(endpoints::reminders::create).get(endpoints::reminders::list),
        )
        .route("/reminders/:id", get(endpoints::reminders::detail))
        .route(
            "/followups",
            post(endpoints::followups::create).get(endpoints::followups::list),
        )
        .route("/followups/:id", get(endpoints::followups::detail))
        .route(
            "/followups/:id/complete",
            patch(endpoints::followups::complete),
        )
        .route("/dashboard/stats", get(endpoints::dashboard::stats))
        .route("/patient/portal", get(endpoints::portal::view))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/", get(endpoints::health::root))
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/session", get(endpoints::auth::session))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    // Nesting maps "/" to "/api" only; the trailing-slash form is routed here.
    Router::new()
        .route("/api/", get(endpoints::health::root))
        .nest("/api", protected)
        .nest("/api", public)
        .layer(CorsLayer::permissive())
}
