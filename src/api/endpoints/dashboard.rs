//! `GET /api/dashboard/stats`: staff overview.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::records::dashboard::{self, DashboardStats};

pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<DashboardStats>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(dashboard::dashboard_stats(&conn, &principal)?))
}
