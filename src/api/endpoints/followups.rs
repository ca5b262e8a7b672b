//! Follow-up endpoints.
//!
//! - `POST /api/followups`: schedule (staff)
//! - `GET /api/followups?patient_id=`: list, role-filtered
//! - `GET /api/followups/:id`: detail
//! - `PATCH /api/followups/:id/complete`: mark done (staff)

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::PatientFilter;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::models::FollowupView;
use crate::records::followups::{self, NewFollowup};

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<NewFollowup>,
) -> Result<Json<FollowupView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(followups::create_followup(&conn, &principal, input)?))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<Vec<FollowupView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(followups::list_followups(
        &conn,
        &principal,
        filter.patient_id.as_deref(),
    )?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(followup_id): Path<String>,
) -> Result<Json<FollowupView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(followups::get_followup(&conn, &principal, &followup_id)?))
}

pub async fn complete(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(followup_id): Path<String>,
) -> Result<Json<FollowupView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(followups::complete_followup(
        &conn,
        &principal,
        &followup_id,
    )?))
}
