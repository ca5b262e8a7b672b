//! Reminder endpoints.
//!
//! - `POST /api/reminders`: schedule (staff)
//! - `GET /api/reminders?patient_id=`: list, role-filtered
//! - `GET /api/reminders/:id`: detail

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::PatientFilter;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::models::ReminderView;
use crate::records::reminders::{self, NewReminder};

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<NewReminder>,
) -> Result<Json<ReminderView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(reminders::create_reminder(&conn, &principal, input)?))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<Vec<ReminderView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(reminders::list_reminders(
        &conn,
        &principal,
        filter.patient_id.as_deref(),
    )?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(reminder_id): Path<String>,
) -> Result<Json<ReminderView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(reminders::get_reminder(&conn, &principal, &reminder_id)?))
}
