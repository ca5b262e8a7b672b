//! Appointment endpoints.
//!
//! - `POST /api/appointments`: create (staff)
//! - `GET /api/appointments?patient_id=`: list, role-filtered
//! - `GET /api/appointments/:id`: detail

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use super::PatientFilter;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::models::AppointmentView;
use crate::records::appointments::{self, NewAppointment};

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<NewAppointment>,
) -> Result<Json<AppointmentView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointments::create_appointment(&conn, &principal, input)?))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointments::list_appointments(
        &conn,
        &principal,
        filter.patient_id.as_deref(),
    )?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(appointment_id): Path<String>,
) -> Result<Json<AppointmentView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointments::get_appointment(
        &conn,
        &principal,
        &appointment_id,
    )?))
}
