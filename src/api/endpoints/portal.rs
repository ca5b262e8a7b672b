//! `GET /api/patient/portal`: a patient's own records in one call.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::records::portal::{self, PortalView};

pub async fn view(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<PortalView>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(portal::patient_portal(&conn, &principal)?))
}
