//! Patient endpoints.
//!
//! - `POST /api/patients`: create (staff), also provisions the patient login
//! - `GET /api/patients`: list (staff)
//! - `GET /api/patients/:id`: detail

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::models::Patient;
use crate::records::patients::{self, NewPatient};

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<NewPatient>,
) -> Result<Json<Patient>, ApiError> {
    // Hashing the temporary password is slow.
    let patient = ctx
        .run_blocking(move |core, conn| {
            let (patient, _) = patients::create_patient(
                conn,
                &principal,
                &core.auth,
                &core.config.patient_temp_password,
                input,
            )?;
            Ok(patient)
        })
        .await?;
    Ok(Json(patient))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(patients::list_patients(&conn, &principal)?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(patients::get_patient(&conn, &principal, &patient_id)?))
}
