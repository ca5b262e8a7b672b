//! Care instruction endpoints.
//!
//! - `POST /api/instructions/generate`: generate from an appointment (staff)
//! - `GET /api/instructions?patient_id=`: list, role-filtered
//! - `GET /api/instructions/:id`: detail
//! - `DELETE /api/instructions/:id`: delete (staff)

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Serialize;

use super::PatientFilter;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::Principal;
use crate::models::CareInstruction;
use crate::pipeline::GenerateInstructionRequest;
use crate::records::instructions;

/// Text generation and narration are slow outbound calls, so the whole
/// pipeline runs on the blocking pool.
pub async fn generate(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<GenerateInstructionRequest>,
) -> Result<Json<CareInstruction>, ApiError> {
    let instruction = ctx
        .run_blocking(move |core, conn| {
            Ok(core
                .instruction_generator()
                .generate(conn, &principal, &request)?)
        })
        .await?;
    Ok(Json(instruction))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<PatientFilter>,
) -> Result<Json<Vec<CareInstruction>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(instructions::list_instructions(
        &conn,
        &principal,
        filter.patient_id.as_deref(),
    )?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(instruction_id): Path<String>,
) -> Result<Json<CareInstruction>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(instructions::get_instruction(
        &conn,
        &principal,
        &instruction_id,
    )?))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub deleted: bool,
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(instruction_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    instructions::delete_instruction(&conn, &principal, &instruction_id)?;
    Ok(Json(DeleteResponse {
        message: "Orientação excluída com sucesso",
        deleted: true,
    }))
}
