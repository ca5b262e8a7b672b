use rusqlite::Connection;

use super::RecordError;
use crate::authorization::{ensure_can_read, list_scope, require_staff, ListScope, Principal};
use crate::db::{self, LIST_LIMIT};
use crate::models::{CareInstruction, INSTRUCTION_ID_PREFIX};

/// Instructions visible to the principal, newest first.
pub fn list_instructions(
    conn: &Connection,
    principal: &Principal,
    patient_filter: Option<&str>,
) -> Result<Vec<CareInstruction>, RecordError> {
    let scope = list_scope(conn, principal, patient_filter)?;
    if scope == ListScope::Nothing {
        return Ok(Vec::new());
    }
    Ok(db::list_instructions(conn, scope.patient_filter(), LIST_LIMIT)?)
}

pub fn get_instruction(
    conn: &Connection,
    principal: &Principal,
    instruction_id: &str,
) -> Result<CareInstruction, RecordError> {
    let instruction = db::get_instruction(conn, instruction_id)?
        .ok_or_else(|| RecordError::not_found("Instruction", instruction_id))?;
    ensure_can_read(conn, principal, &instruction.patient_id)?;
    Ok(instruction)
}

/// Delete an instruction. Staff only; ids must carry the `ins_` prefix.
pub fn delete_instruction(
    conn: &Connection,
    principal: &Principal,
    instruction_id: &str,
) -> Result<(), RecordError> {
    require_staff(principal)?;
    if !instruction_id.starts_with(INSTRUCTION_ID_PREFIX) {
        return Err(RecordError::InvalidInput(format!(
            "Invalid instruction id: {instruction_id}"
        )));
    }
    if !db::delete_instruction(conn, instruction_id)? {
        return Err(RecordError::not_found("Instruction", instruction_id));
    }
    tracing::info!(instruction_id, deleted_by = %principal.user_id, "Instruction deleted");
    Ok(())
}
