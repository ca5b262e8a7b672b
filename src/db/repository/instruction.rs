use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const INSTRUCTION_COLUMNS: &str =
    "instruction_id, appointment_id, patient_id, text_content, audio_url, created_at";

type InstructionRow = (String, String, String, String, Option<String>, String);

fn instruction_row(row: &Row<'_>) -> rusqlite::Result<InstructionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn instruction_from_row(raw: InstructionRow) -> Result<CareInstruction, DatabaseError> {
    let (instruction_id, appointment_id, patient_id, text_content, audio_url, created_at) = raw;
    Ok(CareInstruction {
        instruction_id,
        appointment_id,
        patient_id,
        text_content,
        audio_url,
        created_at: parse_ts("created_at", &created_at)?,
    })
}

pub fn insert_instruction(
    conn: &Connection,
    instruction: &CareInstruction,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO care_instructions (instruction_id, appointment_id, patient_id,
         text_content, audio_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            instruction.instruction_id,
            instruction.appointment_id,
            instruction.patient_id,
            instruction.text_content,
            instruction.audio_url,
            format_ts(&instruction.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_instruction(
    conn: &Connection,
    instruction_id: &str,
) -> Result<Option<CareInstruction>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {INSTRUCTION_COLUMNS} FROM care_instructions WHERE instruction_id = ?1"
            ),
            params![instruction_id],
            instruction_row,
        )
        .optional()?;
    raw.map(instruction_from_row).transpose()
}

pub fn list_instructions(
    conn: &Connection,
    patient_id: Option<&str>,
    limit: u32,
) -> Result<Vec<CareInstruction>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INSTRUCTION_COLUMNS} FROM care_instructions
         WHERE (?1 IS NULL OR patient_id = ?1)
         ORDER BY created_at DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id, limit], instruction_row)?;

    let mut instructions = Vec::new();
    for row in rows {
        instructions.push(instruction_from_row(row?)?);
    }
    Ok(instructions)
}

/// Delete an instruction. Returns `false` when nothing matched.
pub fn delete_instruction(conn: &Connection, instruction_id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM care_instructions WHERE instruction_id = ?1",
        params![instruction_id],
    )?;
    Ok(deleted > 0)
}
