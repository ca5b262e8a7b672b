use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::prompt::{build_instruction_prompt, VisitSummary, CARE_INSTRUCTION_SYSTEM_PROMPT};
use super::sanitize::sanitize;
use super::speech::{encode_audio_data_uri, truncate_for_speech};
use super::types::{SpeechSynthesizer, TextGenerator};
use super::InstructionError;
use crate::authorization::{require_staff, Principal};
use crate::db;
use crate::models::{new_id, CareInstruction, INSTRUCTION_ID_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInstructionRequest {
    pub appointment_id: String,
    #[serde(default = "default_generate_audio")]
    pub generate_audio: bool,
}

fn default_generate_audio() -> bool {
    true
}

/// Text generator plus optional narrator for care instructions.
pub struct InstructionGenerator<'a> {
    generator: &'a dyn TextGenerator,
    /// `None` when no speech credential is configured.
    speech: Option<&'a dyn SpeechSynthesizer>,
}

impl<'a> InstructionGenerator<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        speech: Option<&'a dyn SpeechSynthesizer>,
    ) -> Self {
        Self { generator, speech }
    }

    /// Generate, sanitize, optionally narrate and store aftercare text for
    /// one appointment. Staff only. Audio failures never fail the call.
    pub fn generate(
        &self,
        conn: &Connection,
        principal: &Principal,
        request: &GenerateInstructionRequest,
    ) -> Result<CareInstruction, InstructionError> {
        require_staff(principal)?;

        let appointment = db::get_appointment(conn, &request.appointment_id)?.ok_or_else(|| {
            InstructionError::NotFound {
                entity: "Appointment",
                id: request.appointment_id.clone(),
            }
        })?;
        let patient = db::get_patient(conn, &appointment.patient_id)?.ok_or_else(|| {
            InstructionError::NotFound {
                entity: "Patient",
                id: appointment.patient_id.clone(),
            }
        })?;

        let prompt = build_instruction_prompt(&VisitSummary {
            patient_name: &patient.name,
            procedure: &appointment.procedure,
            diagnosis: &appointment.diagnosis,
            notes: appointment.notes.as_deref(),
        });

        let raw = self
            .generator
            .generate(CARE_INSTRUCTION_SYSTEM_PROMPT, &prompt)
            .map_err(|e| {
                tracing::error!(
                    appointment_id = %appointment.appointment_id,
                    error = %e,
                    "Care instruction generation failed"
                );
                e
            })?;
        let text_content = sanitize(&raw);

        let audio_url = if request.generate_audio {
            self.narrate(&appointment.appointment_id, &text_content)
        } else {
            None
        };

        let instruction = CareInstruction {
            instruction_id: new_id(INSTRUCTION_ID_PREFIX),
            appointment_id: appointment.appointment_id,
            patient_id: appointment.patient_id,
            text_content,
            audio_url,
            created_at: Utc::now(),
        };
        db::insert_instruction(conn, &instruction)?;

        tracing::info!(
            instruction_id = %instruction.instruction_id,
            appointment_id = %instruction.appointment_id,
            chars = instruction.text_content.chars().count(),
            has_audio = instruction.audio_url.is_some(),
            "Care instruction stored"
        );
        Ok(instruction)
    }

    fn narrate(&self, appointment_id: &str, text: &str) -> Option<String> {
        let speech = self.speech?;
        if text.is_empty() {
            return None;
        }
        match speech.synthesize(truncate_for_speech(text)) {
            Ok(chunks) if chunks.iter().any(|c| !c.is_empty()) => {
                Some(encode_audio_data_uri(&chunks))
            }
            Ok(_) => {
                tracing::warn!(appointment_id, "Speech service returned no audio, continuing without");
                None
            }
            Err(e) => {
                tracing::warn!(appointment_id, error = %e, "Audio generation failed, continuing without");
                None
            }
        }
    }
}
