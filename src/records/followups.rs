use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;

use super::{check_references, optional_text, parse_when, required_text, RecordError};
use crate::authorization::{ensure_can_read, list_scope, require_staff, ListScope, Principal};
use crate::db::{self, LIST_LIMIT};
use crate::models::{new_id, Followup, FollowupView, FOLLOWUP_ID_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct NewFollowup {
    pub patient_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    pub follow_up_date: String,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn view(conn: &Connection, followup: Followup) -> Result<FollowupView, RecordError> {
    let patient_name = db::get_patient_name(conn, &followup.patient_id)?;
    Ok(FollowupView {
        followup,
        patient_name,
    })
}

pub fn create_followup(
    conn: &Connection,
    principal: &Principal,
    input: NewFollowup,
) -> Result<FollowupView, RecordError> {
    require_staff(principal)?;
    let appointment_id = input.appointment_id.filter(|id| !id.trim().is_empty());
    check_references(conn, &input.patient_id, appointment_id.as_deref())?;

    let followup = Followup {
        followup_id: new_id(FOLLOWUP_ID_PREFIX),
        patient_id: input.patient_id,
        appointment_id,
        follow_up_date: parse_when("follow_up_date", &input.follow_up_date)?,
        reason: required_text("reason", &input.reason)?,
        notes: optional_text(input.notes),
        completed: false,
        created_at: Utc::now(),
        created_by: principal.user_id.clone(),
    };
    db::insert_followup(conn, &followup)?;
    tracing::info!(followup_id = %followup.followup_id, "Follow-up scheduled");
    view(conn, followup)
}

/// Follow-ups visible to the principal, earliest date first.
pub fn list_followups(
    conn: &Connection,
    principal: &Principal,
    patient_filter: Option<&str>,
) -> Result<Vec<FollowupView>, RecordError> {
    let scope = list_scope(conn, principal, patient_filter)?;
    if scope == ListScope::Nothing {
        return Ok(Vec::new());
    }
    db::list_followups(conn, scope.patient_filter(), LIST_LIMIT)?
        .into_iter()
        .map(|followup| view(conn, followup))
        .collect()
}

pub fn get_followup(
    conn: &Connection,
    principal: &Principal,
    followup_id: &str,
) -> Result<FollowupView, RecordError> {
    let followup = db::get_followup(conn, followup_id)?
        .ok_or_else(|| RecordError::not_found("Follow-up", followup_id))?;
    ensure_can_read(conn, principal, &followup.patient_id)?;
    view(conn, followup)
}

/// Mark a follow-up done. Staff only; completing twice is a no-op.
pub fn complete_followup(
    conn: &Connection,
    principal: &Principal,
    followup_id: &str,
) -> Result<FollowupView, RecordError> {
    require_staff(principal)?;
    if !db::mark_followup_completed(conn, followup_id)? {
        return Err(RecordError::not_found("Follow-up", followup_id));
    }
    tracing::info!(followup_id, completed_by = %principal.user_id, "Follow-up completed");
    let followup = db::get_followup(conn, followup_id)?
        .ok_or_else(|| RecordError::not_found("Follow-up", followup_id))?;
    view(conn, followup)
}
