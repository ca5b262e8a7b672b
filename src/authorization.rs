//! Record access policy.
//!
//! Two roles, checked in order:
//! 1. Staff → every record
//! 2. Patient → only records whose `patient_id` is the one linked to the account
//! 3. Default → DENY
//!
//! A patient account without a link is resolved lazily by matching its
//! email against patient records; a match is persisted as the link.

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::models::{Role, User};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, attached to each request by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub patient_id: Option<String>,
}

impl Principal {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            role: user.role,
            patient_id: user.patient_id.clone(),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}

/// Why access was granted (or denied). Logged with every record read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    StaffRole,
    OwnRecord,
    Denied,
}

impl AccessReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaffRole => "staff_role",
            Self::OwnRecord => "own_record",
            Self::Denied => "denied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Denied,
        }
    }
}

/// Which patient a list query is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Staff without a filter.
    All,
    Patient(String),
    /// Patient account with no resolvable patient record.
    Nothing,
}

impl ListScope {
    pub fn patient_filter(&self) -> Option<&str> {
        match self {
            Self::Patient(id) => Some(id),
            Self::All | Self::Nothing => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Checks
// ═══════════════════════════════════════════════════════════

pub fn require_staff(principal: &Principal) -> Result<(), AccessError> {
    match principal.role {
        Role::Staff => Ok(()),
        Role::Patient => Err(AccessError::Forbidden("Staff access required")),
    }
}

pub fn require_patient(principal: &Principal) -> Result<(), AccessError> {
    match principal.role {
        Role::Patient => Ok(()),
        Role::Staff => Err(AccessError::Forbidden("Patient access only")),
    }
}

/// The patient record a patient-role principal owns, if any.
///
/// Uses the stored link when present. Otherwise looks for a patient with
/// the account's email and persists the link on a match. Always `None`
/// for staff.
pub fn resolve_patient_id(
    conn: &Connection,
    principal: &Principal,
) -> Result<Option<String>, DatabaseError> {
    if principal.role != Role::Patient {
        return Ok(None);
    }
    if let Some(id) = &principal.patient_id {
        return Ok(Some(id.clone()));
    }

    let Some(patient) = db::get_patient_by_email(conn, &principal.email)? else {
        return Ok(None);
    };
    db::link_user_to_patient(conn, &principal.user_id, &patient.patient_id)?;
    tracing::info!(
        user_id = %principal.user_id,
        patient_id = %patient.patient_id,
        "Linked patient account by email"
    );
    Ok(Some(patient.patient_id))
}

/// Decide whether `principal` may read a record owned by `record_patient_id`.
pub fn check_record_access(
    conn: &Connection,
    principal: &Principal,
    record_patient_id: &str,
) -> Result<AccessDecision, DatabaseError> {
    match principal.role {
        Role::Staff => Ok(AccessDecision::allow(AccessReason::StaffRole)),
        Role::Patient => match resolve_patient_id(conn, principal)? {
            Some(own) if own == record_patient_id => {
                Ok(AccessDecision::allow(AccessReason::OwnRecord))
            }
            _ => Ok(AccessDecision::deny()),
        },
    }
}

/// `check_record_access` as a guard.
pub fn ensure_can_read(
    conn: &Connection,
    principal: &Principal,
    record_patient_id: &str,
) -> Result<(), AccessError> {
    let decision = check_record_access(conn, principal, record_patient_id)?;
    if decision.allowed {
        tracing::debug!(
            user_id = %principal.user_id,
            record_patient_id,
            reason = decision.reason.as_str(),
            "Record read allowed"
        );
        Ok(())
    } else {
        tracing::warn!(
            user_id = %principal.user_id,
            record_patient_id,
            reason = decision.reason.as_str(),
            "Denied cross-patient read"
        );
        Err(AccessError::Forbidden("Access denied"))
    }
}

/// Scope a list query: staff may filter by any patient, patients always
/// see only their own records and the requested filter is ignored.
pub fn list_scope(
    conn: &Connection,
    principal: &Principal,
    requested_patient_id: Option<&str>,
) -> Result<ListScope, DatabaseError> {
    match principal.role {
        Role::Staff => Ok(match requested_patient_id.filter(|id| !id.is_empty()) {
            Some(id) => ListScope::Patient(id.to_string()),
            None => ListScope::All,
        }),
        Role::Patient => Ok(match resolve_patient_id(conn, principal)? {
            Some(id) => ListScope::Patient(id),
            None => ListScope::Nothing,
        }),
    }
}
