use rusqlite::Connection;
use serde::Serialize;

use super::appointments::with_patient_names;
use super::RecordError;
use crate::authorization::{require_patient, resolve_patient_id, Principal};
use crate::db;
use crate::models::{AppointmentView, CareInstruction, Followup, Patient, Reminder};

/// Per-list cap for the portal view.
pub const PORTAL_LIST_LIMIT: u32 = 100;

/// Everything a patient can see about themselves, in one response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortalView {
    pub patient: Option<Patient>,
    pub appointments: Vec<AppointmentView>,
    pub instructions: Vec<CareInstruction>,
    pub reminders: Vec<Reminder>,
    pub followups: Vec<Followup>,
}

/// Patient only. Without a resolvable patient record the view is empty.
pub fn patient_portal(conn: &Connection, principal: &Principal) -> Result<PortalView, RecordError> {
    require_patient(principal)?;
    let Some(patient_id) = resolve_patient_id(conn, principal)? else {
        return Ok(PortalView::default());
    };
    let Some(patient) = db::get_patient(conn, &patient_id)? else {
        tracing::warn!(user_id = %principal.user_id, patient_id = %patient_id, "Linked patient record missing");
        return Ok(PortalView::default());
    };

    let filter = Some(patient_id.as_str());
    let appointments = db::list_appointments(conn, filter, PORTAL_LIST_LIMIT)?;
    Ok(PortalView {
        appointments: with_patient_names(conn, appointments)?,
        instructions: db::list_instructions(conn, filter, PORTAL_LIST_LIMIT)?,
        reminders: db::list_reminders(conn, filter, PORTAL_LIST_LIMIT)?,
        followups: db::list_followups(conn, filter, PORTAL_LIST_LIMIT)?,
        patient: Some(patient),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::AccessError;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::records::testing;

    #[test]
    fn portal_shows_only_own_records() {
        let conn = open_memory_database().unwrap();
        let (ana, ana_login) = testing::patient_with_account(&conn, "Ana");
        let (bia, _) = testing::patient_with_account(&conn, "Bia");
        fixtures::appointment(&conn, &ana.patient_id);
        fixtures::appointment(&conn, &bia.patient_id);
        fixtures::appointment(&conn, &bia.patient_id);

        let view = patient_portal(&conn, &ana_login).unwrap();
        assert_eq!(view.patient.unwrap().patient_id, ana.patient_id);
        assert_eq!(view.appointments.len(), 1);
        assert!(view.instructions.is_empty());
    }

    #[test]
    fn unlinked_patient_without_record_gets_empty_view() {
        let conn = open_memory_database().unwrap();
        let principal = Principal {
            user_id: "user_x".into(),
            email: "nobody@example.com".into(),
            role: crate::models::Role::Patient,
            patient_id: None,
        };
        let view = patient_portal(&conn, &principal).unwrap();
        assert!(view.patient.is_none());
        assert!(view.appointments.is_empty());
        assert!(view.followups.is_empty());
    }

    #[test]
    fn staff_is_refused() {
        let conn = open_memory_database().unwrap();
        let staff = testing::staff(&conn);
        assert!(matches!(
            patient_portal(&conn, &staff),
            Err(RecordError::Access(AccessError::Forbidden(_)))
        ));
    }
}
