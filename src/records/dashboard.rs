use rusqlite::Connection;
use serde::Serialize;

use super::appointments::with_patient_names;
use super::RecordError;
use crate::authorization::{require_staff, Principal};
use crate::db::{self, CollectionCounts};
use crate::models::AppointmentView;

const RECENT_APPOINTMENTS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    #[serde(flatten)]
    pub counts: CollectionCounts,
    pub recent_appointments: Vec<AppointmentView>,
}

/// Collection totals plus the latest appointments. Staff only.
pub fn dashboard_stats(
    conn: &Connection,
    principal: &Principal,
) -> Result<DashboardStats, RecordError> {
    require_staff(principal)?;
    let counts = db::collection_counts(conn)?;
    let recent = db::list_appointments(conn, None, RECENT_APPOINTMENTS)?;
    Ok(DashboardStats {
        counts,
        recent_appointments: with_patient_names(conn, recent)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::AccessError;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::records::followups::{complete_followup, create_followup, NewFollowup};
    use crate::records::testing;

    #[test]
    fn counts_match_scripted_creates() {
        let conn = open_memory_database().unwrap();
        let staff = testing::staff(&conn);
        let (ana, _) = testing::patient_with_account(&conn, "Ana");
        testing::patient_with_account(&conn, "Bia");
        testing::patient_with_account(&conn, "Caio");
        fixtures::appointment(&conn, &ana.patient_id);
        fixtures::appointment(&conn, &ana.patient_id);

        let followup = |reason: &str| NewFollowup {
            patient_id: ana.patient_id.clone(),
            appointment_id: None,
            follow_up_date: "2030-03-01".into(),
            reason: reason.into(),
            notes: None,
        };
        let done = create_followup(&conn, &staff, followup("Revisão")).unwrap();
        create_followup(&conn, &staff, followup("Retorno")).unwrap();
        complete_followup(&conn, &staff, &done.followup.followup_id).unwrap();

        let stats = dashboard_stats(&conn, &staff).unwrap();
        assert_eq!(
            stats.counts,
            CollectionCounts {
                total_patients: 3,
                total_appointments: 2,
                total_instructions: 0,
                pending_followups: 1,
                pending_reminders: 0,
            }
        );
        assert_eq!(stats.recent_appointments.len(), 2);
        assert_eq!(stats.recent_appointments[0].patient_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn recent_appointments_are_capped() {
        let conn = open_memory_database().unwrap();
        let staff = testing::staff(&conn);
        let (ana, _) = testing::patient_with_account(&conn, "Ana");
        for _ in 0..7 {
            fixtures::appointment(&conn, &ana.patient_id);
        }
        let stats = dashboard_stats(&conn, &staff).unwrap();
        assert_eq!(stats.counts.total_appointments, 7);
        assert_eq!(stats.recent_appointments.len(), 5);
    }

    #[test]
    fn staff_only() {
        let conn = open_memory_database().unwrap();
        let (_, ana_login) = testing::patient_with_account(&conn, "Ana");
        assert!(matches!(
            dashboard_stats(&conn, &ana_login),
            Err(RecordError::Access(AccessError::Forbidden(_)))
        ));
    }
}
