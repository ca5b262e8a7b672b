use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const FOLLOWUP_COLUMNS: &str = "followup_id, patient_id, appointment_id, follow_up_date, reason,
     notes, completed, created_at, created_by";

type FollowupRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    bool,
    String,
    String,
);

fn followup_row(row: &Row<'_>) -> rusqlite::Result<FollowupRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn followup_from_row(raw: FollowupRow) -> Result<Followup, DatabaseError> {
    let (
        followup_id,
        patient_id,
        appointment_id,
        follow_up_date,
        reason,
        notes,
        completed,
        created_at,
        created_by,
    ) = raw;
    Ok(Followup {
        followup_id,
        patient_id,
        appointment_id,
        follow_up_date: parse_ts("follow_up_date", &follow_up_date)?,
        reason,
        notes,
        completed,
        created_at: parse_ts("created_at", &created_at)?,
        created_by,
    })
}

pub fn insert_followup(conn: &Connection, followup: &Followup) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO followups (followup_id, patient_id, appointment_id, follow_up_date, reason,
         notes, completed, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            followup.followup_id,
            followup.patient_id,
            followup.appointment_id,
            format_ts(&followup.follow_up_date),
            followup.reason,
            followup.notes,
            followup.completed,
            format_ts(&followup.created_at),
            followup.created_by,
        ],
    )?;
    Ok(())
}

pub fn get_followup(conn: &Connection, followup_id: &str) -> Result<Option<Followup>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {FOLLOWUP_COLUMNS} FROM followups WHERE followup_id = ?1"),
            params![followup_id],
            followup_row,
        )
        .optional()?;
    raw.map(followup_from_row).transpose()
}

/// Follow-ups ordered by check-in date, optionally for one patient.
pub fn list_followups(
    conn: &Connection,
    patient_id: Option<&str>,
    limit: u32,
) -> Result<Vec<Followup>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FOLLOWUP_COLUMNS} FROM followups
         WHERE (?1 IS NULL OR patient_id = ?1)
         ORDER BY follow_up_date ASC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id, limit], followup_row)?;

    let mut followups = Vec::new();
    for row in rows {
        followups.push(followup_from_row(row?)?);
    }
    Ok(followups)
}

/// Set `completed = 1`. Idempotent; returns `false` when the id is unknown.
pub fn mark_followup_completed(conn: &Connection, followup_id: &str) -> Result<bool, DatabaseError> {
    let matched = conn.execute(
        "UPDATE followups SET completed = 1 WHERE followup_id = ?1",
        params![followup_id],
    )?;
    Ok(matched > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    fn make_followup(conn: &Connection, patient_id: &str) -> Followup {
        let now = Utc::now();
        let followup = Followup {
            followup_id: new_id(FOLLOWUP_ID_PREFIX),
            patient_id: patient_id.into(),
            appointment_id: None,
            follow_up_date: now + Duration::days(7),
            reason: "Retirada de pontos".into(),
            notes: None,
            completed: false,
            created_at: now,
            created_by: "user_staff".into(),
        };
        insert_followup(conn, &followup).unwrap();
        followup
    }

    #[test]
    fn complete_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let patient = fixtures::patient(&conn, "Ana", "ana@mail.com");
        let followup = make_followup(&conn, &patient.patient_id);

        assert!(mark_followup_completed(&conn, &followup.followup_id).unwrap());
        assert!(mark_followup_completed(&conn, &followup.followup_id).unwrap());
        let loaded = get_followup(&conn, &followup.followup_id).unwrap().unwrap();
        assert!(loaded.completed);
    }

    #[test]
    fn complete_unknown_id_matches_nothing() {
        let conn = open_memory_database().unwrap();
        assert!(!mark_followup_completed(&conn, "fup_missing").unwrap());
    }

    #[test]
    fn list_filters_by_patient() {
        let conn = open_memory_database().unwrap();
        let a = fixtures::patient(&conn, "A", "a@mail.com");
        let b = fixtures::patient(&conn, "B", "b@mail.com");
        make_followup(&conn, &a.patient_id);
        make_followup(&conn, &b.patient_id);
        make_followup(&conn, &b.patient_id);

        assert_eq!(list_followups(&conn, Some(&b.patient_id), 1000).unwrap().len(), 2);
        assert_eq!(list_followups(&conn, None, 1000).unwrap().len(), 3);
    }
}
