use rusqlite::Connection;
use serde::Serialize;

use crate::db::DatabaseError;

/// Collection counts shown on the staff dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub total_patients: u64,
    pub total_appointments: u64,
    pub total_instructions: u64,
    pub pending_followups: u64,
    pub pending_reminders: u64,
}

fn count(conn: &Connection, sql: &str) -> Result<u64, DatabaseError> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n.max(0) as u64)
}

pub fn collection_counts(conn: &Connection) -> Result<CollectionCounts, DatabaseError> {
    Ok(CollectionCounts {
        total_patients: count(conn, "SELECT COUNT(*) FROM patients")?,
        total_appointments: count(conn, "SELECT COUNT(*) FROM appointments")?,
        total_instructions: count(conn, "SELECT COUNT(*) FROM care_instructions")?,
        pending_followups: count(conn, "SELECT COUNT(*) FROM followups WHERE completed = 0")?,
        pending_reminders: count(conn, "SELECT COUNT(*) FROM reminders WHERE sent = 0")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn empty_database_counts_zero() {
        let conn = open_memory_database().unwrap();
        assert_eq!(collection_counts(&conn).unwrap(), CollectionCounts::default());
    }
}
