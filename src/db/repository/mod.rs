//! Repository layer: collection-scoped database operations.
//!
//! One sub-module per collection. All public functions are re-exported
//! here. Rows are read as raw column tuples and converted into typed
//! records, so bad enum values or timestamps surface as `DatabaseError`.

mod appointment;
mod followup;
mod instruction;
mod patient;
mod reminder;
mod stats;
mod user;

use chrono::{DateTime, SecondsFormat, Utc};

use super::DatabaseError;

pub use appointment::*;
pub use followup::*;
pub use instruction::*;
pub use patient::*;
pub use reminder::*;
pub use stats::*;
pub use user::*;

/// Upper bound for list queries.
pub const LIST_LIMIT: u32 = 1000;

/// Storage format for timestamps: RFC 3339, UTC, fixed precision so
/// lexicographic order equals chronological order.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(field: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidTimestamp {
            field: field.into(),
            value: value.into(),
        })
}

pub(crate) fn parse_opt_ts(
    field: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value.map(|v| parse_ts(field, &v)).transpose()
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_format_round_trips() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap();
        let stored = format_ts(&ts);
        assert_eq!(stored, "2024-05-01T13:45:00.000000Z");
        assert_eq!(parse_ts("created_at", &stored).unwrap(), ts);
    }

    #[test]
    fn bad_timestamp_is_reported_with_column() {
        let err = parse_ts("scheduled_for", "yesterday").unwrap_err();
        match err {
            DatabaseError::InvalidTimestamp { field, value } => {
                assert_eq!(field, "scheduled_for");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_timestamp_passes_none_through() {
        assert!(parse_opt_ts("sent_at", None).unwrap().is_none());
    }
}
