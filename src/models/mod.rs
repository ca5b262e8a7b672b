//! Typed records for every collection, plus id and timestamp helpers
//! shared by the repository layer.

pub mod enums;
pub mod user;
pub mod patient;
pub mod appointment;
pub mod instruction;
pub mod reminder;
pub mod followup;

pub use enums::*;
pub use user::*;
pub use patient::*;
pub use appointment::*;
pub use instruction::*;
pub use reminder::*;
pub use followup::*;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Id prefixes, one per collection.
pub const USER_ID_PREFIX: &str = "user_";
pub const PATIENT_ID_PREFIX: &str = "pat_";
pub const APPOINTMENT_ID_PREFIX: &str = "apt_";
pub const INSTRUCTION_ID_PREFIX: &str = "ins_";
pub const REMINDER_ID_PREFIX: &str = "rem_";
pub const FOLLOWUP_ID_PREFIX: &str = "fup_";

/// Generate a prefixed id: prefix + first 12 hex chars of a random UUID.
pub fn new_id(prefix: &str) -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &hex[..12])
}

/// Parse a client-supplied timestamp into UTC.
///
/// Accepts RFC 3339 (any offset, `Z` included), a naive
/// `YYYY-MM-DDTHH:MM[:SS]` taken as UTC, or a bare `YYYY-MM-DD`
/// taken as midnight UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn new_id_has_prefix_and_twelve_hex_chars() {
        let id = new_id(PATIENT_ID_PREFIX);
        assert!(id.starts_with("pat_"));
        let suffix = &id["pat_".len()..];
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(new_id(USER_ID_PREFIX), new_id(USER_ID_PREFIX));
    }

    #[test]
    fn parse_rfc3339_with_offset_converts_to_utc() {
        let dt = parse_timestamp("2024-03-10T09:00:00-03:00").unwrap();
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.day(), 10);
    }

    #[test]
    fn parse_z_suffix() {
        let dt = parse_timestamp("2024-03-10T09:00:00Z").unwrap();
        assert_eq!(dt.hour(), 9);
    }

    #[test]
    fn parse_naive_datetime_local_input() {
        let dt = parse_timestamp("2024-03-10T14:30").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (14, 30));
    }

    #[test]
    fn parse_date_only_is_midnight_utc() {
        let dt = parse_timestamp("2024-03-10").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2024, 3, 10, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
