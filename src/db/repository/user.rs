use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str =
    "user_id, email, password_hash, name, role, phone, picture, patient_id, created_at";

type UserRow = (
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
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

fn user_from_row(raw: UserRow) -> Result<User, DatabaseError> {
    let (user_id, email, password_hash, name, role, phone, picture, patient_id, created_at) = raw;
    Ok(User {
        user_id,
        email,
        password_hash,
        name,
        role: Role::from_str(&role)?,
        phone,
        picture,
        patient_id,
        created_at: parse_ts("created_at", &created_at)?,
    })
}

/// Insert a user. A taken email fails with `DatabaseError::Duplicate`.
pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (user_id, email, password_hash, name, role, phone, picture,
         patient_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.user_id,
            user.email,
            user.password_hash,
            user.name,
            user.role.as_str(),
            user.phone,
            user.picture,
            user.patient_id,
            format_ts(&user.created_at),
        ],
    )
    .map_err(|e| DatabaseError::from_write(e, &format!("email {}", user.email)))?;
    Ok(())
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            params![user_id],
            user_row,
        )
        .optional()?;
    raw.map(user_from_row).transpose()
}

/// Case-insensitive lookup.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 COLLATE NOCASE"),
            params![email],
            user_row,
        )
        .optional()?;
    raw.map(user_from_row).transpose()
}

/// Refresh display fields from an external identity provider.
pub fn update_user_profile(
    conn: &Connection,
    user_id: &str,
    name: &str,
    picture: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET name = ?1, picture = ?2 WHERE user_id = ?3",
        params![name, picture, user_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}

/// Record which patient a patient-role account belongs to.
pub fn link_user_to_patient(
    conn: &Connection,
    user_id: &str,
    patient_id: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET patient_id = ?1 WHERE user_id = ?2",
        params![patient_id, user_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}
