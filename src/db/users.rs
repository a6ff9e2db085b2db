use rusqlite::{params, Connection, OptionalExtension};

use super::models::User;
use super::{conflict_on_unique, StoreResult};

const USER_COLUMNS: &str = "id, email, password_hash, name, created_at";

pub fn find_by_id(conn: &Connection, id: i64) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_email(conn: &Connection, email: &str) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            params![email],
            User::from_row,
        )
        .optional()?;
    Ok(user)
}

/// Insert a user. A taken email surfaces as `StoreError::Conflict("email")`.
pub fn insert(conn: &Connection, email: &str, password_hash: &str, name: &str) -> StoreResult<User> {
    conn.execute(
        "INSERT INTO users (email, password_hash, name) VALUES (?1, ?2, ?3)",
        params![email, password_hash, name],
    )
    .map_err(|e| conflict_on_unique(e, "email"))?;

    let id = conn.last_insert_rowid();
    let user = conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        User::from_row,
    )?;
    Ok(user)
}
