//! Storage operations for users and e-mail addresses.

use crate::error::{Result, WarehouseError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use tracing::debug;

use super::models::{Email, NewUser, User};

const USER_COLUMNS: &str =
    "id, username, password, last_login, date_joined, is_active, is_staff, is_superuser";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        last_login: row.get(3)?,
        date_joined: row.get(4)?,
        is_active: row.get(5)?,
        is_staff: row.get(6)?,
        is_superuser: row.get(7)?,
    })
}

pub fn create_user(conn: &Connection, user: &NewUser) -> Result<User> {
    if user.username.trim().is_empty() {
        return Err(WarehouseError::validation("username", "This field is required."));
    }
    conn.execute(
        "INSERT INTO accounts_user (username, password, last_login, date_joined)
         VALUES (?1, ?2, ?3, ?4)",
        params![user.username, user.password, user.last_login, user.date_joined],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Created user {} ({})", user.username, id);
    Ok(User {
        id,
        username: user.username.clone(),
        password: user.password.clone(),
        last_login: user.last_login,
        date_joined: user.date_joined,
        is_active: true,
        is_staff: false,
        is_superuser: false,
    })
}

/// Case-insensitive username lookup.
pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM accounts_user WHERE username = ?1", USER_COLUMNS),
            params![username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Map of exact username to user id.
pub fn user_ids_by_username(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT id, username FROM accounts_user")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(1)?, row.get(0)?)))?;

    let mut ids = HashMap::new();
    for row in rows {
        let (username, id) = row?;
        ids.insert(username, id);
    }
    Ok(ids)
}

/// Write back a user's username, password and flags.
pub fn update_user(conn: &Connection, user: &User) -> Result<()> {
    let rows = conn.execute(
        "UPDATE accounts_user
         SET username = ?2, password = ?3, is_active = ?4, is_staff = ?5, is_superuser = ?6
         WHERE id = ?1",
        params![
            user.id,
            user.username,
            user.password,
            user.is_active,
            user.is_staff,
            user.is_superuser,
        ],
    )?;
    if rows == 0 {
        return Err(WarehouseError::NotFound {
            entity: "user",
            key: user.id.to_string(),
        });
    }
    debug!("Updated user {} ({})", user.username, user.id);
    Ok(())
}

/// Mark a user as staff and superuser. Returns false when no such user.
pub fn grant_admin(conn: &Connection, username: &str) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE accounts_user SET is_staff = 1, is_superuser = 1 WHERE username = ?1",
        params![username],
    )?;
    if rows > 0 {
        debug!("Granted admin to {}", username);
    }
    Ok(rows > 0)
}

pub fn add_email(
    conn: &Connection,
    user_id: i64,
    email: &str,
    primary: bool,
    verified: bool,
) -> Result<Email> {
    conn.execute(
        "INSERT INTO accounts_email (user_id, email, is_primary, verified)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, email, primary, verified],
    )?;
    Ok(Email {
        id: conn.last_insert_rowid(),
        user_id,
        email: email.to_string(),
        primary,
        verified,
    })
}

pub fn list_emails(conn: &Connection, user_id: i64) -> Result<Vec<Email>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, email, is_primary, verified FROM accounts_email
         WHERE user_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok(Email {
            id: row.get(0)?,
            user_id: row.get(1)?,
            email: row.get(2)?,
            primary: row.get(3)?,
            verified: row.get(4)?,
        })
    })?;

    let mut emails = Vec::new();
    for row in rows {
        emails.push(row?);
    }
    Ok(emails)
}
