use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Password value that never matches any input.
pub const PASSWORD_UNUSABLE: &str = "!";

const BEGINNING_OF_TIME: &str = "-infinity";

/// A point in time, or the sentinel "beginning of time" used when the real
/// value is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timestamp {
    BeginningOfTime,
    At(DateTime<Utc>),
}

impl Timestamp {
    pub fn now() -> Self {
        Timestamp::At(Utc::now())
    }

    pub fn is_beginning_of_time(&self) -> bool {
        matches!(self, Timestamp::BeginningOfTime)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::BeginningOfTime => f.write_str(BEGINNING_OF_TIME),
            Timestamp::At(at) => f.write_str(&at.to_rfc3339()),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Timestamp::At(at)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        if raw == BEGINNING_OF_TIME {
            return Ok(Timestamp::BeginningOfTime);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|at| Timestamp::At(at.with_timezone(&Utc)))
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Hash tagged with its algorithm, e.g. `bcrypt$2a$12$...`.
    pub password: String,
    pub last_login: Timestamp,
    pub date_joined: Timestamp,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub last_login: Timestamp,
    pub date_joined: Timestamp,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            username: username.into(),
            password: password.into(),
            last_login: now,
            date_joined: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub primary: bool,
    pub verified: bool,
}
