//! SQLite connection handling and schema migrations.
//!
//! A [`Database`] owns exactly one connection. Storage operations elsewhere
//! in the crate take an explicit `&Connection`, so callers decide whether a
//! group of writes shares a [`Transaction`] or runs in autocommit mode.
//!
//! Every connection gets the `REGEXP` SQL function registered before the
//! schema is touched: the project-name and source-label check constraints
//! call it, and inserts fail with "no such function" without it.

pub mod migrations;

use crate::config::DatabaseConfig;
use crate::error::{Result, WarehouseError};
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use migrations::{AppliedMigration, Migration, MIGRATIONS};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An open warehouse database.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database at `db_path`.
    ///
    /// Creates parent directories if they don't exist. The schema is not
    /// migrated; call [`Database::migrate`] for that.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| WarehouseError::io_with_path(e, parent))?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| WarehouseError::Database {
            message: format!("Failed to open database {}: {}", db_path.display(), e),
            source: Some(e),
        })?;
        configure_connection(&conn)?;

        debug!("Opened database at {}", db_path.display());

        Ok(Self {
            conn,
            path: Some(db_path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Database file path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Begin a transaction. It rolls back on drop unless committed.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Apply every pending migration.
    pub fn migrate(&mut self) -> Result<Vec<AppliedMigration>> {
        migrations::migrate(&mut self.conn, None)
    }
}

/// Apply pragmas and register SQL functions on a read-write connection.
fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA temp_store=MEMORY;",
    )?;
    conn.busy_timeout(Duration::from_millis(DatabaseConfig::BUSY_TIMEOUT_MS))?;
    register_functions(conn)?;
    Ok(())
}

/// Open an existing database file without write access.
pub(crate) fn open_read_only(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(WarehouseError::Io {
            message: format!("Database file not found: {}", db_path.display()),
            path: Some(db_path.to_path_buf()),
            source: None,
        });
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(db_path, flags)?;
    register_functions(&conn)?;
    Ok(conn)
}

/// Register `regexp(pattern, text)`, which backs `text REGEXP pattern`.
///
/// Compiled patterns are cached per statement. A NULL subject yields NULL so
/// check constraints on optional columns pass.
pub(crate) fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> std::result::Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let text = match ctx.get_raw(1) {
                ValueRef::Null => return Ok(None),
                value => value
                    .as_str()
                    .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?,
            };
            Ok(Some(pattern.is_match(text)))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_regexp_function_matches() {
        let db = Database::open_in_memory().unwrap();
        let matched: bool = db
            .conn()
            .query_row("SELECT 'abc-1' REGEXP '^[a-z0-9-]+$'", [], |row| row.get(0))
            .unwrap();
        assert!(matched);

        let matched: bool = db
            .conn()
            .query_row("SELECT 'a b' REGEXP '^[a-z]+$'", [], |row| row.get(0))
            .unwrap();
        assert!(!matched);
    }

    #[test]
    fn test_regexp_null_subject_is_null() {
        let db = Database::open_in_memory().unwrap();
        let result: Option<bool> = db
            .conn()
            .query_row("SELECT NULL REGEXP '^x$'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("warehouse.db");

        let db = Database::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(db.path(), Some(db_path.as_path()));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_open_read_only_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = open_read_only(&temp_dir.path().join("missing.db"));
        assert!(matches!(result, Err(WarehouseError::Io { .. })));
    }
}
