//! Ordered forwards/backwards schema migrations.
//!
//! Applied migrations are recorded in `warehouse_migrations`. Each migration
//! runs inside its own transaction, together with its bookkeeping row, so a
//! failed migration leaves the schema at the previous step.

mod m0001_initial;
mod m0002_accounts;
mod m0003_release_documents;

use crate::config::DatabaseConfig;
use crate::error::{Result, WarehouseError};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

/// A single schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub id: u32,
    pub name: &'static str,
    pub forwards: &'static str,
    pub backwards: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    m0001_initial::MIGRATION,
    m0002_accounts::MIGRATION,
    m0003_release_documents::MIGRATION,
];

/// A migration recorded as applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub id: u32,
    pub name: String,
    pub applied_at: String,
}

fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
        DatabaseConfig::MIGRATIONS_TABLE
    ))?;
    Ok(())
}

/// List applied migrations, oldest first.
pub fn applied(conn: &Connection) -> Result<Vec<AppliedMigration>> {
    ensure_migrations_table(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, applied_at FROM {} ORDER BY id",
        DatabaseConfig::MIGRATIONS_TABLE
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(AppliedMigration {
            id: row.get(0)?,
            name: row.get(1)?,
            applied_at: row.get(2)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Highest applied migration id, 0 when the schema is empty.
pub fn current_version(conn: &Connection) -> Result<u32> {
    Ok(applied(conn)?.last().map(|m| m.id).unwrap_or(0))
}

fn check_target(target: u32) -> Result<()> {
    if target == 0 || MIGRATIONS.iter().any(|m| m.id == target) {
        Ok(())
    } else {
        Err(WarehouseError::Migration {
            message: format!("Unknown migration target: {:04}", target),
        })
    }
}

/// Apply pending migrations up to and including `target` (all when `None`).
///
/// Returns the migrations applied by this call.
pub fn migrate(conn: &mut Connection, target: Option<u32>) -> Result<Vec<AppliedMigration>> {
    if let Some(target) = target {
        check_target(target)?;
    }
    let current = current_version(conn)?;
    let mut newly_applied = Vec::new();

    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.id > current && target.map_or(true, |t| m.id <= t))
    {
        let applied_at = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        tx.execute_batch(migration.forwards)
            .map_err(|e| WarehouseError::Migration {
                message: format!(
                    "Forwards migration {:04}_{} failed: {}",
                    migration.id, migration.name, e
                ),
            })?;
        tx.execute(
            &format!(
                "INSERT INTO {} (id, name, applied_at) VALUES (?1, ?2, ?3)",
                DatabaseConfig::MIGRATIONS_TABLE
            ),
            params![migration.id, migration.name, applied_at],
        )?;
        tx.commit()?;

        info!("Applied migration {:04}_{}", migration.id, migration.name);
        newly_applied.push(AppliedMigration {
            id: migration.id,
            name: migration.name.to_string(),
            applied_at,
        });
    }

    Ok(newly_applied)
}

/// Revert applied migrations newer than `target`, newest first.
///
/// A target of 0 reverts everything. Returns the ids reverted.
pub fn rollback(conn: &mut Connection, target: u32) -> Result<Vec<u32>> {
    check_target(target)?;
    let applied_ids: Vec<u32> = applied(conn)?.into_iter().map(|m| m.id).collect();
    let mut reverted = Vec::new();

    for migration in MIGRATIONS
        .iter()
        .rev()
        .filter(|m| m.id > target && applied_ids.contains(&m.id))
    {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.backwards)
            .map_err(|e| WarehouseError::Migration {
                message: format!(
                    "Backwards migration {:04}_{} failed: {}",
                    migration.id, migration.name, e
                ),
            })?;
        tx.execute(
            &format!(
                "DELETE FROM {} WHERE id = ?1",
                DatabaseConfig::MIGRATIONS_TABLE
            ),
            params![migration.id],
        )?;
        tx.commit()?;

        info!("Reverted migration {:04}_{}", migration.id, migration.name);
        reverted.push(migration.id);
    }

    Ok(reverted)
}
