//! Centralized configuration for the warehouse library.
//!
//! Constants for database connections and the legacy import, plus the
//! platform default database location.

use crate::error::{Result, WarehouseError};
use std::path::PathBuf;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "warehouse";
}

/// SQLite connection settings.
pub struct DatabaseConfig;

impl DatabaseConfig {
    pub const DEFAULT_FILENAME: &'static str = "warehouse.db";
    pub const BUSY_TIMEOUT_MS: u64 = 30_000;
    /// Table recording applied migrations.
    pub const MIGRATIONS_TABLE: &'static str = "warehouse_migrations";
    pub const DATABASE_ENV_VAR: &'static str = "WAREHOUSE_DATABASE";
}

/// Legacy PyPI import settings.
pub struct ImportConfig;

impl ImportConfig {
    /// Metadata version assigned to every imported release; the legacy
    /// rows do not record one.
    pub const DEFAULT_METADATA_VERSION: &'static str = "1.1";
    /// Legacy placeholder meaning "no value".
    pub const UNKNOWN_MARKER: &'static str = "UNKNOWN";
    /// Password hash prefix written by the legacy bcrypt handler.
    pub const LEGACY_BCRYPT_PREFIX: &'static str = "$2a$";
    pub const BCRYPT_TAG: &'static str = "bcrypt$";
    pub const ADMIN_ROLE: &'static str = "Admin";
    pub const HOME_URL_LABEL: &'static str = "Home";
    pub const DOWNLOAD_URL_LABEL: &'static str = "Download";
}

/// Default database path under the platform data directory.
///
/// - **Linux**: `~/.local/share/warehouse/warehouse.db`
/// - **Windows**: `%APPDATA%\warehouse\warehouse.db`
/// - **macOS**: `~/Library/Application Support/warehouse/warehouse.db`
pub fn default_database_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| WarehouseError::Config {
        message: "Could not determine the platform data directory".to_string(),
    })?;
    Ok(data_dir
        .join(AppConfig::APP_NAME)
        .join(DatabaseConfig::DEFAULT_FILENAME))
}
