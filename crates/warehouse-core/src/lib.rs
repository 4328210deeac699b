//! Warehouse Core - storage and import library for a Python package index.
//!
//! This crate provides the relational schema for projects, releases and
//! their metadata, the admin bindings over it, and the one-time importer
//! for a legacy PyPI database. It has no HTTP layer.
//!
//! # Example
//!
//! ```rust,no_run
//! use warehouse_core::packaging::store;
//! use warehouse_core::Database;
//!
//! fn main() -> warehouse_core::Result<()> {
//!     let mut db = Database::open("/tmp/warehouse.db")?;
//!     db.migrate()?;
//!
//!     let project = store::create_project(db.conn(), "requests")?;
//!     assert!(store::find_project(db.conn(), "REQUESTS")?.is_some());
//!     println!("Created project {}", project.name);
//!
//!     Ok(())
//! }
//! ```

pub mod about;
pub mod accounts;
pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod legacy;
pub mod packaging;

// Re-export commonly used types
pub use admin::{AdminModel, AdminSite, ChangeList, ChangeListQuery, ModelAdmin};
pub use config::{default_database_path, DatabaseConfig, ImportConfig};
pub use db::{AppliedMigration, Database, Migration, MIGRATIONS};
pub use error::{ConstraintKind, Result, WarehouseError};
pub use legacy::{ImportReport, ImportStep, LegacyDatabase, LegacyImporter};
pub use packaging::{canonical_project_name, MetadataVersion, Project, Release};
