//! Warehouse CLI - operator commands for the package index database.
//!
//! Migrates the schema, imports a legacy PyPI database, manages projects
//! and searches the admin change lists.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use warehouse_core::{default_database_path, AdminModel, Database, DatabaseConfig};

#[derive(Parser, Debug)]
#[command(name = "warehouse")]
#[command(about = "Warehouse package index administration", version)]
struct Args {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = DatabaseConfig::DATABASE_ENV_VAR)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// Apply pending migrations
    Migrate {
        /// Stop after this migration id
        #[arg(long)]
        target: Option<u32>,
    },
    /// Revert applied migrations
    Rollback {
        /// Keep migrations up to this id (0 reverts everything; defaults to
        /// reverting only the latest)
        #[arg(long)]
        target: Option<u32>,
    },
    /// List migrations and whether they are applied
    Migrations,
    /// Import a legacy PyPI database
    ImportLegacy {
        /// Legacy SQLite database file
        path: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Admin change lists
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum ProjectCommand {
    /// Create a project
    Add { name: String },
    /// Validate a name and look for an equivalent existing project
    Check { name: String },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum AdminCommand {
    /// Search a change list
    Search {
        /// classifier, project or release
        model: AdminModel,
        /// Search terms
        term: Option<String>,
        /// Release filter
        #[arg(long)]
        metadata_version: Option<String>,
        #[arg(long, default_value_t = warehouse_core::ChangeListQuery::DEFAULT_PER_PAGE)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let database = match args.database {
        Some(path) => path,
        None => default_database_path()?,
    };
    debug!("Using database {}", database.display());

    let mut db = Database::open(&database)?;
    let output = commands::run(&mut db, args.command)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
