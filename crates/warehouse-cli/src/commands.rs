//! Command implementations. Each returns the text to print.

use crate::{AdminCommand, Command, ProjectCommand};
use anyhow::{bail, Context, Result};
use std::fmt::Write;
use tracing::info;
use warehouse_core::db::migrations;
use warehouse_core::packaging::{canonical_project_name, store, validate_project_name};
use warehouse_core::{
    AdminSite, ChangeListQuery, Database, ImportReport, LegacyDatabase, LegacyImporter, MIGRATIONS,
};

pub(crate) fn run(db: &mut Database, command: Command) -> Result<String> {
    match command {
        Command::Migrate { target } => migrate(db, target),
        Command::Rollback { target } => rollback(db, target),
        Command::Migrations => list_migrations(db),
        Command::ImportLegacy { path, json } => import_legacy(db, &path, json),
        Command::Project(ProjectCommand::Add { name }) => add_project(db, &name),
        Command::Project(ProjectCommand::Check { name }) => check_project(db, &name),
        Command::Admin(AdminCommand::Search {
            model,
            term,
            metadata_version,
            limit,
            offset,
        }) => {
            let mut query = ChangeListQuery {
                search: term,
                limit,
                offset,
                ..ChangeListQuery::default()
            };
            if let Some(version) = metadata_version {
                query = query.with_filter("metadata_version", version);
            }
            admin_search(db, model, &query)
        }
    }
}

fn migrate(db: &mut Database, target: Option<u32>) -> Result<String> {
    let applied = migrations::migrate(db.conn_mut(), target)?;
    if applied.is_empty() {
        return Ok("No migrations to apply.".to_string());
    }
    let lines: Vec<String> = applied
        .iter()
        .map(|m| format!("Applied {:04}_{}", m.id, m.name))
        .collect();
    Ok(lines.join("\n"))
}

fn rollback(db: &mut Database, target: Option<u32>) -> Result<String> {
    let current = migrations::current_version(db.conn())?;
    if current == 0 {
        return Ok("No migrations to revert.".to_string());
    }
    let target = match target {
        Some(target) => target,
        // Step back to the previous known migration
        None => MIGRATIONS
            .iter()
            .map(|m| m.id)
            .filter(|id| *id < current)
            .max()
            .unwrap_or(0),
    };

    let reverted = migrations::rollback(db.conn_mut(), target)?;
    if reverted.is_empty() {
        return Ok("No migrations to revert.".to_string());
    }
    let lines: Vec<String> = reverted
        .iter()
        .map(|id| format!("Reverted {:04}", id))
        .collect();
    Ok(lines.join("\n"))
}

fn list_migrations(db: &Database) -> Result<String> {
    let applied = migrations::applied(db.conn())?;
    let mut out = String::new();
    for migration in MIGRATIONS {
        let status = match applied.iter().find(|a| a.id == migration.id) {
            Some(a) => format!("applied {}", a.applied_at),
            None => "pending".to_string(),
        };
        writeln!(out, "{:04}_{}  {}", migration.id, migration.name, status)?;
    }
    Ok(out.trim_end().to_string())
}

fn import_legacy(db: &mut Database, path: &std::path::Path, json: bool) -> Result<String> {
    if migrations::current_version(db.conn())? < MIGRATIONS.last().map(|m| m.id).unwrap_or(0) {
        bail!("Database schema is not up to date; run `warehouse migrate` first");
    }

    let legacy = LegacyDatabase::open(path)
        .with_context(|| format!("Failed to open legacy database {}", path.display()))?;
    let report = LegacyImporter::new(&legacy).run(db.conn_mut())?;
    info!(
        "Legacy import finished: {} rows inserted, {} skipped",
        report.total_inserted(),
        report.total_skipped()
    );

    if json {
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        render_report(&report)
    }
}

fn render_report(report: &ImportReport) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<14}{:>10}{:>10}{:>10}",
        "step", "inserted", "skipped", "filtered"
    )?;
    for step in &report.steps {
        writeln!(
            out,
            "{:<14}{:>10}{:>10}{:>10}",
            step.step.as_str(),
            step.inserted,
            step.skipped,
            step.filtered
        )?;
    }
    Ok(out.trim_end().to_string())
}

fn add_project(db: &Database, name: &str) -> Result<String> {
    let project = store::create_project(db.conn(), name)?;
    Ok(format!("Created project {} (id {})", project.name, project.id))
}

fn check_project(db: &Database, name: &str) -> Result<String> {
    validate_project_name(name)?;
    let key = canonical_project_name(name);
    match store::find_project(db.conn(), name)? {
        Some(existing) => Ok(format!(
            "{} is valid but conflicts with existing project {} (key {})",
            name, existing.name, key
        )),
        None => Ok(format!("{} is valid and available (key {})", name, key)),
    }
}

fn admin_search(
    db: &Database,
    model: warehouse_core::AdminModel,
    query: &ChangeListQuery,
) -> Result<String> {
    let site = AdminSite::packaging();
    let admin = site.get(model)?;
    let list = warehouse_core::admin::changelist(db.conn(), admin, query)?;

    let mut out = String::new();
    writeln!(out, "id\t{}", list.columns.join("\t"))?;
    for row in &list.rows {
        writeln!(out, "{}\t{}", row.id, row.values.join("\t"))?;
    }
    write!(
        out,
        "{} of {} {} rows",
        list.rows.len(),
        list.total_count,
        list.model
    )?;
    Ok(out)
}
