//! Step-by-step import of a legacy PyPI database.
//!
//! Each step runs in its own transaction and commits before the next one
//! starts. Rows the new schema rejects (constraint or validation failures)
//! are logged and counted as skipped; any other database failure aborts the
//! run, leaving earlier steps committed.

use super::source::{LegacyDatabase, LegacyRelease, LegacyUser};
use super::transform::{
    convert_password, parse_last_login, present, release_contacts, release_urls, split_keywords,
};
use crate::accounts::{self, NewUser, Timestamp};
use crate::config::ImportConfig;
use crate::error::{Result, WarehouseError};
use crate::packaging::{
    is_valid_project_name, parse_classifier, store, Document, DocumentKind, MetadataVersion,
    NewRelease,
};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

/// Import steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStep {
    Users,
    Emails,
    Admins,
    Classifiers,
    Projects,
    Releases,
    ProjectUrls,
    Contacts,
}

impl ImportStep {
    pub const ALL: [ImportStep; 8] = [
        ImportStep::Users,
        ImportStep::Emails,
        ImportStep::Admins,
        ImportStep::Classifiers,
        ImportStep::Projects,
        ImportStep::Releases,
        ImportStep::ProjectUrls,
        ImportStep::Contacts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStep::Users => "users",
            ImportStep::Emails => "emails",
            ImportStep::Admins => "admins",
            ImportStep::Classifiers => "classifiers",
            ImportStep::Projects => "projects",
            ImportStep::Releases => "releases",
            ImportStep::ProjectUrls => "project_urls",
            ImportStep::Contacts => "contacts",
        }
    }
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row counts for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: ImportStep,
    /// Rows written (or, for admins, users updated).
    pub inserted: usize,
    /// Rows the new schema rejected.
    pub skipped: usize,
    /// Rows left out by import policy, such as names failing the project
    /// name check or releases of projects that were not imported.
    pub filtered: usize,
}

impl StepReport {
    fn new(step: ImportStep) -> Self {
        Self {
            step,
            inserted: 0,
            skipped: 0,
            filtered: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub steps: Vec<StepReport>,
}

impl ImportReport {
    pub fn step(&self, step: ImportStep) -> Option<&StepReport> {
        self.steps.iter().find(|report| report.step == step)
    }

    pub fn total_inserted(&self) -> usize {
        self.steps.iter().map(|report| report.inserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.steps.iter().map(|report| report.skipped).sum()
    }
}

/// Rejections that skip a row instead of aborting the run.
fn is_row_anomaly(err: &WarehouseError) -> bool {
    err.is_constraint_violation() || matches!(err, WarehouseError::Validation { .. })
}

/// Count a row outcome, propagating errors that are not row anomalies.
fn record<T>(report: &mut StepReport, outcome: Result<T>, row: &dyn fmt::Display) -> Result<()> {
    match outcome {
        Ok(_) => {
            report.inserted += 1;
            Ok(())
        }
        Err(e) if is_row_anomaly(&e) => {
            warn!("Skipping {} row {}: {}", report.step, row, e);
            report.skipped += 1;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Imports a legacy database into a migrated target database.
pub struct LegacyImporter<'a> {
    source: &'a LegacyDatabase,
}

impl<'a> LegacyImporter<'a> {
    pub fn new(source: &'a LegacyDatabase) -> Self {
        Self { source }
    }

    /// Run every step in order.
    pub fn run(&self, target: &mut Connection) -> Result<ImportReport> {
        info!("Importing legacy database {}", self.source.path().display());
        let users = self.source.users()?;
        let releases = self.source.releases()?;

        let mut report = ImportReport::default();
        for step in ImportStep::ALL {
            let tx = target.transaction()?;
            let mut step_report = StepReport::new(step);

            match step {
                ImportStep::Users => self.import_users(&tx, &users, &mut step_report)?,
                ImportStep::Emails => self.import_emails(&tx, &users, &mut step_report)?,
                ImportStep::Admins => self.import_admins(&tx, &mut step_report)?,
                ImportStep::Classifiers => self.import_classifiers(&tx, &mut step_report)?,
                ImportStep::Projects => self.import_projects(&tx, &mut step_report)?,
                ImportStep::Releases => self.import_releases(&tx, &releases, &mut step_report)?,
                ImportStep::ProjectUrls => {
                    self.import_project_urls(&tx, &releases, &mut step_report)?
                }
                ImportStep::Contacts => self.import_contacts(&tx, &releases, &mut step_report)?,
            }

            tx.commit()?;
            info!(
                "Imported {}: {} inserted, {} skipped, {} filtered",
                step, step_report.inserted, step_report.skipped, step_report.filtered
            );
            report.steps.push(step_report);
        }

        Ok(report)
    }

    fn import_users(
        &self,
        conn: &Connection,
        users: &[LegacyUser],
        report: &mut StepReport,
    ) -> Result<()> {
        for user in users {
            let new_user = NewUser {
                username: user.name.clone(),
                password: convert_password(user.password.as_deref()),
                last_login: parse_last_login(user.last_login.as_deref()),
                date_joined: Timestamp::BeginningOfTime,
            };
            record(report, accounts::store::create_user(conn, &new_user), &user.name)?;
        }
        Ok(())
    }

    /// One primary, verified address per distinct e-mail; the first
    /// imported user listing an address keeps it.
    fn import_emails(
        &self,
        conn: &Connection,
        users: &[LegacyUser],
        report: &mut StepReport,
    ) -> Result<()> {
        let user_ids = accounts::store::user_ids_by_username(conn)?;
        let mut seen = HashSet::new();

        for user in users {
            let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) else {
                continue;
            };
            let Some(&user_id) = user_ids.get(&user.name) else {
                report.filtered += 1;
                continue;
            };
            if !seen.insert(email.to_string()) {
                continue;
            }
            record(
                report,
                accounts::store::add_email(conn, user_id, email, true, true),
                &email,
            )?;
        }
        Ok(())
    }

    fn import_admins(&self, conn: &Connection, report: &mut StepReport) -> Result<()> {
        for name in self.source.users_with_role(ImportConfig::ADMIN_ROLE)? {
            if accounts::store::grant_admin(conn, &name)? {
                report.inserted += 1;
            } else {
                warn!("Skipping admins row {}: no imported user", name);
                report.skipped += 1;
            }
        }
        Ok(())
    }

    fn import_classifiers(&self, conn: &Connection, report: &mut StepReport) -> Result<()> {
        for classifier in self.source.classifiers()? {
            let segments = parse_classifier(&classifier);
            record(report, store::create_classifier(conn, &segments), &classifier)?;
        }
        Ok(())
    }

    /// Only names passing the project-name check are imported for now.
    fn import_projects(&self, conn: &Connection, report: &mut StepReport) -> Result<()> {
        for name in self.source.package_names()? {
            if !is_valid_project_name(&name) {
                report.filtered += 1;
                continue;
            }
            record(report, store::create_project(conn, &name), &name)?;
        }
        Ok(())
    }

    fn import_releases(
        &self,
        conn: &Connection,
        releases: &[LegacyRelease],
        report: &mut StepReport,
    ) -> Result<()> {
        let project_ids = store::project_ids_by_name(conn)?;
        let metadata_version: MetadataVersion = ImportConfig::DEFAULT_METADATA_VERSION.parse()?;

        for legacy in releases {
            let Some(&project_id) = project_ids.get(&legacy.name) else {
                report.filtered += 1;
                continue;
            };

            let release = NewRelease {
                summary: present(legacy.summary.as_deref()).map(str::to_string),
                license: present(legacy.license.as_deref()).map(str::to_string),
                keywords: split_keywords(legacy.keywords.as_deref()),
                ..NewRelease::new(legacy.version.clone(), metadata_version)
            };

            let outcome = store::create_release(conn, project_id, &release).and_then(|created| {
                if let Some(description) = present(legacy.description.as_deref()) {
                    store::set_document(
                        conn,
                        created.id,
                        DocumentKind::Description,
                        &Document::new(description, ""),
                    )?;
                }
                Ok(created)
            });
            record(report, outcome, &ReleaseKey(legacy))?;
        }
        Ok(())
    }

    fn import_project_urls(
        &self,
        conn: &Connection,
        releases: &[LegacyRelease],
        report: &mut StepReport,
    ) -> Result<()> {
        let release_ids = store::release_ids_by_name_version(conn)?;

        for legacy in releases {
            let Some(&release_id) = release_ids.get(&(legacy.name.clone(), legacy.version.clone()))
            else {
                report.filtered += 1;
                continue;
            };
            for url in release_urls(legacy) {
                record(
                    report,
                    store::add_project_url(conn, release_id, &url),
                    &ReleaseKey(legacy),
                )?;
            }
        }
        Ok(())
    }

    fn import_contacts(
        &self,
        conn: &Connection,
        releases: &[LegacyRelease],
        report: &mut StepReport,
    ) -> Result<()> {
        let release_ids = store::release_ids_by_name_version(conn)?;

        for legacy in releases {
            let Some(&release_id) = release_ids.get(&(legacy.name.clone(), legacy.version.clone()))
            else {
                report.filtered += 1;
                continue;
            };
            for contact in release_contacts(legacy) {
                record(
                    report,
                    store::add_contact(conn, release_id, &contact),
                    &ReleaseKey(legacy),
                )?;
            }
        }
        Ok(())
    }
}

/// `name==version` for log lines.
struct ReleaseKey<'a>(&'a LegacyRelease);

impl fmt::Display for ReleaseKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.0.name, self.0.version)
    }
}
