//! Storage operations for packaging entities.
//!
//! Every function takes the connection explicitly; pass a `&Transaction` to
//! group writes. Validation runs first and reports `Validation` errors;
//! uniqueness is decided by the storage constraints alone.

use crate::error::{Result, WarehouseError};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::models::{
    format_classifier, Classifier, Contact, ContactKind, Document, DocumentKind, NewContact,
    NewProjectUrl, NewRelease, Project, ProjectUrl, Release,
};
use super::validation::{canonical_project_name, validate_project_name};

const RELEASE_COLUMNS: &str = "id, project_id, version, metadata_version, summary, \
     source_label, source_url, license, license_url, keywords";

const CANONICAL_NAME_SQL: &str =
    "replace(replace(replace(replace(upper(name), '_', '-'), '1', 'I'), 'L', 'I'), '0', 'O')";

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<Release> {
    Ok(Release {
        id: row.get(0)?,
        project_id: row.get(1)?,
        version: row.get(2)?,
        metadata_version: row.get(3)?,
        summary: row.get(4)?,
        source_label: row.get(5)?,
        source_url: row.get(6)?,
        license: row.get(7)?,
        license_url: row.get(8)?,
        keywords: json_column(row, 9)?,
    })
}

fn classifier_from_row(row: &Row<'_>) -> rusqlite::Result<Classifier> {
    Ok(Classifier {
        id: row.get(0)?,
        segments: json_column(row, 1)?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        release_id: row.get(1)?,
        kind: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        url: row.get(5)?,
        role: row.get(6)?,
    })
}

// ========================================
// Projects
// ========================================

/// Create a project after validating its name.
///
/// A name whose canonical key is already taken fails with a unique
/// `Constraint` error naming `packaging_project_name_unique_idx`.
pub fn create_project(conn: &Connection, name: &str) -> Result<Project> {
    validate_project_name(name)?;
    conn.execute(
        "INSERT INTO packaging_project (name) VALUES (?1)",
        params![name],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Created project {} ({})", name, id);
    Ok(Project {
        id,
        name: name.to_string(),
    })
}

pub fn get_project(conn: &Connection, id: i64) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            "SELECT id, name FROM packaging_project WHERE id = ?1",
            params![id],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

/// Look up the project whose name is equivalent to `name`.
pub fn find_project(conn: &Connection, name: &str) -> Result<Option<Project>> {
    let project = conn
        .query_row(
            &format!(
                "SELECT id, name FROM packaging_project WHERE {} = ?1",
                CANONICAL_NAME_SQL
            ),
            params![canonical_project_name(name)],
            project_from_row,
        )
        .optional()?;
    Ok(project)
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare("SELECT id, name FROM packaging_project ORDER BY name")?;
    let rows = stmt.query_map([], project_from_row)?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    Ok(projects)
}

/// Map of exact project name to id.
pub fn project_ids_by_name(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT id, name FROM packaging_project")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(1)?, row.get(0)?)))?;

    let mut ids = HashMap::new();
    for row in rows {
        let (name, id) = row?;
        ids.insert(name, id);
    }
    Ok(ids)
}

/// Delete a project and, through cascades, everything its releases own.
pub fn delete_project(conn: &Connection, id: i64) -> Result<bool> {
    let rows = conn.execute("DELETE FROM packaging_project WHERE id = ?1", params![id])?;
    if rows > 0 {
        debug!("Deleted project {}", id);
    }
    Ok(rows > 0)
}

// ========================================
// Releases
// ========================================

/// Empty optional fields are stored as NULL.
pub fn create_release(conn: &Connection, project_id: i64, release: &NewRelease) -> Result<Release> {
    let release = release.normalized();
    release.validate()?;
    let keywords_json = serde_json::to_string(&release.keywords)?;

    conn.execute(
        "INSERT INTO packaging_release (project_id, version, metadata_version, summary,
                                        source_label, source_url, license, license_url,
                                        keywords)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            project_id,
            release.version,
            release.metadata_version,
            release.summary,
            release.source_label,
            release.source_url,
            release.license,
            release.license_url,
            keywords_json,
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Created release {} of project {} ({})", release.version, project_id, id);

    Ok(Release {
        id,
        project_id,
        version: release.version.clone(),
        metadata_version: release.metadata_version,
        summary: release.summary.clone(),
        source_label: release.source_label.clone(),
        source_url: release.source_url.clone(),
        license: release.license.clone(),
        license_url: release.license_url.clone(),
        keywords: release.keywords.clone(),
    })
}

pub fn get_release(conn: &Connection, id: i64) -> Result<Option<Release>> {
    let release = conn
        .query_row(
            &format!("SELECT {} FROM packaging_release WHERE id = ?1", RELEASE_COLUMNS),
            params![id],
            release_from_row,
        )
        .optional()?;
    Ok(release)
}

pub fn find_release(conn: &Connection, project_id: i64, version: &str) -> Result<Option<Release>> {
    let release = conn
        .query_row(
            &format!(
                "SELECT {} FROM packaging_release WHERE project_id = ?1 AND version = ?2",
                RELEASE_COLUMNS
            ),
            params![project_id, version],
            release_from_row,
        )
        .optional()?;
    Ok(release)
}

pub fn list_releases(conn: &Connection, project_id: i64) -> Result<Vec<Release>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM packaging_release WHERE project_id = ?1 ORDER BY id",
        RELEASE_COLUMNS
    ))?;
    let rows = stmt.query_map(params![project_id], release_from_row)?;

    let mut releases = Vec::new();
    for row in rows {
        releases.push(row?);
    }
    Ok(releases)
}

/// Replace a release's keyword set.
pub fn set_keywords(conn: &Connection, release_id: i64, keywords: &BTreeSet<String>) -> Result<()> {
    let rows = conn.execute(
        "UPDATE packaging_release SET keywords = ?1 WHERE id = ?2",
        params![serde_json::to_string(keywords)?, release_id],
    )?;
    if rows == 0 {
        return Err(WarehouseError::NotFound {
            entity: "release",
            key: release_id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_release(conn: &Connection, id: i64) -> Result<bool> {
    let rows = conn.execute("DELETE FROM packaging_release WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Map of `(project name, version)` to release id across all projects.
pub fn release_ids_by_name_version(conn: &Connection) -> Result<HashMap<(String, String), i64>> {
    let mut stmt = conn.prepare(
        "SELECT p.name, r.version, r.id
         FROM packaging_release r
         JOIN packaging_project p ON p.id = r.project_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get(2)?))
    })?;

    let mut ids = HashMap::new();
    for row in rows {
        let (name, version, id) = row?;
        ids.insert((name, version), id);
    }
    Ok(ids)
}

// ========================================
// Classifiers
// ========================================

fn classifier_json(segments: &[String]) -> Result<String> {
    if segments.is_empty() || segments.iter().any(|s| s.trim().is_empty()) {
        return Err(WarehouseError::validation(
            "classifier",
            format!("Classifier has an empty segment: {:?}", format_classifier(segments)),
        ));
    }
    Ok(serde_json::to_string(segments)?)
}

pub fn create_classifier(conn: &Connection, segments: &[String]) -> Result<Classifier> {
    let json = classifier_json(segments)?;
    conn.execute(
        "INSERT INTO packaging_classifier (classifier) VALUES (?1)",
        params![json],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Created classifier {} ({})", format_classifier(segments), id);
    Ok(Classifier {
        id,
        segments: segments.to_vec(),
    })
}

pub fn find_classifier(conn: &Connection, segments: &[String]) -> Result<Option<Classifier>> {
    let json = classifier_json(segments)?;
    let classifier = conn
        .query_row(
            "SELECT id, classifier FROM packaging_classifier WHERE classifier = ?1",
            params![json],
            classifier_from_row,
        )
        .optional()?;
    Ok(classifier)
}

pub fn list_classifiers(conn: &Connection) -> Result<Vec<Classifier>> {
    let mut stmt =
        conn.prepare("SELECT id, classifier FROM packaging_classifier ORDER BY classifier")?;
    let rows = stmt.query_map([], classifier_from_row)?;

    let mut classifiers = Vec::new();
    for row in rows {
        classifiers.push(row?);
    }
    Ok(classifiers)
}

pub fn add_release_classifier(conn: &Connection, release_id: i64, classifier_id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO packaging_release_classifiers (release_id, classifier_id) VALUES (?1, ?2)",
        params![release_id, classifier_id],
    )?;
    Ok(())
}

pub fn remove_release_classifier(
    conn: &Connection,
    release_id: i64,
    classifier_id: i64,
) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM packaging_release_classifiers WHERE release_id = ?1 AND classifier_id = ?2",
        params![release_id, classifier_id],
    )?;
    Ok(rows > 0)
}

pub fn release_classifiers(conn: &Connection, release_id: i64) -> Result<Vec<Classifier>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.classifier
         FROM packaging_classifier c
         JOIN packaging_release_classifiers rc ON rc.classifier_id = c.id
         WHERE rc.release_id = ?1
         ORDER BY c.classifier",
    )?;
    let rows = stmt.query_map(params![release_id], classifier_from_row)?;

    let mut classifiers = Vec::new();
    for row in rows {
        classifiers.push(row?);
    }
    Ok(classifiers)
}

// ========================================
// Project URLs and contacts
// ========================================

pub fn add_project_url(conn: &Connection, release_id: i64, url: &NewProjectUrl) -> Result<ProjectUrl> {
    conn.execute(
        "INSERT INTO packaging_projecturl (release_id, label, url) VALUES (?1, ?2, ?3)",
        params![release_id, url.label, url.url],
    )?;
    Ok(ProjectUrl {
        id: conn.last_insert_rowid(),
        release_id,
        label: url.label.clone(),
        url: url.url.clone(),
    })
}

pub fn list_project_urls(conn: &Connection, release_id: i64) -> Result<Vec<ProjectUrl>> {
    let mut stmt = conn.prepare(
        "SELECT id, release_id, label, url FROM packaging_projecturl
         WHERE release_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![release_id], |row| {
        Ok(ProjectUrl {
            id: row.get(0)?,
            release_id: row.get(1)?,
            label: row.get(2)?,
            url: row.get(3)?,
        })
    })?;

    let mut urls = Vec::new();
    for row in rows {
        urls.push(row?);
    }
    Ok(urls)
}

pub fn add_contact(conn: &Connection, release_id: i64, contact: &NewContact) -> Result<Contact> {
    conn.execute(
        "INSERT INTO packaging_contact (release_id, kind, name, email, url, role)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            release_id,
            contact.kind,
            contact.name,
            contact.email,
            contact.url,
            contact.role,
        ],
    )?;
    Ok(Contact {
        id: conn.last_insert_rowid(),
        release_id,
        kind: contact.kind,
        name: contact.name.clone(),
        email: contact.email.clone(),
        url: contact.url.clone(),
        role: contact.role,
    })
}

/// Contacts of a release, optionally restricted to one kind.
pub fn list_contacts(
    conn: &Connection,
    release_id: i64,
    kind: Option<ContactKind>,
) -> Result<Vec<Contact>> {
    let mut stmt = conn.prepare(
        "SELECT id, release_id, kind, name, email, url, role FROM packaging_contact
         WHERE release_id = ?1 AND (?2 IS NULL OR kind = ?2)
         ORDER BY id",
    )?;
    let rows = stmt.query_map(params![release_id, kind], contact_from_row)?;

    let mut contacts = Vec::new();
    for row in rows {
        contacts.push(row?);
    }
    Ok(contacts)
}

// ========================================
// Release documents
// ========================================

/// Insert or replace the document of `kind` for a release.
pub fn set_document(
    conn: &Connection,
    release_id: i64,
    kind: DocumentKind,
    document: &Document,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (release_id, content, format) VALUES (?1, ?2, ?3)
             ON CONFLICT(release_id) DO UPDATE SET
                 content=excluded.content,
                 format=excluded.format",
            kind.table()
        ),
        params![release_id, document.content, document.format],
    )?;
    Ok(())
}

pub fn get_document(
    conn: &Connection,
    release_id: i64,
    kind: DocumentKind,
) -> Result<Option<Document>> {
    let document = conn
        .query_row(
            &format!(
                "SELECT content, format FROM {} WHERE release_id = ?1",
                kind.table()
            ),
            params![release_id],
            |row| {
                Ok(Document {
                    content: row.get(0)?,
                    format: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(document)
}

pub fn delete_document(conn: &Connection, release_id: i64, kind: DocumentKind) -> Result<bool> {
    let rows = conn.execute(
        &format!("DELETE FROM {} WHERE release_id = ?1", kind.table()),
        params![release_id],
    )?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::ConstraintKind;
    use crate::packaging::models::{ContactRole, MetadataVersion};

    fn migrated_db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn segments(value: &str) -> Vec<String> {
        crate::packaging::parse_classifier(value)
    }

    #[test]
    fn test_create_and_find_project() {
        let db = migrated_db();
        let project = create_project(db.conn(), "my-lib").unwrap();

        let found = find_project(db.conn(), "MY_LIB").unwrap().unwrap();
        assert_eq!(found, project);
        assert!(find_project(db.conn(), "other").unwrap().is_none());
    }

    #[test]
    fn test_equivalent_names_collide_in_storage() {
        let db = migrated_db();
        create_project(db.conn(), "my-lib").unwrap();

        let err = create_project(db.conn(), "my_lib").unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(err.constraint_name(), Some("packaging_project_name_unique_idx"));

        create_project(db.conn(), "l0l").unwrap();
        assert!(create_project(db.conn(), "IOI").unwrap_err().is_unique_violation());
    }

    #[test]
    fn test_invalid_name_rejected_before_storage() {
        let db = migrated_db();
        let err = create_project(db.conn(), "_bad").unwrap_err();
        assert!(matches!(err, WarehouseError::Validation { .. }));
    }

    #[test]
    fn test_check_constraint_guards_raw_inserts() {
        let db = migrated_db();
        let err: WarehouseError = db
            .conn()
            .execute("INSERT INTO packaging_project (name) VALUES ('_bad')", [])
            .unwrap_err()
            .into();
        match err {
            WarehouseError::Constraint {
                kind, constraint, ..
            } => {
                assert_eq!(kind, ConstraintKind::Check);
                assert_eq!(constraint, "packaging_project_valid_name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_metadata_version_check_constraint() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let err: WarehouseError = db
            .conn()
            .execute(
                "INSERT INTO packaging_release (project_id, version, metadata_version)
                 VALUES (?1, '1.0', '3.0')",
                params![project.id],
            )
            .unwrap_err()
            .into();
        assert_eq!(
            err.constraint_name(),
            Some("packaging_release_valid_metadata_version")
        );
    }

    #[test]
    fn test_release_uniqueness_per_project() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let other = create_project(db.conn(), "other").unwrap();

        let mut release = NewRelease::new("1.0", MetadataVersion::V1_2);
        release.source_label = Some("build.1".to_string());
        release.source_url = Some("https://example.com/pkg-1.0.tar.gz".to_string());
        create_release(db.conn(), project.id, &release).unwrap();

        // Same version in the same project
        assert!(create_release(db.conn(), project.id, &release)
            .unwrap_err()
            .is_unique_violation());

        // Same label (case-insensitive) in the same project
        let mut clash = NewRelease::new("2.0", MetadataVersion::V1_2);
        clash.source_label = Some("BUILD.1".to_string());
        assert!(create_release(db.conn(), project.id, &clash)
            .unwrap_err()
            .is_unique_violation());

        // Same source URL in the same project
        let mut clash = NewRelease::new("3.0", MetadataVersion::V1_2);
        clash.source_url = release.source_url.clone();
        let err = create_release(db.conn(), project.id, &clash).unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(
            err.constraint_name(),
            Some("packaging_release.project_id, packaging_release.source_url")
        );

        // Everything is fine in another project
        create_release(db.conn(), other.id, &release).unwrap();

        // Absent labels never clash
        create_release(db.conn(), project.id, &NewRelease::new("4.0", MetadataVersion::V1_0))
            .unwrap();
        create_release(db.conn(), project.id, &NewRelease::new("5.0", MetadataVersion::V1_0))
            .unwrap();
    }

    #[test]
    fn test_empty_source_fields_never_clash() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();

        for version in ["1.0", "2.0"] {
            let mut release = NewRelease::new(version, MetadataVersion::V1_1);
            release.source_url = Some(String::new());
            release.source_label = Some(String::new());
            let created = create_release(db.conn(), project.id, &release).unwrap();
            assert_eq!(created.source_url, None);
            assert_eq!(created.source_label, None);
        }

        // Empty text written directly is outside the partial index too
        for version in ["3.0", "4.0"] {
            db.conn()
                .execute(
                    "INSERT INTO packaging_release (project_id, version, metadata_version, source_url)
                     VALUES (?1, ?2, '1.1', '')",
                    params![project.id, version],
                )
                .unwrap();
        }
    }

    #[test]
    fn test_release_round_trip_keywords() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let mut release = NewRelease::new("1.0", MetadataVersion::V2_0);
        release.summary = Some("A package".to_string());
        release.keywords = ["web", "http"].iter().map(|s| s.to_string()).collect();

        let created = create_release(db.conn(), project.id, &release).unwrap();
        let loaded = get_release(db.conn(), created.id).unwrap().unwrap();
        assert_eq!(loaded, created);

        let found = find_release(db.conn(), project.id, "1.0").unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn test_cascade_delete_project() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let release =
            create_release(db.conn(), project.id, &NewRelease::new("1.0", MetadataVersion::V1_1))
                .unwrap();
        add_contact(
            db.conn(),
            release.id,
            &NewContact {
                name: "Jane".to_string(),
                role: ContactRole::Author,
                ..Default::default()
            },
        )
        .unwrap();
        set_document(
            db.conn(),
            release.id,
            DocumentKind::Description,
            &Document::new("Hello", "rst"),
        )
        .unwrap();

        assert!(delete_project(db.conn(), project.id).unwrap());

        assert!(get_release(db.conn(), release.id).unwrap().is_none());
        assert!(list_contacts(db.conn(), release.id, None).unwrap().is_empty());
        assert!(get_document(db.conn(), release.id, DocumentKind::Description)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_classifier_uniqueness_and_order() {
        let db = migrated_db();
        create_classifier(db.conn(), &segments("Topic :: Utilities")).unwrap();
        create_classifier(db.conn(), &segments("License :: OSI Approved")).unwrap();

        assert!(create_classifier(db.conn(), &segments("Topic :: Utilities"))
            .unwrap_err()
            .is_unique_violation());

        let all = list_classifiers(db.conn()).unwrap();
        let names: Vec<String> = all.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["License :: OSI Approved", "Topic :: Utilities"]);

        assert!(create_classifier(db.conn(), &segments("Topic ::  :: X")).is_err());
    }

    #[test]
    fn test_release_classifiers() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let release =
            create_release(db.conn(), project.id, &NewRelease::new("1.0", MetadataVersion::V1_1))
                .unwrap();
        let classifier = create_classifier(db.conn(), &segments("Topic :: Utilities")).unwrap();

        add_release_classifier(db.conn(), release.id, classifier.id).unwrap();
        assert!(add_release_classifier(db.conn(), release.id, classifier.id).is_err());
        assert_eq!(release_classifiers(db.conn(), release.id).unwrap(), vec![classifier.clone()]);

        assert!(remove_release_classifier(db.conn(), release.id, classifier.id).unwrap());
        assert!(release_classifiers(db.conn(), release.id).unwrap().is_empty());
    }

    #[test]
    fn test_project_url_label_unique_per_release() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let release =
            create_release(db.conn(), project.id, &NewRelease::new("1.0", MetadataVersion::V1_1))
                .unwrap();
        let home = NewProjectUrl {
            label: "Home".to_string(),
            url: "https://example.com".to_string(),
        };
        add_project_url(db.conn(), release.id, &home).unwrap();

        let dup = NewProjectUrl {
            label: "home".to_string(),
            url: "https://example.org".to_string(),
        };
        assert!(add_project_url(db.conn(), release.id, &dup)
            .unwrap_err()
            .is_unique_violation());
        assert_eq!(list_project_urls(db.conn(), release.id).unwrap().len(), 1);
    }

    #[test]
    fn test_contacts_filtered_by_kind() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let release =
            create_release(db.conn(), project.id, &NewRelease::new("1.0", MetadataVersion::V1_1))
                .unwrap();
        add_contact(
            db.conn(),
            release.id,
            &NewContact {
                name: "Jane".to_string(),
                role: ContactRole::Maintainer,
                ..Default::default()
            },
        )
        .unwrap();
        add_contact(
            db.conn(),
            release.id,
            &NewContact {
                kind: ContactKind::Contributor,
                name: "Bob".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let contributors =
            list_contacts(db.conn(), release.id, Some(ContactKind::Contributor)).unwrap();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].name, "Bob");
        assert_eq!(contributors[0].role, ContactRole::Contributor);
        assert_eq!(list_contacts(db.conn(), release.id, None).unwrap().len(), 2);
    }

    #[test]
    fn test_set_document_replaces() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let release =
            create_release(db.conn(), project.id, &NewRelease::new("1.0", MetadataVersion::V1_1))
                .unwrap();

        set_document(db.conn(), release.id, DocumentKind::Changelog, &Document::new("v1", "txt"))
            .unwrap();
        set_document(db.conn(), release.id, DocumentKind::Changelog, &Document::new("v2", "rst"))
            .unwrap();

        let doc = get_document(db.conn(), release.id, DocumentKind::Changelog)
            .unwrap()
            .unwrap();
        assert_eq!(doc, Document::new("v2", "rst"));
        assert!(delete_document(db.conn(), release.id, DocumentKind::Changelog).unwrap());
    }

    #[test]
    fn test_release_ids_by_name_version() {
        let db = migrated_db();
        let project = create_project(db.conn(), "pkg").unwrap();
        let release =
            create_release(db.conn(), project.id, &NewRelease::new("1.0", MetadataVersion::V1_1))
                .unwrap();

        let ids = release_ids_by_name_version(db.conn()).unwrap();
        assert_eq!(ids.get(&("pkg".to_string(), "1.0".to_string())), Some(&release.id));
    }
}
