//! End-to-end tests for the legacy PyPI importer.
//!
//! Each test writes a small legacy database to a temp dir, imports it into
//! a freshly migrated target and checks both the report and the stored rows.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use warehouse_core::accounts::{self, Timestamp};
use warehouse_core::packaging::{store, ContactRole, DocumentKind, MetadataVersion};
use warehouse_core::{Database, ImportStep, LegacyDatabase, LegacyImporter, WarehouseError};

const LEGACY_SCHEMA: &str = r#"
CREATE TABLE users (name TEXT, password TEXT, last_login TEXT, email TEXT);
CREATE TABLE roles (user_name TEXT, role_name TEXT);
CREATE TABLE trove_classifiers (classifier TEXT);
CREATE TABLE packages (name TEXT);
CREATE TABLE releases (
    name TEXT, version TEXT, summary TEXT, description TEXT, license TEXT,
    keywords TEXT, home_page TEXT, download_url TEXT, author TEXT,
    author_email TEXT, maintainer TEXT, maintainer_email TEXT
);
"#;

type ReleaseRow<'a> = [Option<&'a str>; 12];

fn write_legacy_db(dir: &Path, with_roles: bool) -> PathBuf {
    let path = dir.join("legacy.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(LEGACY_SCHEMA).unwrap();
    if !with_roles {
        conn.execute_batch("DROP TABLE roles;").unwrap();
    }

    let users: [(&str, Option<&str>, Option<&str>, Option<&str>); 4] = [
        ("alice", Some("$2a$12$hash"), Some("2013-05-01 12:30:00"), Some("alice@example.com")),
        ("bob", Some("md5$abc"), None, Some("alice@example.com")),
        ("carol", Some("plain"), Some("garbage"), None),
        ("ALICE", Some("x"), None, Some("other@example.com")),
    ];
    for (name, password, last_login, email) in users {
        conn.execute(
            "INSERT INTO users VALUES (?1, ?2, ?3, ?4)",
            params![name, password, last_login, email],
        )
        .unwrap();
    }

    if with_roles {
        for (user, role) in [("alice", "Admin"), ("bob", "Owner"), ("ghost", "Admin")] {
            conn.execute("INSERT INTO roles VALUES (?1, ?2)", params![user, role])
                .unwrap();
        }
    }

    for classifier in ["Topic :: Utilities", "License :: OSI Approved", "Topic :: Utilities"] {
        conn.execute("INSERT INTO trove_classifiers VALUES (?1)", params![classifier])
            .unwrap();
    }

    for name in ["requests", "my_lib", "_bad", "my-lib", "flask"] {
        conn.execute("INSERT INTO packages VALUES (?1)", params![name])
            .unwrap();
    }

    let releases: [ReleaseRow<'_>; 5] = [
        [
            Some("requests"),
            Some("1.0"),
            Some("HTTP"),
            Some("Long description"),
            Some("UNKNOWN"),
            Some("http  web"),
            Some("https://python-requests.org"),
            Some("UNKNOWN"),
            Some("Kenneth"),
            Some("me@example.org"),
            None,
            Some(""),
        ],
        [
            Some("requests"),
            Some("1.0"),
            None,
            None,
            None,
            None,
            Some("https://elsewhere.example.com"),
            None,
            None,
            None,
            None,
            None,
        ],
        [
            Some("requests"),
            Some("2.0"),
            Some(""),
            None,
            Some("Apache 2.0"),
            None,
            None,
            None,
            None,
            None,
            None,
            None,
        ],
        [
            Some("_bad"),
            Some("0.1"),
            None,
            None,
            None,
            None,
            Some("https://bad.example.com"),
            None,
            Some("Someone"),
            None,
            None,
            None,
        ],
        [
            Some("flask"),
            Some("0.10"),
            None,
            None,
            None,
            None,
            Some(""),
            None,
            None,
            None,
            Some("Armin"),
            None,
        ],
    ];
    for row in releases {
        conn.execute(
            "INSERT INTO releases VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params_from_iter(row.iter()),
        )
        .unwrap();
    }

    path
}

fn migrated_target(dir: &Path) -> Database {
    let mut db = Database::open(dir.join("warehouse.db")).unwrap();
    db.migrate().unwrap();
    db
}

fn counts(report: &warehouse_core::ImportReport, step: ImportStep) -> (usize, usize, usize) {
    let step = report.step(step).unwrap();
    (step.inserted, step.skipped, step.filtered)
}

#[test]
fn test_full_import_report() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = LegacyDatabase::open(write_legacy_db(temp_dir.path(), true)).unwrap();
    let mut target = migrated_target(temp_dir.path());

    let report = LegacyImporter::new(&legacy)
        .run(target.conn_mut())
        .unwrap();

    assert_eq!(report.steps.len(), ImportStep::ALL.len());
    assert_eq!(counts(&report, ImportStep::Users), (3, 1, 0));
    assert_eq!(counts(&report, ImportStep::Emails), (1, 0, 1));
    assert_eq!(counts(&report, ImportStep::Admins), (1, 1, 0));
    assert_eq!(counts(&report, ImportStep::Classifiers), (2, 1, 0));
    assert_eq!(counts(&report, ImportStep::Projects), (3, 1, 1));
    assert_eq!(counts(&report, ImportStep::Releases), (3, 1, 1));
    assert_eq!(counts(&report, ImportStep::ProjectUrls), (1, 1, 1));
    assert_eq!(counts(&report, ImportStep::Contacts), (2, 0, 1));
}

#[test]
fn test_imported_users() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = LegacyDatabase::open(write_legacy_db(temp_dir.path(), true)).unwrap();
    let mut target = migrated_target(temp_dir.path());
    LegacyImporter::new(&legacy).run(target.conn_mut()).unwrap();
    let conn = target.conn();

    let alice = accounts::store::find_user_by_username(conn, "alice")
        .unwrap()
        .unwrap();
    assert_eq!(alice.password, "bcrypt$2a$12$hash");
    assert!(matches!(alice.last_login, Timestamp::At(_)));
    assert!(alice.date_joined.is_beginning_of_time());
    assert!(alice.is_staff && alice.is_superuser);

    let emails = accounts::store::list_emails(conn, alice.id).unwrap();
    assert_eq!(emails.len(), 1);
    assert!(emails[0].primary && emails[0].verified);

    let bob = accounts::store::find_user_by_username(conn, "bob")
        .unwrap()
        .unwrap();
    assert_eq!(bob.password, "md5$abc");
    assert!(bob.last_login.is_beginning_of_time());
    assert!(!bob.is_staff);
    assert!(accounts::store::list_emails(conn, bob.id).unwrap().is_empty());

    let carol = accounts::store::find_user_by_username(conn, "carol")
        .unwrap()
        .unwrap();
    assert!(carol.last_login.is_beginning_of_time());
}

#[test]
fn test_imported_releases_and_children() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = LegacyDatabase::open(write_legacy_db(temp_dir.path(), true)).unwrap();
    let mut target = migrated_target(temp_dir.path());
    LegacyImporter::new(&legacy).run(target.conn_mut()).unwrap();
    let conn = target.conn();

    assert!(store::find_project(conn, "_bad").unwrap().is_none());
    let my_lib = store::find_project(conn, "my-lib").unwrap().unwrap();
    assert_eq!(my_lib.name, "my_lib");

    let requests = store::find_project(conn, "requests").unwrap().unwrap();
    let first = store::find_release(conn, requests.id, "1.0").unwrap().unwrap();
    assert_eq!(first.metadata_version, MetadataVersion::V1_1);
    assert_eq!(first.summary.as_deref(), Some("HTTP"));
    assert_eq!(first.license, None);
    assert_eq!(
        first.keywords.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["http", "web"]
    );

    let description = store::get_document(conn, first.id, DocumentKind::Description)
        .unwrap()
        .unwrap();
    assert_eq!(description.content, "Long description");

    let urls = store::list_project_urls(conn, first.id).unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0].label, "Home");
    assert_eq!(urls[0].url, "https://python-requests.org");

    let contacts = store::list_contacts(conn, first.id, None).unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].name, "Kenneth");
    assert_eq!(contacts[0].role, ContactRole::Author);

    let second = store::find_release(conn, requests.id, "2.0").unwrap().unwrap();
    assert_eq!(second.summary, None);
    assert_eq!(second.license.as_deref(), Some("Apache 2.0"));
    assert!(store::get_document(conn, second.id, DocumentKind::Description)
        .unwrap()
        .is_none());

    let flask = store::find_project(conn, "flask").unwrap().unwrap();
    let release = store::find_release(conn, flask.id, "0.10").unwrap().unwrap();
    let contacts = store::list_contacts(conn, release.id, None).unwrap();
    assert_eq!(contacts[0].name, "Armin");
    assert_eq!(contacts[0].role, ContactRole::Maintainer);

    let classifiers = store::list_classifiers(conn).unwrap();
    assert_eq!(classifiers.len(), 2);
}

#[test]
fn test_shared_email_goes_to_first_imported_holder() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("legacy.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(LEGACY_SCHEMA).unwrap();
    for (name, email) in [
        ("alice", "a@x.org"),
        ("ALICE", "shared@x.org"),
        ("bob", "shared@x.org"),
    ] {
        conn.execute(
            "INSERT INTO users VALUES (?1, 'x', NULL, ?2)",
            params![name, email],
        )
        .unwrap();
    }
    drop(conn);

    let legacy = LegacyDatabase::open(&path).unwrap();
    let mut target = migrated_target(temp_dir.path());
    let report = LegacyImporter::new(&legacy).run(target.conn_mut()).unwrap();
    assert_eq!(counts(&report, ImportStep::Users), (2, 1, 0));
    assert_eq!(counts(&report, ImportStep::Emails), (2, 0, 1));

    let conn = target.conn();
    let bob = accounts::store::find_user_by_username(conn, "bob")
        .unwrap()
        .unwrap();
    let emails = accounts::store::list_emails(conn, bob.id).unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].email, "shared@x.org");
}

#[test]
fn test_failed_step_keeps_earlier_steps() {
    let temp_dir = TempDir::new().unwrap();
    let legacy = LegacyDatabase::open(write_legacy_db(temp_dir.path(), false)).unwrap();
    let mut target = migrated_target(temp_dir.path());

    let result = LegacyImporter::new(&legacy).run(target.conn_mut());
    assert!(matches!(result, Err(WarehouseError::Database { .. })));

    // Users and emails committed before the admins step failed
    let conn = target.conn();
    assert!(accounts::store::find_user_by_username(conn, "alice")
        .unwrap()
        .is_some());
    assert!(store::list_classifiers(conn).unwrap().is_empty());
}

#[test]
fn test_legacy_database_is_read_only() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_legacy_db(temp_dir.path(), true);
    let legacy = LegacyDatabase::open(&path).unwrap();
    assert_eq!(legacy.path(), path.as_path());
    assert_eq!(legacy.users().unwrap().len(), 4);

    let missing = LegacyDatabase::open(temp_dir.path().join("missing.db"));
    assert!(matches!(missing, Err(WarehouseError::Io { .. })));
}
