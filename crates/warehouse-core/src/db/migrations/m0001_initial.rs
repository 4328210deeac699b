//! Packaging tables: projects, releases, classifiers, project URLs and
//! contacts, with their uniqueness and check constraints.

use super::Migration;

pub(super) const MIGRATION: Migration = Migration {
    id: 1,
    name: "initial",
    forwards: FORWARDS,
    backwards: BACKWARDS,
};

const FORWARDS: &str = r#"
CREATE TABLE packaging_classifier (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    -- JSON array of path segments
    classifier TEXT NOT NULL
);

CREATE UNIQUE INDEX packaging_classifier_unq
    ON packaging_classifier (classifier);

CREATE TABLE packaging_project (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    CONSTRAINT packaging_project_valid_name CHECK (
        name REGEXP '^([A-Za-z0-9]|[A-Za-z0-9][A-Za-z0-9._-]*[A-Za-z0-9])$'
    )
);

-- Names are unique after folding case and treating `_`/`-`, `1`/`L`/`I`
-- and `0`/`O` as the same character. Must match canonical_project_name().
CREATE UNIQUE INDEX packaging_project_name_unique_idx
    ON packaging_project (
        replace(
            replace(
                replace(
                    replace(upper(name), '_', '-'),
                    '1', 'I'
                ),
                'L', 'I'
            ),
            '0', 'O'
        )
    );

CREATE TABLE packaging_release (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL
        REFERENCES packaging_project (id) ON DELETE CASCADE,
    version TEXT NOT NULL,
    metadata_version TEXT NOT NULL,
    summary TEXT,
    description TEXT,
    description_format TEXT,
    source_label TEXT COLLATE NOCASE,
    source_url TEXT,
    license TEXT,
    license_url TEXT,
    -- JSON array of keywords
    keywords TEXT NOT NULL DEFAULT '[]',
    CONSTRAINT packaging_release_project_id_version_uniq
        UNIQUE (project_id, version),
    CONSTRAINT packaging_release_valid_source_label CHECK (
        source_label REGEXP '^[A-Za-z0-9.+-]+$'
    ),
    CONSTRAINT packaging_release_valid_metadata_version CHECK (
        metadata_version IN ('1.0', '1.1', '1.2', '2.0')
    )
);

CREATE INDEX packaging_release_project_id
    ON packaging_release (project_id);

CREATE UNIQUE INDEX packaging_release_project_source_label_unq
    ON packaging_release (project_id, source_label)
    WHERE source_label IS NOT NULL AND source_label != '';

CREATE UNIQUE INDEX packaging_release_project_source_url_unq
    ON packaging_release (project_id, source_url)
    WHERE source_url IS NOT NULL AND source_url != '';

CREATE TABLE packaging_release_classifiers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id INTEGER NOT NULL
        REFERENCES packaging_release (id) ON DELETE CASCADE,
    classifier_id INTEGER NOT NULL
        REFERENCES packaging_classifier (id) ON DELETE CASCADE,
    UNIQUE (release_id, classifier_id)
);

CREATE TABLE packaging_projecturl (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id INTEGER NOT NULL
        REFERENCES packaging_release (id) ON DELETE CASCADE,
    label TEXT NOT NULL COLLATE NOCASE,
    url TEXT NOT NULL,
    CONSTRAINT packaging_projecturl_release_id_label_uniq
        UNIQUE (release_id, label)
);

-- Contacts and contributors share one table, told apart by `kind`.
CREATE TABLE packaging_contact (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id INTEGER NOT NULL
        REFERENCES packaging_release (id) ON DELETE CASCADE,
    kind TEXT NOT NULL DEFAULT 'contact',
    name TEXT NOT NULL,
    email TEXT,
    url TEXT,
    role TEXT NOT NULL DEFAULT 'contributor',
    CONSTRAINT packaging_contact_valid_kind CHECK (
        kind IN ('contact', 'contributor')
    ),
    CONSTRAINT packaging_contact_valid_role CHECK (
        role IN ('author', 'maintainer', 'contributor')
    ),
    CONSTRAINT packaging_contact_email_length CHECK (
        email IS NULL OR length(email) <= 254
    )
);

CREATE INDEX packaging_contact_release_id
    ON packaging_contact (release_id, kind);
"#;

const BACKWARDS: &str = r#"
DROP TABLE packaging_contact;
DROP TABLE packaging_projecturl;
DROP TABLE packaging_release_classifiers;
DROP TABLE packaging_release;
DROP TABLE packaging_project;
DROP TABLE packaging_classifier;
"#;
