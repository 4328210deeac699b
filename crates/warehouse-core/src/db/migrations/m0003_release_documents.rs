//! One-to-one document sidecars for releases.
//!
//! The release description moves out of `packaging_release` into
//! `packaging_description`; license and changelog documents start empty.

use super::Migration;

pub(super) const MIGRATION: Migration = Migration {
    id: 3,
    name: "release_documents",
    forwards: FORWARDS,
    backwards: BACKWARDS,
};

const FORWARDS: &str = r#"
CREATE TABLE packaging_description (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id INTEGER NOT NULL UNIQUE
        REFERENCES packaging_release (id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    format TEXT NOT NULL DEFAULT ''
);

CREATE TABLE packaging_license (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id INTEGER NOT NULL UNIQUE
        REFERENCES packaging_release (id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    format TEXT NOT NULL DEFAULT ''
);

CREATE TABLE packaging_changelog (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_id INTEGER NOT NULL UNIQUE
        REFERENCES packaging_release (id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    format TEXT NOT NULL DEFAULT ''
);

INSERT INTO packaging_description (release_id, content, format)
    SELECT id, description, COALESCE(description_format, '')
    FROM packaging_release
    WHERE description IS NOT NULL AND description != '';

ALTER TABLE packaging_release DROP COLUMN description;
ALTER TABLE packaging_release DROP COLUMN description_format;
"#;

const BACKWARDS: &str = r#"
ALTER TABLE packaging_release ADD COLUMN description TEXT;
ALTER TABLE packaging_release ADD COLUMN description_format TEXT;

UPDATE packaging_release
SET description = (
        SELECT content FROM packaging_description d
        WHERE d.release_id = packaging_release.id
    ),
    description_format = (
        SELECT NULLIF(format, '') FROM packaging_description d
        WHERE d.release_id = packaging_release.id
    );

DROP TABLE packaging_changelog;
DROP TABLE packaging_license;
DROP TABLE packaging_description;
"#;
