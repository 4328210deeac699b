//! User accounts and their e-mail addresses.

use super::Migration;

pub(super) const MIGRATION: Migration = Migration {
    id: 2,
    name: "accounts",
    forwards: FORWARDS,
    backwards: BACKWARDS,
};

// Timestamps are RFC 3339 text or the literal '-infinity'; never NULL.
const FORWARDS: &str = r#"
CREATE TABLE accounts_user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password TEXT NOT NULL,
    last_login TEXT NOT NULL,
    date_joined TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_staff INTEGER NOT NULL DEFAULT 0,
    is_superuser INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE accounts_email (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL
        REFERENCES accounts_user (id) ON DELETE CASCADE,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    is_primary INTEGER NOT NULL DEFAULT 0,
    verified INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT accounts_email_length CHECK (length(email) <= 254)
);

CREATE INDEX accounts_email_user_id ON accounts_email (user_id);
"#;

const BACKWARDS: &str = r#"
DROP TABLE accounts_email;
DROP TABLE accounts_user;
"#;
