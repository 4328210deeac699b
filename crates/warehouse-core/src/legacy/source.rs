//! Read-only access to a legacy PyPI database.

use crate::db::open_read_only;
use crate::error::Result;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A row of the legacy `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyUser {
    pub name: String,
    pub password: Option<String>,
    pub last_login: Option<String>,
    pub email: Option<String>,
}

/// A row of the legacy `releases` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyRelease {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub keywords: Option<String>,
    pub home_page: Option<String>,
    pub download_url: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
}

/// Column value as text, whatever its storage class.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    };
    Ok(value)
}

fn required_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(text_column(row, idx)?.unwrap_or_default())
}

/// Legacy database opened without write access.
pub struct LegacyDatabase {
    conn: Connection,
    path: PathBuf,
}

impl LegacyDatabase {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = open_read_only(path)?;
        debug!("Opened legacy database at {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn users(&self) -> Result<Vec<LegacyUser>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, password, last_login, email FROM users ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(LegacyUser {
                name: required_text(row, 0)?,
                password: text_column(row, 1)?,
                last_login: text_column(row, 2)?,
                email: text_column(row, 3)?,
            })
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Names of users holding `role`.
    pub fn users_with_role(&self, role: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_name FROM roles WHERE role_name = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map([role], |row| required_text(row, 0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    pub fn classifiers(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT classifier FROM trove_classifiers ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| required_text(row, 0))?;

        let mut classifiers = Vec::new();
        for row in rows {
            classifiers.push(row?);
        }
        Ok(classifiers)
    }

    pub fn package_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM packages ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| required_text(row, 0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    pub fn releases(&self) -> Result<Vec<LegacyRelease>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, version, summary, description, license, keywords,
                    home_page, download_url, author, author_email,
                    maintainer, maintainer_email
             FROM releases ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LegacyRelease {
                name: required_text(row, 0)?,
                version: required_text(row, 1)?,
                summary: text_column(row, 2)?,
                description: text_column(row, 3)?,
                license: text_column(row, 4)?,
                keywords: text_column(row, 5)?,
                home_page: text_column(row, 6)?,
                download_url: text_column(row, 7)?,
                author: text_column(row, 8)?,
                author_email: text_column(row, 9)?,
                maintainer: text_column(row, 10)?,
                maintainer_email: text_column(row, 11)?,
            })
        })?;

        let mut releases = Vec::new();
        for row in rows {
            releases.push(row?);
        }
        Ok(releases)
    }
}
