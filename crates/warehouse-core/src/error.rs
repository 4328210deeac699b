//! Error types for the warehouse core library.
//!
//! Storage constraint failures are parsed out of SQLite's error messages so
//! callers can tell a uniqueness clash from a malformed value without
//! matching on strings themselves.

use std::path::PathBuf;
use thiserror::Error;

/// Kind of storage constraint that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    Check,
    ForeignKey,
    NotNull,
    Other,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::Check => "check",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Other => "constraint",
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the warehouse library.
#[derive(Debug, Error)]
pub enum WarehouseError {
    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("{kind} constraint violated ({constraint}): {message}")]
    Constraint {
        kind: ConstraintKind,
        /// Constraint, index or column list named by SQLite.
        constraint: String,
        message: String,
    },

    #[error("Migration error: {message}")]
    Migration { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;

impl From<std::io::Error> for WarehouseError {
    fn from(err: std::io::Error) -> Self {
        WarehouseError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        WarehouseError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for WarehouseError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                let message = message.clone().unwrap_or_else(|| err.to_string());
                let (kind, constraint) = parse_constraint_message(&message);
                return WarehouseError::Constraint {
                    kind,
                    constraint,
                    message,
                };
            }
        }
        WarehouseError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Split a SQLite constraint message such as
/// `UNIQUE constraint failed: index 'packaging_project_name_unique_idx'`
/// into its kind and the constraint it names.
fn parse_constraint_message(message: &str) -> (ConstraintKind, String) {
    let (head, tail) = match message.split_once(':') {
        Some((head, tail)) => (head.trim(), tail.trim()),
        None => (message.trim(), ""),
    };

    let kind = match head {
        "UNIQUE constraint failed" => ConstraintKind::Unique,
        "CHECK constraint failed" => ConstraintKind::Check,
        "FOREIGN KEY constraint failed" => ConstraintKind::ForeignKey,
        "NOT NULL constraint failed" => ConstraintKind::NotNull,
        _ => ConstraintKind::Other,
    };

    let constraint = tail
        .strip_prefix("index ")
        .unwrap_or(tail)
        .trim_matches('\'')
        .to_string();

    (kind, constraint)
}

impl WarehouseError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        WarehouseError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        WarehouseError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for any storage constraint rejection.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, WarehouseError::Constraint { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            WarehouseError::Constraint {
                kind: ConstraintKind::Unique,
                ..
            }
        )
    }

    /// Name of the violated constraint, if this is a constraint error.
    ///
    /// Named `CONSTRAINT`s and expression indexes report their name. Column
    /// `UNIQUE` constraints and unique indexes over plain columns (partial
    /// ones included) report the column list instead, e.g.
    /// `packaging_release.project_id, packaging_release.source_url`.
    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            WarehouseError::Constraint { constraint, .. } => Some(constraint),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WarehouseError::NotFound {
            entity: "project",
            key: "requests".into(),
        };
        assert_eq!(err.to_string(), "project not found: requests");
    }

    #[test]
    fn test_parse_unique_index_message() {
        let (kind, name) = parse_constraint_message(
            "UNIQUE constraint failed: index 'packaging_project_name_unique_idx'",
        );
        assert_eq!(kind, ConstraintKind::Unique);
        assert_eq!(name, "packaging_project_name_unique_idx");
    }

    #[test]
    fn test_parse_column_and_check_messages() {
        let (kind, name) = parse_constraint_message(
            "UNIQUE constraint failed: packaging_release.project_id, packaging_release.version",
        );
        assert_eq!(kind, ConstraintKind::Unique);
        assert_eq!(name, "packaging_release.project_id, packaging_release.version");

        let (kind, name) =
            parse_constraint_message("CHECK constraint failed: packaging_project_valid_name");
        assert_eq!(kind, ConstraintKind::Check);
        assert_eq!(name, "packaging_project_valid_name");

        let (kind, name) = parse_constraint_message("FOREIGN KEY constraint failed");
        assert_eq!(kind, ConstraintKind::ForeignKey);
        assert!(name.is_empty());
    }

    #[test]
    fn test_io_with_path_keeps_path() {
        let err = WarehouseError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            "/srv/warehouse",
        );
        match err {
            WarehouseError::Io { path, source, .. } => {
                assert_eq!(path, Some(PathBuf::from("/srv/warehouse")));
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_is_not_a_constraint() {
        let err = WarehouseError::validation("name", "bad");
        assert!(!err.is_constraint_violation());
        assert_eq!(err.constraint_name(), None);
    }
}
