//! Project name and source label validators, and the canonical name key.
//!
//! The patterns here are the same ones the storage check constraints use,
//! so a value accepted by these functions is accepted by the database.

use crate::error::{Result, WarehouseError};
use regex::Regex;
use std::sync::LazyLock;

/// Starts and ends with an ASCII letter or digit; `.`, `_` and `-` allowed
/// in between.
pub const PROJECT_NAME_PATTERN: &str =
    r"^([A-Za-z0-9]|[A-Za-z0-9][A-Za-z0-9._-]*[A-Za-z0-9])$";

/// ASCII letters, digits, `.`, `+` and `-`.
pub const SOURCE_LABEL_PATTERN: &str = r"^[A-Za-z0-9.+-]+$";

pub const INVALID_PROJECT_NAME_MESSAGE: &str =
    "This value may contain only letters, numbers, and ./-/_ characters.";

pub const INVALID_SOURCE_LABEL_MESSAGE: &str =
    "This value may contain only letters, numbers, and ./-/+ characters.";

static PROJECT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(PROJECT_NAME_PATTERN).expect("project name regex must compile")
});

static SOURCE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(SOURCE_LABEL_PATTERN).expect("source label regex must compile")
});

pub fn is_valid_project_name(name: &str) -> bool {
    PROJECT_NAME_RE.is_match(name)
}

pub fn is_valid_source_label(label: &str) -> bool {
    SOURCE_LABEL_RE.is_match(label)
}

/// Validate a project name, reporting a user-facing error on failure.
pub fn validate_project_name(name: &str) -> Result<()> {
    if is_valid_project_name(name) {
        Ok(())
    } else {
        Err(WarehouseError::validation("name", INVALID_PROJECT_NAME_MESSAGE))
    }
}

/// Validate a release source label, reporting a user-facing error on failure.
pub fn validate_source_label(label: &str) -> Result<()> {
    if is_valid_source_label(label) {
        Ok(())
    } else {
        Err(WarehouseError::validation(
            "source_label",
            INVALID_SOURCE_LABEL_MESSAGE,
        ))
    }
}

/// Comparison key for project name uniqueness.
///
/// ASCII upper-case, then `_` becomes `-`, `1` and `L` become `I`, and `0`
/// becomes `O`. Two names collide when their keys are equal. Keep in sync
/// with `packaging_project_name_unique_idx`.
///
/// # Examples
///
/// ```
/// use warehouse_core::packaging::canonical_project_name;
///
/// assert_eq!(canonical_project_name("my_lib"), canonical_project_name("my-lib"));
/// assert_eq!(canonical_project_name("l0l"), "IOI");
/// ```
pub fn canonical_project_name(name: &str) -> String {
    name.chars()
        .map(|c| match c.to_ascii_uppercase() {
            '_' => '-',
            '1' | 'L' => 'I',
            '0' => 'O',
            other => other,
        })
        .collect()
}
