//! Packaging entities: projects, releases, classifiers, project URLs,
//! contacts and release documents.

use crate::error::{Result, WarehouseError};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::validation::validate_source_label;

/// Separator between classifier path segments.
pub const CLASSIFIER_SEPARATOR: &str = " :: ";

/// Implements text storage for a closed string enum.
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: WarehouseError| FromSqlError::Other(e.to_string().into()))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Core metadata version a release was uploaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "1.2")]
    V1_2,
    #[serde(rename = "2.0")]
    V2_0,
}

impl MetadataVersion {
    pub const ALL: [MetadataVersion; 4] = [
        MetadataVersion::V1_0,
        MetadataVersion::V1_1,
        MetadataVersion::V1_2,
        MetadataVersion::V2_0,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataVersion::V1_0 => "1.0",
            MetadataVersion::V1_1 => "1.1",
            MetadataVersion::V1_2 => "1.2",
            MetadataVersion::V2_0 => "2.0",
        }
    }
}

impl FromStr for MetadataVersion {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        MetadataVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                WarehouseError::validation(
                    "metadata_version",
                    format!("Select a valid choice. {} is not one of the available choices.", s),
                )
            })
    }
}

sql_text_enum!(MetadataVersion);

/// Role a person plays for a release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Author,
    Maintainer,
    #[default]
    Contributor,
}

impl ContactRole {
    pub const ALL: [ContactRole; 3] = [
        ContactRole::Author,
        ContactRole::Maintainer,
        ContactRole::Contributor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactRole::Author => "author",
            ContactRole::Maintainer => "maintainer",
            ContactRole::Contributor => "contributor",
        }
    }
}

impl FromStr for ContactRole {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "author" => Ok(ContactRole::Author),
            "maintainer" => Ok(ContactRole::Maintainer),
            "contributor" => Ok(ContactRole::Contributor),
            other => Err(WarehouseError::validation(
                "role",
                format!("Select a valid choice. {} is not one of the available choices.", other),
            )),
        }
    }
}

sql_text_enum!(ContactRole);

/// Whether a contact row lists a point of contact or a contributor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    #[default]
    Contact,
    Contributor,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Contact => "contact",
            ContactKind::Contributor => "contributor",
        }
    }
}

impl FromStr for ContactKind {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "contact" => Ok(ContactKind::Contact),
            "contributor" => Ok(ContactKind::Contributor),
            other => Err(WarehouseError::validation(
                "kind",
                format!("Unknown contact kind: {}", other),
            )),
        }
    }
}

sql_text_enum!(ContactKind);

/// Kind of one-to-one release document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Description,
    License,
    Changelog,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Description,
        DocumentKind::License,
        DocumentKind::Changelog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Description => "description",
            DocumentKind::License => "license",
            DocumentKind::Changelog => "changelog",
        }
    }

    pub(crate) fn table(&self) -> &'static str {
        match self {
            DocumentKind::Description => "packaging_description",
            DocumentKind::License => "packaging_license",
            DocumentKind::Changelog => "packaging_changelog",
        }
    }
}

/// A named package namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// Release fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelease {
    pub version: String,
    pub metadata_version: MetadataVersion,
    pub summary: Option<String>,
    pub source_label: Option<String>,
    pub source_url: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub keywords: BTreeSet<String>,
}

impl NewRelease {
    pub fn new(version: impl Into<String>, metadata_version: MetadataVersion) -> Self {
        Self {
            version: version.into(),
            metadata_version,
            summary: None,
            source_label: None,
            source_url: None,
            license: None,
            license_url: None,
            keywords: BTreeSet::new(),
        }
    }

    /// Copy with empty optional text fields cleared to `None`.
    pub fn normalized(&self) -> NewRelease {
        fn non_empty(value: &Option<String>) -> Option<String> {
            value.clone().filter(|v| !v.trim().is_empty())
        }

        NewRelease {
            summary: non_empty(&self.summary),
            source_label: non_empty(&self.source_label),
            source_url: non_empty(&self.source_url),
            license: non_empty(&self.license),
            license_url: non_empty(&self.license_url),
            ..self.clone()
        }
    }

    /// Field-level checks run before the row reaches storage.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(WarehouseError::validation("version", "This field is required."));
        }
        if let Some(label) = &self.source_label {
            validate_source_label(label)?;
        }
        Ok(())
    }
}

/// A specific version of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: i64,
    pub project_id: i64,
    pub version: String,
    pub metadata_version: MetadataVersion,
    pub summary: Option<String>,
    pub source_label: Option<String>,
    pub source_url: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub keywords: BTreeSet<String>,
}

/// A hierarchical taxonomy tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    pub id: i64,
    pub segments: Vec<String>,
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_classifier(&self.segments))
    }
}

/// Split a classifier string on `" :: "`.
pub fn parse_classifier(value: &str) -> Vec<String> {
    value
        .split(CLASSIFIER_SEPARATOR)
        .map(|segment| segment.trim().to_string())
        .collect()
}

pub fn format_classifier(segments: &[String]) -> String {
    segments.join(CLASSIFIER_SEPARATOR)
}

/// A labelled URL attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUrl {
    pub id: i64,
    pub release_id: i64,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProjectUrl {
    pub label: String,
    pub url: String,
}

/// A person associated with a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub release_id: i64,
    pub kind: ContactKind,
    pub name: String,
    pub email: Option<String>,
    pub url: Option<String>,
    pub role: ContactRole,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub kind: ContactKind,
    pub name: String,
    pub email: Option<String>,
    pub url: Option<String>,
    pub role: ContactRole,
}

/// Free-text document content with its markup format (`rst`, `txt`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub format: String,
}

impl Document {
    pub fn new(content: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: format.into(),
        }
    }
}
