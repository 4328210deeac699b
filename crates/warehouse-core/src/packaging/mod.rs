//! Projects, releases and everything a release owns.
//!
//! - `validation` – project name and source label formats, canonical name key
//! - `models` – entity types and the text-stored enumerations
//! - `store` – storage operations over an explicit connection

mod models;
pub mod store;
mod validation;

pub use models::{
    format_classifier, parse_classifier, Classifier, Contact, ContactKind, ContactRole, Document,
    DocumentKind, MetadataVersion, NewContact, NewProjectUrl, NewRelease, Project, ProjectUrl,
    Release, CLASSIFIER_SEPARATOR,
};
pub use validation::{
    canonical_project_name, is_valid_project_name, is_valid_source_label, validate_project_name,
    validate_source_label, INVALID_PROJECT_NAME_MESSAGE, INVALID_SOURCE_LABEL_MESSAGE,
    PROJECT_NAME_PATTERN, SOURCE_LABEL_PATTERN,
};
