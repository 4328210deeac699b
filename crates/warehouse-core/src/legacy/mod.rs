//! Legacy PyPI database import.
//!
//! This module provides:
//! - Read-only access to the legacy tables (`source`)
//! - Row conversions into the new schema (`transform`)
//! - The step runner and its report (`importer`)

mod importer;
mod source;
mod transform;

pub use importer::{ImportReport, ImportStep, LegacyImporter, StepReport};
pub use source::{LegacyDatabase, LegacyRelease, LegacyUser};
pub use transform::{
    convert_password, parse_last_login, present, release_contacts, release_urls, split_keywords,
};
