//! Admin bindings for packaging entities and user accounts.
//!
//! This module provides:
//! - An [`AdminSite`] registry of [`ModelAdmin`] descriptors
//! - Form cleaning from raw string input (`forms`)
//! - Change-list search, filtering and ordering (`changelist`)
//!
//! Descriptors are plain data. Rendering them is the job of whatever UI sits
//! on top.

mod changelist;
mod forms;

pub use changelist::{changelist, ChangeList, ChangeListQuery, ChangeListRow};
pub use forms::{
    ClassifierForm, ContactForm, FormErrors, FormInput, ProjectForm, ProjectUrlForm, ReleaseForm,
    SignupForm, UserChangeForm,
};

use crate::error::{Result, WarehouseError};
use crate::packaging::ContactKind;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Top-level entities the admin site can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminModel {
    Classifier,
    Project,
    Release,
}

impl AdminModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminModel::Classifier => "classifier",
            AdminModel::Project => "project",
            AdminModel::Release => "release",
        }
    }
}

impl fmt::Display for AdminModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminModel {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "classifier" => Ok(AdminModel::Classifier),
            "project" => Ok(AdminModel::Project),
            "release" => Ok(AdminModel::Release),
            other => Err(WarehouseError::NotFound {
                entity: "admin model",
                key: other.to_string(),
            }),
        }
    }
}

/// Release-owned rows edited alongside their release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineModel {
    ProjectUrl,
    Contact(ContactKind),
}

/// Tabular inline editor for rows owned by the parent entity.
#[derive(Debug, Clone, Serialize)]
pub struct InlineAdmin {
    pub model: InlineModel,
    pub fields: &'static [&'static str],
    /// Number of blank rows offered for new entries.
    pub extra: u32,
}

/// How one entity appears in the admin.
#[derive(Debug, Clone, Serialize)]
pub struct ModelAdmin {
    pub model: AdminModel,
    /// Editable fields, in form order.
    pub fields: &'static [&'static str],
    /// Change-list columns.
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    /// Default change-list ordering; newest first when empty.
    pub ordering: &'static [&'static str],
    /// Foreign keys edited as a raw id rather than a choice list.
    pub raw_id_fields: &'static [&'static str],
    pub readonly_fields: &'static [&'static str],
    pub inlines: Vec<InlineAdmin>,
}

impl ModelAdmin {
    pub fn classifier() -> Self {
        Self {
            model: AdminModel::Classifier,
            fields: &["classifier"],
            list_display: &["classifier"],
            list_filter: &[],
            search_fields: &["classifier"],
            ordering: &["classifier"],
            raw_id_fields: &[],
            readonly_fields: &[],
            inlines: Vec::new(),
        }
    }

    pub fn project() -> Self {
        Self {
            model: AdminModel::Project,
            fields: &["name"],
            list_display: &["name"],
            list_filter: &[],
            search_fields: &["name"],
            ordering: &[],
            raw_id_fields: &[],
            readonly_fields: &[],
            inlines: Vec::new(),
        }
    }

    pub fn release() -> Self {
        const CONTACT_FIELDS: &[&str] = &["name", "email", "url", "role"];
        Self {
            model: AdminModel::Release,
            fields: &[
                "project",
                "version",
                "metadata_version",
                "summary",
                "description",
                "description_format",
                "source_label",
                "source_url",
                "license",
                "license_url",
                "keywords",
                "classifiers",
            ],
            list_display: &["project", "version", "summary"],
            list_filter: &["metadata_version"],
            search_fields: &["project__name", "version"],
            ordering: &[],
            raw_id_fields: &["project"],
            readonly_fields: &["keywords"],
            inlines: vec![
                InlineAdmin {
                    model: InlineModel::ProjectUrl,
                    fields: &["label", "url"],
                    extra: 0,
                },
                InlineAdmin {
                    model: InlineModel::Contact(ContactKind::Contact),
                    fields: CONTACT_FIELDS,
                    extra: 0,
                },
                InlineAdmin {
                    model: InlineModel::Contact(ContactKind::Contributor),
                    fields: CONTACT_FIELDS,
                    extra: 0,
                },
            ],
        }
    }

    pub fn is_readonly(&self, field: &str) -> bool {
        self.readonly_fields.contains(&field)
    }
}

/// Registry of model admins.
#[derive(Debug, Clone, Default)]
pub struct AdminSite {
    registry: Vec<ModelAdmin>,
}

impl AdminSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Site with the classifier, project and release admins registered.
    pub fn packaging() -> Self {
        let mut site = Self::new();
        site.register(ModelAdmin::classifier());
        site.register(ModelAdmin::project());
        site.register(ModelAdmin::release());
        site
    }

    /// Register a descriptor, replacing any earlier one for the same model.
    pub fn register(&mut self, admin: ModelAdmin) {
        self.registry.retain(|existing| existing.model != admin.model);
        self.registry.push(admin);
    }

    pub fn get(&self, model: AdminModel) -> Result<&ModelAdmin> {
        self.registry
            .iter()
            .find(|admin| admin.model == model)
            .ok_or_else(|| WarehouseError::NotFound {
                entity: "admin model",
                key: model.to_string(),
            })
    }

    pub fn models(&self) -> impl Iterator<Item = AdminModel> + '_ {
        self.registry.iter().map(|admin| admin.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packaging_site_registers_three_models() {
        let site = AdminSite::packaging();
        let models: Vec<_> = site.models().collect();
        assert_eq!(
            models,
            vec![AdminModel::Classifier, AdminModel::Project, AdminModel::Release]
        );
    }

    #[test]
    fn test_release_admin_descriptor() {
        let site = AdminSite::packaging();
        let release = site.get(AdminModel::Release).unwrap();
        assert_eq!(release.list_display, &["project", "version", "summary"]);
        assert_eq!(release.list_filter, &["metadata_version"]);
        assert!(release.is_readonly("keywords"));
        assert_eq!(release.raw_id_fields, &["project"]);
        assert_eq!(release.inlines.len(), 3);
        assert_eq!(
            release.inlines[2].model,
            InlineModel::Contact(ContactKind::Contributor)
        );
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut site = AdminSite::packaging();
        let mut project = ModelAdmin::project();
        project.ordering = &["name"];
        site.register(project);

        assert_eq!(site.models().count(), 3);
        assert_eq!(site.get(AdminModel::Project).unwrap().ordering, &["name"]);
    }

    #[test]
    fn test_unregistered_model_not_found() {
        let site = AdminSite::new();
        assert!(matches!(
            site.get(AdminModel::Classifier),
            Err(WarehouseError::NotFound { .. })
        ));
        assert!("widget".parse::<AdminModel>().is_err());
    }
}
