//! Admin forms: clean raw string input into typed values.
//!
//! Each form's `clean` either returns the typed form or a [`FormErrors`] map
//! holding every problem found, keyed by field. `save` writes a cleaned form
//! through the packaging store.

use crate::accounts::{self, User};
use crate::error::{Result, WarehouseError};
use crate::packaging::{
    parse_classifier, store, validate_project_name, validate_source_label, Classifier, Contact,
    ContactKind, ContactRole, Document, DocumentKind, MetadataVersion, NewContact, NewProjectUrl,
    NewRelease, Project, ProjectUrl, Release,
};
use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Raw submitted values, keyed by field name.
pub type FormInput = BTreeMap<String, String>;

const REQUIRED: &str = "This field is required.";
const INVALID_URL: &str = "Enter a valid URL.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const INVALID_INTEGER: &str = "Enter a whole number.";
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_USERNAME_LENGTH: usize = 50;

pub const INVALID_USERNAME_MESSAGE: &str =
    "This value may contain only letters, numbers and @/./+/-/_ characters.";
pub const USERNAME_TAKEN_MESSAGE: &str = "Username is already taken";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Your passwords do not match";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex must compile"));

/// Validation messages per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn finish<T>(self, value: T) -> std::result::Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Record a validator's error against the field it names.
    fn absorb(&mut self, err: WarehouseError) {
        match err {
            WarehouseError::Validation { field, message } => self.add(field, message),
            other => self.add("__all__", other.to_string()),
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

impl From<FormErrors> for WarehouseError {
    fn from(errors: FormErrors) -> Self {
        let field = errors.fields().collect::<Vec<_>>().join(", ");
        WarehouseError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

fn optional(input: &FormInput, field: &str) -> Option<String> {
    input
        .get(field)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required(input: &FormInput, field: &str, errors: &mut FormErrors) -> Option<String> {
    let value = optional(input, field);
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

/// Absolute http(s) URL.
fn clean_url(value: Option<String>, field: &str, errors: &mut FormErrors) -> Option<String> {
    let value = value?;
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(value),
        _ => {
            errors.add(field, INVALID_URL);
            None
        }
    }
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

fn clean_email(value: Option<String>, field: &str, errors: &mut FormErrors) -> Option<String> {
    let value = value?;
    let length = value.chars().count();
    if length > MAX_EMAIL_LENGTH {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                MAX_EMAIL_LENGTH, length
            ),
        );
        return None;
    }
    if !is_plausible_email(&value) {
        errors.add(field, INVALID_EMAIL);
        return None;
    }
    Some(value)
}

fn clean_flag(input: &FormInput, field: &str) -> bool {
    optional(input, field)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn clean_id(value: &str, field: &str, errors: &mut FormErrors) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_INTEGER);
            None
        }
    }
}

// ========================================
// Classifier
// ========================================

/// Classifier entered as one `" :: "` delimited string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierForm {
    pub segments: Vec<String>,
}

impl ClassifierForm {
    pub fn clean(input: &FormInput) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let mut segments = Vec::new();

        if let Some(value) = required(input, "classifier", &mut errors) {
            segments = parse_classifier(&value);
            if segments.iter().any(|segment| segment.is_empty()) {
                errors.add("classifier", "Classifier segments may not be empty.");
            }
        }

        errors.finish(Self { segments })
    }

    pub fn save(&self, conn: &Connection) -> Result<Classifier> {
        store::create_classifier(conn, &self.segments)
    }
}

// ========================================
// Project
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: String,
}

impl ProjectForm {
    pub fn clean(input: &FormInput) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let name = required(input, "name", &mut errors).unwrap_or_default();

        if !name.is_empty() {
            if let Err(e) = validate_project_name(&name) {
                errors.absorb(e);
            }
        }

        errors.finish(Self { name })
    }

    pub fn save(&self, conn: &Connection) -> Result<Project> {
        store::create_project(conn, &self.name)
    }
}

// ========================================
// Release
// ========================================

/// Release edit form. `keywords` is read-only in the admin and never
/// taken from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseForm {
    /// Raw id of the owning project.
    pub project_id: i64,
    pub release: NewRelease,
    pub description: Option<Document>,
    pub classifier_ids: Vec<i64>,
}

impl ReleaseForm {
    pub fn clean(input: &FormInput) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();

        let project_id = required(input, "project", &mut errors)
            .and_then(|value| clean_id(&value, "project", &mut errors))
            .unwrap_or_default();

        let version = required(input, "version", &mut errors).unwrap_or_default();

        let metadata_version = required(input, "metadata_version", &mut errors)
            .and_then(|value| match value.parse::<MetadataVersion>() {
                Ok(version) => Some(version),
                Err(e) => {
                    errors.absorb(e);
                    None
                }
            })
            .unwrap_or(MetadataVersion::V1_0);

        let source_label = optional(input, "source_label");
        if let Some(label) = &source_label {
            if let Err(e) = validate_source_label(label) {
                errors.absorb(e);
            }
        }

        let source_url = clean_url(optional(input, "source_url"), "source_url", &mut errors);
        let license_url = clean_url(optional(input, "license_url"), "license_url", &mut errors);

        let description = optional(input, "description").map(|content| {
            Document::new(
                content,
                optional(input, "description_format").unwrap_or_default(),
            )
        });

        let classifier_ids = optional(input, "classifiers")
            .map(|value| {
                value
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .filter_map(|part| clean_id(part, "classifiers", &mut errors))
                    .collect()
            })
            .unwrap_or_default();

        let release = NewRelease {
            version,
            metadata_version,
            summary: optional(input, "summary"),
            source_label,
            source_url,
            license: optional(input, "license"),
            license_url,
            keywords: Default::default(),
        };

        errors.finish(Self {
            project_id,
            release,
            description,
            classifier_ids,
        })
    }

    /// Create the release with its description and classifiers.
    ///
    /// Pass a transaction to make the writes all-or-nothing.
    pub fn save(&self, conn: &Connection) -> Result<Release> {
        if store::get_project(conn, self.project_id)?.is_none() {
            return Err(WarehouseError::NotFound {
                entity: "project",
                key: self.project_id.to_string(),
            });
        }

        let release = store::create_release(conn, self.project_id, &self.release)?;
        if let Some(description) = &self.description {
            store::set_document(conn, release.id, DocumentKind::Description, description)?;
        }
        for classifier_id in &self.classifier_ids {
            store::add_release_classifier(conn, release.id, *classifier_id)?;
        }
        Ok(release)
    }
}

// ========================================
// Inlines
// ========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUrlForm {
    pub url: NewProjectUrl,
}

impl ProjectUrlForm {
    pub fn clean(input: &FormInput) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let label = required(input, "label", &mut errors).unwrap_or_default();
        let url = required(input, "url", &mut errors);
        let url = clean_url(url, "url", &mut errors).unwrap_or_default();

        errors.finish(Self {
            url: NewProjectUrl { label, url },
        })
    }

    pub fn save(&self, conn: &Connection, release_id: i64) -> Result<ProjectUrl> {
        store::add_project_url(conn, release_id, &self.url)
    }
}

/// Shared by the contact and contributor inlines; the inline decides the
/// kind when saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: Option<String>,
    pub url: Option<String>,
    pub role: ContactRole,
}

impl ContactForm {
    pub fn clean(input: &FormInput) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let name = required(input, "name", &mut errors).unwrap_or_default();
        let email = clean_email(optional(input, "email"), "email", &mut errors);
        let url = clean_url(optional(input, "url"), "url", &mut errors);

        let role = required(input, "role", &mut errors)
            .and_then(|value| match value.to_ascii_lowercase().parse::<ContactRole>() {
                Ok(role) => Some(role),
                Err(e) => {
                    errors.absorb(e);
                    None
                }
            })
            .unwrap_or_default();

        errors.finish(Self {
            name,
            email,
            url,
            role,
        })
    }

    pub fn save(&self, conn: &Connection, release_id: i64, kind: ContactKind) -> Result<Contact> {
        store::add_contact(
            conn,
            release_id,
            &NewContact {
                kind,
                name: self.name.clone(),
                email: self.email.clone(),
                url: self.url.clone(),
                role: self.role,
            },
        )
    }
}

// ========================================
// Accounts
// ========================================

fn clean_username(value: Option<String>, errors: &mut FormErrors) -> Option<String> {
    let value = value?;
    let length = value.chars().count();
    if length > MAX_USERNAME_LENGTH {
        errors.add(
            "username",
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                MAX_USERNAME_LENGTH, length
            ),
        );
        return None;
    }
    if !USERNAME_RE.is_match(&value) {
        errors.add("username", INVALID_USERNAME_MESSAGE);
        return None;
    }
    Some(value)
}

/// New account registration. Passwords are returned as entered; hashing
/// belongs to whoever creates the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    /// Usernames are checked against existing accounts, case-insensitively.
    pub fn clean(conn: &Connection, input: &FormInput) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();

        let username = clean_username(required(input, "username", &mut errors), &mut errors)
            .and_then(|username| match accounts::store::find_user_by_username(conn, &username) {
                Ok(None) => Some(username),
                Ok(Some(_)) => {
                    errors.add("username", USERNAME_TAKEN_MESSAGE);
                    None
                }
                Err(e) => {
                    errors.absorb(e);
                    None
                }
            })
            .unwrap_or_default();

        let email = required(input, "email", &mut errors);
        let email = clean_email(email, "email", &mut errors).unwrap_or_default();

        let password = required(input, "password", &mut errors);
        let confirm = required(input, "confirm_password", &mut errors);
        let password = match (password, confirm) {
            (Some(password), Some(confirm)) if password == confirm => password,
            (Some(_), Some(_)) => {
                errors.add("confirm_password", PASSWORD_MISMATCH_MESSAGE);
                String::new()
            }
            _ => String::new(),
        };

        errors.finish(Self {
            username,
            email,
            password,
        })
    }
}

/// Admin edit form for an existing user. The password hash is shown
/// read-only: whatever is submitted for it, the stored hash is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChangeForm {
    pub username: String,
    pub password: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl UserChangeForm {
    pub fn clean(input: &FormInput, initial: &User) -> std::result::Result<Self, FormErrors> {
        let mut errors = FormErrors::default();
        let username =
            clean_username(required(input, "username", &mut errors), &mut errors).unwrap_or_default();

        errors.finish(Self {
            username,
            password: initial.password.clone(),
            is_active: clean_flag(input, "is_active"),
            is_staff: clean_flag(input, "is_staff"),
            is_superuser: clean_flag(input, "is_superuser"),
        })
    }

    pub fn save(&self, conn: &Connection, initial: &User) -> Result<User> {
        let user = User {
            username: self.username.clone(),
            password: self.password.clone(),
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            ..initial.clone()
        };
        accounts::store::update_user(conn, &user)?;
        Ok(user)
    }
}
