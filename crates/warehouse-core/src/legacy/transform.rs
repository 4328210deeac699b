//! Pure row conversions from legacy values to new-schema values.

use super::source::LegacyRelease;
use crate::accounts::{Timestamp, PASSWORD_UNUSABLE};
use crate::config::ImportConfig;
use crate::packaging::{ContactKind, ContactRole, NewContact, NewProjectUrl};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeSet;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// The value, unless it is missing, empty or the legacy `UNKNOWN` marker.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != ImportConfig::UNKNOWN_MARKER)
}

/// Tag legacy bcrypt hashes with their algorithm; other hashes pass through.
/// A missing hash becomes unusable.
pub fn convert_password(password: Option<&str>) -> String {
    match password {
        Some(hash) if hash.starts_with(ImportConfig::LEGACY_BCRYPT_PREFIX) => {
            format!("{}{}", ImportConfig::BCRYPT_TAG, &hash[1..])
        }
        Some(hash) => hash.to_string(),
        None => PASSWORD_UNUSABLE.to_string(),
    }
}

/// Legacy timestamps are naive UTC. Missing or unparsable values become the
/// beginning-of-time sentinel.
pub fn parse_last_login(value: Option<&str>) -> Timestamp {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Timestamp::BeginningOfTime;
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Timestamp::At(at.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Timestamp::At(naive.and_utc()))
        .unwrap_or(Timestamp::BeginningOfTime)
}

pub fn split_keywords(value: Option<&str>) -> BTreeSet<String> {
    present(value)
        .map(|keywords| keywords.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// `Home` and `Download` links of a release.
pub fn release_urls(release: &LegacyRelease) -> Vec<NewProjectUrl> {
    let mut urls = Vec::new();
    if let Some(url) = present(release.home_page.as_deref()) {
        urls.push(NewProjectUrl {
            label: ImportConfig::HOME_URL_LABEL.to_string(),
            url: url.to_string(),
        });
    }
    if let Some(url) = present(release.download_url.as_deref()) {
        urls.push(NewProjectUrl {
            label: ImportConfig::DOWNLOAD_URL_LABEL.to_string(),
            url: url.to_string(),
        });
    }
    urls
}

fn contact(role: ContactRole, name: Option<&str>, email: Option<&str>) -> Option<NewContact> {
    let name = present(name);
    let email = present(email);
    if name.is_none() && email.is_none() {
        return None;
    }
    Some(NewContact {
        kind: ContactKind::Contact,
        name: name.unwrap_or_default().to_string(),
        email: email.map(str::to_string),
        url: None,
        role,
    })
}

/// Author and maintainer contacts; either needs a name or an e-mail.
pub fn release_contacts(release: &LegacyRelease) -> Vec<NewContact> {
    [
        contact(
            ContactRole::Author,
            release.author.as_deref(),
            release.author_email.as_deref(),
        ),
        contact(
            ContactRole::Maintainer,
            release.maintainer.as_deref(),
            release.maintainer_email.as_deref(),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
