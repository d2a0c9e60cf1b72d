//! URL validation and normalization.
//!
//! Turns a raw input cell into a fetchable, canonical URL or a typed rejection.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use url::{Host, Position, Url};

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::NormalizeError;
use crate::security::validate_url_safe;

/// Values that show up in spreadsheets in place of a missing URL.
const PLACEHOLDERS: &[&str] = &[
    "nan",
    "null",
    "none",
    "n/a",
    "na",
    "tbd",
    "-",
    "pending",
    "coming soon",
    "under construction",
];

/// Schemes rejected outright, even when written without `//`.
const REJECTED_SCHEMES: &[&str] = &["mailto:", "tel:", "ftp:", "file:", "javascript:", "data:"];

/// Suffixes reserved for local or documentation use.
const RESERVED_SUFFIXES: &[&str] = &[".local", ".test", ".invalid", ".localhost"];

static BARE_DOMAIN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9.-]+\.[a-z]{2,}").ok());

/// A validated URL in canonical form.
///
/// Scheme and host are lowercase, a bare `/` path and the fragment are
/// dropped. Normalizing the string form again yields the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Validates and normalizes a raw URL string.
///
/// Adds `https://` to bare domains and `www.` hosts, rejects non-HTTP schemes,
/// placeholders, internal targets, and hosts without a real top-level domain.
///
/// # Errors
///
/// Returns the [`NormalizeError`] describing the first rule the input breaks.
///
/// # Examples
///
/// ```
/// use site_status::normalize_url;
///
/// assert_eq!(normalize_url("WWW.EXAMPLE.COM").unwrap().as_str(), "https://www.example.com");
/// assert!(normalize_url("http://127.0.0.1").is_err());
/// ```
pub fn normalize_url(raw: &str) -> Result<NormalizedUrl, NormalizeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Empty);
    }
    let char_count = trimmed.chars().count();
    if char_count > MAX_URL_LENGTH {
        return Err(NormalizeError::TooLong(char_count));
    }

    let lower = trimmed.to_lowercase();
    if PLACEHOLDERS.contains(&lower.as_str()) {
        return Err(NormalizeError::Placeholder(trimmed.to_string()));
    }

    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else if let Some(scheme) = REJECTED_SCHEMES.iter().find(|s| lower.starts_with(*s)) {
        return Err(NormalizeError::UnsupportedScheme(
            scheme.trim_end_matches(':').to_string(),
        ));
    } else if let Some((scheme, _)) = lower.split_once("://") {
        return Err(NormalizeError::UnsupportedScheme(scheme.to_string()));
    } else if lower.starts_with("www.") || looks_like_bare_domain(trimmed) {
        format!("https://{trimmed}")
    } else {
        return Err(NormalizeError::NotAUrl);
    };

    let url = Url::parse(&candidate).map_err(|e| NormalizeError::Parse(e.to_string()))?;
    validate_url_safe(&url)?;
    check_tld(&url)?;

    let canonical = canonical_form(&url);
    if canonical.len() > MAX_URL_LENGTH {
        return Err(NormalizeError::TooLong(canonical.len()));
    }
    Ok(NormalizedUrl(canonical))
}

fn looks_like_bare_domain(value: &str) -> bool {
    BARE_DOMAIN
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Rejects reserved suffixes and top-level labels that are not at least two letters.
fn check_tld(url: &Url) -> Result<(), NormalizeError> {
    let domain = match url.host() {
        Some(Host::Domain(domain)) => domain.trim_end_matches('.'),
        Some(host) => return Err(NormalizeError::InvalidTld(host.to_string())),
        None => return Err(NormalizeError::MissingHost),
    };

    if RESERVED_SUFFIXES.iter().any(|s| domain.ends_with(s)) {
        return Err(NormalizeError::InvalidTld(domain.to_string()));
    }

    let tld = domain.rsplit('.').next().unwrap_or_default();
    if !domain.contains('.') || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(NormalizeError::InvalidTld(domain.to_string()));
    }
    Ok(())
}

fn canonical_form(url: &Url) -> String {
    let mut canonical = url[..Position::AfterPort].to_string();
    if url.path() != "/" {
        canonical.push_str(url.path());
    }
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        canonical.push('?');
        canonical.push_str(query);
    }
    canonical
}
