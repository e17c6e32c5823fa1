//! # Service Base URI
//!
//! Validated base address of the Revalee dispatch service.
//!
//! Construction never fails loudly: [`ServiceBaseUri::try_create`] returns
//! `None` for malformed, relative, or non-HTTP input so that call sites can
//! chain fallbacks without error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Absolute http/https address of the callback dispatch service
///
/// The path is always normalized to end with `/`, so `http://host` and
/// `http://host/` compare equal.
///
/// # Examples
///
/// ```rust
/// use revalee_client::ServiceBaseUri;
///
/// let uri = ServiceBaseUri::try_create("https://callbacks.example.com").unwrap();
/// assert_eq!(uri.as_str(), "https://callbacks.example.com/");
///
/// assert!(ServiceBaseUri::try_create("not a uri").is_none());
/// assert!(ServiceBaseUri::try_create("/relative/path").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceBaseUri(Url);

/// Text that is not an absolute http/https address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid service base uri: {0}")]
pub struct InvalidServiceBaseUri(pub String);

impl ServiceBaseUri {
    /// Parse and validate a service base address from text
    pub fn try_create(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        Url::parse(trimmed).ok().and_then(Self::normalize)
    }

    /// Validate an already-parsed URL as a service base address
    pub fn from_url(url: &Url) -> Option<Self> {
        Self::normalize(url.clone())
    }

    fn normalize(mut url: Url) -> Option<Self> {
        if !ALLOWED_SCHEMES.contains(&url.scheme()) || url.cannot_be_a_base() {
            return None;
        }
        if url.host_str().map_or(true, str::is_empty) {
            return None;
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Some(Self(url))
    }

    /// Get the underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Get the normalized textual form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Build an endpoint URL relative to this base address
    ///
    /// Leading slashes on `path` are ignored so the base path is never dropped.
    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        self.0.join(path.trim_start_matches('/'))
    }

    /// Consume the wrapper and return the URL
    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for ServiceBaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl std::str::FromStr for ServiceBaseUri {
    type Err = InvalidServiceBaseUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_create(s).ok_or_else(|| InvalidServiceBaseUri(s.to_string()))
    }
}

impl TryFrom<String> for ServiceBaseUri {
    type Error = InvalidServiceBaseUri;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceBaseUri> for String {
    fn from(value: ServiceBaseUri) -> Self {
        value.0.into()
    }
}

impl AsRef<Url> for ServiceBaseUri {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}
