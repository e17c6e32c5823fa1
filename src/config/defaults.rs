//! # Process-Wide Default Store
//!
//! String-keyed settings shared by the whole process, consulted after the
//! scoped override and the persistent section.

use std::collections::HashMap;
use std::env;

/// Read-only, string-keyed lookup of process-wide settings
pub trait DefaultStore: Send + Sync {
    /// Look up the raw text stored under a logical setting name
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory application settings
///
/// # Examples
///
/// ```rust
/// use revalee_client::config::{AppSettings, DefaultStore};
///
/// let settings = AppSettings::from_iter([("RevaleeRequestTimeout", "5000")]);
/// assert_eq!(settings.get("RevaleeRequestTimeout").as_deref(), Some("5000"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    values: HashMap<String, String>,
}

impl AppSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the settings for chaining
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

impl<K, V> FromIterator<(K, V)> for AppSettings
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl DefaultStore for AppSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Process environment as a default store
///
/// Logical names are looked up verbatim (`RevaleeServiceBaseUri`), then in
/// upper snake case (`REVALEE_SERVICE_BASE_URI`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentDefaults;

impl EnvironmentDefaults {
    fn upper_snake_case(key: &str) -> String {
        let mut out = String::with_capacity(key.len() + 4);
        for (i, ch) in key.chars().enumerate() {
            if ch.is_ascii_uppercase() && i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_uppercase());
        }
        out
    }
}

impl DefaultStore for EnvironmentDefaults {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key)
            .or_else(|_| env::var(Self::upper_snake_case(key)))
            .ok()
    }
}

/// Store with no values, for deployments without process-wide defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl DefaultStore for NoDefaults {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }
}
