//! # Settings Resolver
//!
//! Resolves the authorization key, request timeout, and service base address
//! for each callback request. Every setting is resolved independently through
//! the same precedence chain:
//!
//! 1. Scoped override held by the caller's [`RequestScope`]
//! 2. `client_settings` block of the persistent [`RevaleeSection`]
//! 3. Process-wide [`DefaultStore`]
//! 4. Absent
//!
//! Reads never fail: a missing or malformed value at any tier falls through to
//! the next one. The only loud failure is an out-of-range timeout write.
//! Nothing is cached, since scoped overrides can change between calls.

use std::sync::{Arc, OnceLock};
use tracing::{debug, trace, warn};
use url::Url;

use super::defaults::{DefaultStore, EnvironmentDefaults};
use super::scope::{RequestScope, ScopedValue};
use super::section::{ClientSettingsSection, RevaleeSection};
use super::timeout::{RequestTimeout, INFINITE_TIMEOUT};
use super::{
    AUTHORIZATION_KEY_SETTING, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVICE_BASE_URI,
    REQUEST_TIMEOUT_SETTING, SERVICE_BASE_URI_SETTING,
};
use crate::error::{Result, RevaleeError};
use crate::service_uri::ServiceBaseUri;

/// Settings applied to a single callback request, with built-in defaults filled in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackSettings {
    pub authorization_key: Option<String>,
    pub request_timeout: RequestTimeout,
    pub service_base_uri: ServiceBaseUri,
}

/// Layered resolver over the persistent section and the default store
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use revalee_client::config::{AppSettings, OperationScope, SettingsResolver};
///
/// let defaults = AppSettings::new().with("RevaleeRequestTimeout", "5000");
/// let resolver = SettingsResolver::new(None, Arc::new(defaults));
///
/// let mut scope = OperationScope::new();
/// assert_eq!(resolver.request_timeout(&scope).map(|t| t.as_raw()), Some(5000));
///
/// SettingsResolver::set_request_timeout(&mut scope, Some(-1)).unwrap();
/// assert_eq!(resolver.request_timeout(&scope).map(|t| t.as_raw()), Some(-1));
/// ```
#[derive(Clone)]
pub struct SettingsResolver {
    section: Option<RevaleeSection>,
    defaults: Arc<dyn DefaultStore>,
}

impl std::fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("section", &self.section.is_some())
            .finish_non_exhaustive()
    }
}

impl SettingsResolver {
    /// Create a resolver over an optional persistent section and a default store
    pub fn new(section: Option<RevaleeSection>, defaults: Arc<dyn DefaultStore>) -> Self {
        Self { section, defaults }
    }

    /// Create a resolver from the discovered section file and the process environment
    pub fn from_environment() -> Result<Self> {
        let section = RevaleeSection::load()?;
        Ok(Self::new(Some(section), Arc::new(EnvironmentDefaults)))
    }

    fn client_settings(&self) -> Option<&ClientSettingsSection> {
        self.section
            .as_ref()
            .and_then(|section| section.client_settings.as_ref())
    }

    /// Resolve the authorization key; its content is opaque and never validated
    pub fn authorization_key(&self, scope: &dyn RequestScope) -> Option<String> {
        if let Some(value) = scope
            .get(AUTHORIZATION_KEY_SETTING)
            .and_then(ScopedValue::into_text)
            .filter(|value| !value.is_empty())
        {
            trace!("Authorization key resolved from request scope");
            return Some(value);
        }

        if let Some(value) = self
            .client_settings()
            .and_then(|client| client.authorization_key.as_deref())
            .filter(|value| !value.is_empty())
        {
            trace!("Authorization key resolved from configuration section");
            return Some(value.to_string());
        }

        self.defaults
            .get(AUTHORIZATION_KEY_SETTING)
            .filter(|value| !value.is_empty())
    }

    /// Override the authorization key for the current scope
    ///
    /// `None` or an empty key clears the override.
    pub fn set_authorization_key(scope: &mut dyn RequestScope, key: Option<&str>) {
        match key.filter(|key| !key.is_empty()) {
            Some(key) => scope.set(AUTHORIZATION_KEY_SETTING, ScopedValue::from(key)),
            None => scope.remove(AUTHORIZATION_KEY_SETTING),
        }
    }

    /// Resolve the request timeout, `None` meaning "use the built-in default"
    pub fn request_timeout(&self, scope: &dyn RequestScope) -> Option<RequestTimeout> {
        if let Some(timeout) = scope
            .get(REQUEST_TIMEOUT_SETTING)
            .and_then(|value| value.as_integer())
            .and_then(RequestTimeout::from_raw)
        {
            trace!(%timeout, "Request timeout resolved from request scope");
            return Some(timeout);
        }

        if let Some(timeout) = self
            .client_settings()
            .and_then(|client| RequestTimeout::from_raw(i64::from(client.request_timeout)))
        {
            trace!(%timeout, "Request timeout resolved from configuration section");
            return Some(timeout);
        }

        self.defaults
            .get(REQUEST_TIMEOUT_SETTING)
            .and_then(|text| text.trim().parse::<i32>().ok())
            .and_then(|value| RequestTimeout::from_raw(i64::from(value)))
    }

    /// Override the request timeout for the current scope
    ///
    /// Values below `-1` are rejected without touching the scope. `None` and
    /// `0` clear the override; every other value is stored as given.
    pub fn set_request_timeout(scope: &mut dyn RequestScope, value: Option<i32>) -> Result<()> {
        let value = value.map(i64::from);
        if let Some(raw) = value {
            if raw < INFINITE_TIMEOUT {
                return Err(RevaleeError::out_of_range(REQUEST_TIMEOUT_SETTING, raw));
            }
        }

        match value.filter(|raw| RequestTimeout::is_valid_raw(*raw)) {
            Some(raw) => scope.set(REQUEST_TIMEOUT_SETTING, ScopedValue::Integer(raw)),
            None => scope.remove(REQUEST_TIMEOUT_SETTING),
        }
        Ok(())
    }

    /// Resolve the service base address
    pub fn service_base_uri(&self, scope: &dyn RequestScope) -> Option<ServiceBaseUri> {
        if let Some(uri) = scope
            .get(SERVICE_BASE_URI_SETTING)
            .and_then(ScopedValue::into_uri)
            .and_then(|url| ServiceBaseUri::from_url(&url))
        {
            trace!(%uri, "Service base uri resolved from request scope");
            return Some(uri);
        }

        if let Some(text) = self
            .client_settings()
            .and_then(|client| client.service_base_uri.as_deref())
            .filter(|text| !text.trim().is_empty())
        {
            match ServiceBaseUri::try_create(text) {
                Some(uri) => {
                    trace!(%uri, "Service base uri resolved from configuration section");
                    return Some(uri);
                }
                None => warn!(
                    value = %text,
                    "Ignoring invalid service base uri in configuration section"
                ),
            }
        }

        self.defaults
            .get(SERVICE_BASE_URI_SETTING)
            .filter(|text| !text.trim().is_empty())
            .and_then(|text| ServiceBaseUri::try_create(&text))
    }

    /// Override the service base address for the current scope
    ///
    /// Anything other than an absolute http/https address clears the override.
    pub fn set_service_base_uri(scope: &mut dyn RequestScope, value: Option<&Url>) {
        match value.and_then(ServiceBaseUri::from_url) {
            Some(uri) => scope.set(SERVICE_BASE_URI_SETTING, ScopedValue::Uri(uri.into_url())),
            None => scope.remove(SERVICE_BASE_URI_SETTING),
        }
    }

    /// Resolve every setting and apply built-in defaults for absent ones
    pub fn resolve(&self, scope: &dyn RequestScope) -> CallbackSettings {
        let settings = CallbackSettings {
            authorization_key: self.authorization_key(scope),
            request_timeout: self
                .request_timeout(scope)
                .unwrap_or_else(default_request_timeout),
            service_base_uri: self
                .service_base_uri(scope)
                .unwrap_or_else(default_service_base_uri),
        };

        debug!(
            has_authorization_key = settings.authorization_key.is_some(),
            request_timeout = %settings.request_timeout,
            service_base_uri = %settings.service_base_uri,
            "Resolved callback settings"
        );
        settings
    }
}

fn default_request_timeout() -> RequestTimeout {
    RequestTimeout::from_raw(DEFAULT_REQUEST_TIMEOUT_MS).unwrap_or(RequestTimeout::Infinite)
}

fn default_service_base_uri() -> ServiceBaseUri {
    static DEFAULT: OnceLock<ServiceBaseUri> = OnceLock::new();
    DEFAULT
        .get_or_init(|| {
            ServiceBaseUri::try_create(DEFAULT_SERVICE_BASE_URI)
                .expect("built-in service base uri is a valid absolute uri")
        })
        .clone()
}
