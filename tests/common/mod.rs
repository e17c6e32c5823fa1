//! Shared helpers for integration tests
#![allow(dead_code)]

pub mod mock_dispatcher;

use std::sync::Arc;

use revalee_client::config::{AppSettings, ClientSettingsSection, RevaleeSection, SettingsResolver};

/// Build a persistent section with the given client settings
pub fn section(key: Option<&str>, timeout: i32, uri: Option<&str>) -> RevaleeSection {
    RevaleeSection::with_client_settings(ClientSettingsSection {
        authorization_key: key.map(str::to_string),
        request_timeout: timeout,
        service_base_uri: uri.map(str::to_string),
    })
}

/// Build a resolver over an optional section and in-memory defaults
pub fn resolver(section: Option<RevaleeSection>, defaults: AppSettings) -> SettingsResolver {
    SettingsResolver::new(section, Arc::new(defaults))
}
