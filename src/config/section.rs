//! # Persistent Configuration Section
//!
//! The `revalee` configuration section, read from a config file and an
//! environment overlay using the `config` crate.
//!
//! Values are read leniently. A mistyped `request_timeout` is kept as
//! unspecified and `service_base_uri` is validated at resolution time, so one
//! bad entry never hides the other settings of the section.
//!
//! ```toml
//! [client_settings]
//! authorization_key = "b0b5f6a0"
//! request_timeout = 15000
//! service_base_uri = "https://callbacks.example.com"
//! ```

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// Environment variable naming an explicit section file
pub const CONFIG_PATH_ENV: &str = "REVALEE_CONFIG_PATH";

/// Prefix of environment variables overlaid on the section file
pub const ENV_PREFIX: &str = "REVALEE";

const SEARCH_PATHS: [&str; 2] = ["./revalee.toml", "./config/revalee.toml"];

/// Persistent `revalee` configuration section
///
/// Read-only once loaded. A section without a `client_settings` block
/// contributes nothing to resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevaleeSection {
    pub client_settings: Option<ClientSettingsSection>,
}

/// `client_settings` block of the `revalee` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettingsSection {
    /// Authorization key sent with callback requests
    pub authorization_key: Option<String>,
    /// Request timeout in milliseconds, `0` means unspecified and `-1` infinite
    #[serde(deserialize_with = "lenient_timeout")]
    pub request_timeout: i32,
    /// Base address of the dispatch service, validated when resolved
    #[serde(deserialize_with = "lenient_text")]
    pub service_base_uri: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeout {
    Integer(i64),
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Other(IgnoredAny),
}

fn lenient_timeout<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let timeout = match RawTimeout::deserialize(deserializer)? {
        RawTimeout::Integer(value) => i32::try_from(value).ok(),
        RawTimeout::Text(text) => text.trim().parse::<i32>().ok(),
        RawTimeout::Other(IgnoredAny) => None,
    };

    Ok(timeout.unwrap_or_else(|| {
        warn!("Ignoring malformed request_timeout in revalee section");
        0
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match RawText::deserialize(deserializer)? {
        RawText::Text(text) => Ok(Some(text)),
        RawText::Other(IgnoredAny) => {
            warn!("Ignoring non-text service_base_uri in revalee section");
            Ok(None)
        }
    }
}

impl RevaleeSection {
    /// Create a section holding the given client settings
    pub fn with_client_settings(client_settings: ClientSettingsSection) -> Self {
        Self {
            client_settings: Some(client_settings),
        }
    }

    /// Load the section from the discovered config file and the environment
    ///
    /// Precedence (highest to lowest):
    /// 1. `REVALEE__CLIENT_SETTINGS__*` environment variables
    /// 2. File named by `REVALEE_CONFIG_PATH`, else `./revalee.toml` or
    ///    `./config/revalee.toml`
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file();
        Self::build(path.as_deref(), true)
    }

    /// Load the section from a specific file, without environment overlay
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::build(Some(path), false)
    }

    fn build(path: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading revalee section from file");
            builder = builder.add_source(::config::File::from(path));
        }

        if with_env {
            builder = builder.add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let section: Self = builder.build()?.try_deserialize()?;

        debug!(
            has_client_settings = section.client_settings.is_some(),
            "Loaded revalee section"
        );
        Ok(section)
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(explicit) = env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(explicit);
            if path.is_file() {
                return Some(path);
            }
            debug!(path = %path.display(), "Configured revalee section file does not exist");
        }

        SEARCH_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }
}
