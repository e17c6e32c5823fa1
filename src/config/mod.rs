//! # Configuration
//!
//! Layered resolution of the settings used to make callback requests.
//!
//! ## Sources
//!
//! - [`scope`] - Per-operation overrides owned by the caller
//! - [`section`] - Persistent `revalee` section loaded from a config file
//! - [`defaults`] - Process-wide string-keyed default store
//! - [`resolver`] - Precedence chain over the three sources
//!
//! ## Usage
//!
//! ```rust,no_run
//! use revalee_client::config::{OperationScope, SettingsResolver};
//!
//! # fn example() -> revalee_client::Result<()> {
//! let resolver = SettingsResolver::from_environment()?;
//!
//! let mut scope = OperationScope::new();
//! SettingsResolver::set_request_timeout(&mut scope, Some(10_000))?;
//!
//! let settings = resolver.resolve(&scope);
//! println!(
//!     "Dispatching to {} with timeout {}",
//!     settings.service_base_uri, settings.request_timeout
//! );
//! # Ok(())
//! # }
//! ```

pub mod defaults;
pub mod resolver;
pub mod scope;
pub mod section;
pub mod timeout;

pub use defaults::{AppSettings, DefaultStore, EnvironmentDefaults, NoDefaults};
pub use resolver::{CallbackSettings, SettingsResolver};
pub use scope::{OperationScope, RequestScope, ScopedValue};
pub use section::{ClientSettingsSection, RevaleeSection};
pub use timeout::RequestTimeout;

/// Logical name of the authorization key setting
pub const AUTHORIZATION_KEY_SETTING: &str = "RevaleeAuthorizationKey";

/// Logical name of the request timeout setting
pub const REQUEST_TIMEOUT_SETTING: &str = "RevaleeRequestTimeout";

/// Logical name of the service base address setting
pub const SERVICE_BASE_URI_SETTING: &str = "RevaleeServiceBaseUri";

/// Timeout applied when no source configures one
pub const DEFAULT_REQUEST_TIMEOUT_MS: i64 = 30_000;

/// Service address used when no source configures one
pub const DEFAULT_SERVICE_BASE_URI: &str = "http://localhost:46200/";
