#![allow(clippy::doc_markdown)] // Allow technical terms like Revalee, URI in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Revalee Client
//!
//! Client-side core for the Revalee deferred and recurring HTTP callback service.
//!
//! ## Overview
//!
//! A caller schedules a future HTTP request ("callback") against a remote
//! dispatch service. Every outgoing request needs three settings, an
//! authorization key, a request timeout, and the service base address, which
//! this crate resolves from layered sources. Recurring tasks re-issue such
//! schedules periodically and stop for good once their requests fail in a way
//! that should end scheduling.
//!
//! ## Module Organization
//!
//! - [`config`] - Scoped overrides, persistent section, default store, resolver
//! - [`service_uri`] - Validated service base address
//! - [`request_error`] - Failed callback request error
//! - [`recurring`] - Recurring tasks, deactivation protocol, scheduler
//! - [`error`] - Caller-facing error type
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use revalee_client::config::{AppSettings, OperationScope, SettingsResolver};
//!
//! let defaults = AppSettings::new()
//!     .with("RevaleeServiceBaseUri", "https://callbacks.example.com")
//!     .with("RevaleeAuthorizationKey", "secret");
//! let resolver = SettingsResolver::new(None, Arc::new(defaults));
//!
//! let mut scope = OperationScope::new();
//! SettingsResolver::set_request_timeout(&mut scope, Some(5_000)).unwrap();
//!
//! let settings = resolver.resolve(&scope);
//! assert_eq!(settings.service_base_uri.as_str(), "https://callbacks.example.com/");
//! assert_eq!(settings.request_timeout.as_raw(), 5_000);
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod recurring;
pub mod request_error;
pub mod service_uri;

pub use crate::config::{
    CallbackSettings, OperationScope, RequestScope, RequestTimeout, RevaleeSection,
    SettingsResolver,
};
pub use error::{Result, RevaleeError};
pub use recurring::{
    CallbackDispatcher, CallbackRequest, DeactivationEvent, RecurringTask, RecurringTaskScheduler,
    TaskState,
};
pub use request_error::{RequestFailureKind, RevaleeRequestError};
pub use service_uri::ServiceBaseUri;
