//! # Callback Request Errors
//!
//! Error raised by a transport when a callback request could not be delivered
//! to the dispatch service. Consumed by the recurring-task deactivation
//! protocol, never by configuration resolution.

use std::error::Error as StdError;
use thiserror::Error;
use url::Url;

use crate::service_uri::ServiceBaseUri;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Classification of a failed callback request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestFailureKind {
    /// The service could not be reached (connection refused, DNS, reset)
    Transport,
    /// The request did not complete within the configured timeout
    Timeout,
    /// The service answered with a non-success status code
    Rejected { status: u16 },
    /// The service refused the authorization key
    Unauthorized,
    /// The request itself was malformed and will never succeed as sent
    InvalidRequest,
}

impl RequestFailureKind {
    /// Check if a retry of the same request could succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport | Self::Timeout => true,
            Self::Rejected { status } => *status >= 500 || *status == 429,
            Self::Unauthorized | Self::InvalidRequest => false,
        }
    }
}

/// A failed attempt to deliver a callback request
///
/// # Examples
///
/// ```rust
/// use revalee_client::{RequestFailureKind, RevaleeRequestError};
///
/// let kind = RequestFailureKind::Rejected { status: 503 };
/// let err = RevaleeRequestError::new(kind, "service busy");
/// assert!(err.is_recoverable());
/// assert_eq!(err.to_string(), "service busy");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RevaleeRequestError {
    message: String,
    kind: RequestFailureKind,
    service_base_uri: Option<ServiceBaseUri>,
    callback_uri: Option<Url>,
    #[source]
    source: Option<BoxedSource>,
}

impl RevaleeRequestError {
    /// Create a request error with the given classification and message
    pub fn new(kind: RequestFailureKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            service_base_uri: None,
            callback_uri: None,
            source: None,
        }
    }

    /// Create a transport-level failure wrapping the underlying cause
    pub fn transport(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self::new(RequestFailureKind::Transport, message).with_source(source)
    }

    /// Create a failure for a request that exceeded its timeout
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RequestFailureKind::Timeout, message)
    }

    /// Create a failure from a non-success status returned by the service
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => RequestFailureKind::Unauthorized,
            400 | 404 | 422 => RequestFailureKind::InvalidRequest,
            _ => RequestFailureKind::Rejected { status },
        };
        Self::new(kind, message)
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach the service base address the request was sent to
    #[must_use]
    pub fn with_service_base_uri(mut self, uri: ServiceBaseUri) -> Self {
        self.service_base_uri = Some(uri);
        self
    }

    /// Attach the callback address the request was scheduling
    #[must_use]
    pub fn with_callback_uri(mut self, uri: Url) -> Self {
        self.callback_uri = Some(uri);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> RequestFailureKind {
        self.kind
    }

    pub fn service_base_uri(&self) -> Option<&ServiceBaseUri> {
        self.service_base_uri.as_ref()
    }

    pub fn callback_uri(&self) -> Option<&Url> {
        self.callback_uri.as_ref()
    }

    /// Check if the failure is worth retrying
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}
