//! # Client Error Types
//!
//! Errors raised directly to callers of the configuration API. Failed callback
//! deliveries are a separate concern, see [`crate::request_error`].

use thiserror::Error;

/// Client operation result type
pub type Result<T> = std::result::Result<T, RevaleeError>;

/// Errors surfaced to callers of the client configuration API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevaleeError {
    /// A caller supplied a value outside the domain of a setting
    #[error("Value out of range for {name}: {value}")]
    OutOfRange { name: &'static str, value: i64 },

    /// A configuration source could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RevaleeError {
    /// Create an out-of-range error for the named setting
    pub fn out_of_range(name: &'static str, value: i64) -> Self {
        Self::OutOfRange { name, value }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this error was caused by caller input rather than the environment
    #[must_use]
    pub fn is_caller_input(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

impl From<::config::ConfigError> for RevaleeError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::config_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = RevaleeError::out_of_range("RevaleeRequestTimeout", -2);
        assert_eq!(
            err.to_string(),
            "Value out of range for RevaleeRequestTimeout: -2"
        );
        assert!(err.is_caller_input());
    }

    #[test]
    fn test_config_error_is_not_caller_input() {
        let err = RevaleeError::config_error("missing file");
        assert_eq!(err.to_string(), "Configuration error: missing file");
        assert!(!err.is_caller_input());
    }
}
