//! Request timeout value type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// Raw value denoting an infinite timeout
pub const INFINITE_TIMEOUT: i64 = -1;

/// Timeout applied to callback requests
///
/// Raw domain is `{-1} ∪ [1, +∞)` milliseconds. Zero and values below `-1`
/// have no representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestTimeout {
    /// No timeout, wait for the request indefinitely
    Infinite,
    /// Timeout in milliseconds
    Milliseconds(NonZeroU32),
}

impl RequestTimeout {
    /// Interpret a raw timeout value, `None` when it falls outside the domain
    pub fn from_raw(value: i64) -> Option<Self> {
        if value == INFINITE_TIMEOUT {
            return Some(Self::Infinite);
        }

        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self::Milliseconds)
    }

    /// Check whether a raw value is an accepted timeout
    pub fn is_valid_raw(value: i64) -> bool {
        Self::from_raw(value).is_some()
    }

    /// Raw representation, `-1` for infinite
    pub fn as_raw(&self) -> i64 {
        match self {
            Self::Infinite => INFINITE_TIMEOUT,
            Self::Milliseconds(ms) => i64::from(ms.get()),
        }
    }

    /// Timeout as a duration, `None` when infinite
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Infinite => None,
            Self::Milliseconds(ms) => Some(Duration::from_millis(u64::from(ms.get()))),
        }
    }
}

impl fmt::Display for RequestTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinite => write!(f, "infinite"),
            Self::Milliseconds(ms) => write!(f, "{ms}ms"),
        }
    }
}
