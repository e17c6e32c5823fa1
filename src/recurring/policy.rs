//! Deactivation policies deciding when request failures end a recurring task.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::request_error::RevaleeRequestError;

/// Decides whether a failed attempt should deactivate its task
pub trait DeactivationPolicy: Debug + Send + Sync {
    /// `consecutive_failures` includes the failure being evaluated
    fn should_deactivate(&self, consecutive_failures: u32, error: &RevaleeRequestError) -> bool;
}

/// Deactivate on the first non-recoverable failure, or once recoverable
/// failures exhaust the retry budget
///
/// A successful attempt resets the consecutive failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBudgetPolicy {
    pub max_consecutive_failures: u32,
}

impl RetryBudgetPolicy {
    pub fn new(max_consecutive_failures: u32) -> Self {
        Self {
            max_consecutive_failures,
        }
    }
}

impl Default for RetryBudgetPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl DeactivationPolicy for RetryBudgetPolicy {
    fn should_deactivate(&self, consecutive_failures: u32, error: &RevaleeRequestError) -> bool {
        !error.is_recoverable() || consecutive_failures >= self.max_consecutive_failures
    }
}
