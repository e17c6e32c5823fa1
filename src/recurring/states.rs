use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a recurring task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task is scheduling callback requests
    Active = 0,
    /// Task stopped after an unrecoverable request failure
    Deactivated = 1,
}

impl TaskState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deactivated)
    }

    /// Check if the task may still schedule callbacks
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<u8> for TaskState {
    fn from(value: u8) -> Self {
        match value {
            0 => TaskState::Active,
            _ => TaskState::Deactivated, // Unknown values are treated as terminal
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Deactivated => write!(f, "deactivated"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            _ => Err(format!("Invalid recurring task state: {s}")),
        }
    }
}

/// Default state for new tasks
impl Default for TaskState {
    fn default() -> Self {
        Self::Active
    }
}
