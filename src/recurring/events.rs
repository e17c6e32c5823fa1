use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::task::TaskId;
use crate::request_error::RevaleeRequestError;

/// Payload raised once when a recurring task is deactivated
///
/// Cloning is cheap: the cause is shared, not copied.
#[derive(Debug, Clone)]
pub struct DeactivationEvent {
    task_id: TaskId,
    task_name: Arc<str>,
    cause: Arc<RevaleeRequestError>,
    deactivated_at: DateTime<Utc>,
}

impl DeactivationEvent {
    pub(crate) fn new(task_id: TaskId, task_name: Arc<str>, cause: RevaleeRequestError) -> Self {
        Self {
            task_id,
            task_name,
            cause: Arc::new(cause),
            deactivated_at: Utc::now(),
        }
    }

    /// Identifier of the task that was deactivated
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// The request failure that caused the deactivation
    pub fn cause(&self) -> &RevaleeRequestError {
        &self.cause
    }

    pub fn deactivated_at(&self) -> DateTime<Utc> {
        self.deactivated_at
    }
}
