//! Transport seam used by the scheduler to deliver callback requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::task::TaskId;
use crate::config::CallbackSettings;
use crate::request_error::RevaleeRequestError;

/// Request asking the dispatch service to call `callback_uri` at `callback_time`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub task_id: Option<TaskId>,
    pub callback_time: DateTime<Utc>,
    pub callback_uri: Url,
}

impl CallbackRequest {
    pub fn new(callback_time: DateTime<Utc>, callback_uri: Url) -> Self {
        Self {
            task_id: None,
            callback_time,
            callback_uri,
        }
    }

    /// Tag the request with the recurring task that issued it
    #[must_use]
    pub fn for_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

/// Delivers callback requests to the dispatch service
///
/// Implementations own the HTTP transport. They receive settings already
/// resolved for the current operation and report delivery failures as
/// [`RevaleeRequestError`].
#[async_trait]
pub trait CallbackDispatcher: Send + Sync {
    /// Schedule a callback, returning the identifier assigned by the service
    async fn dispatch(
        &self,
        request: &CallbackRequest,
        settings: &CallbackSettings,
    ) -> Result<Uuid, RevaleeRequestError>;
}
