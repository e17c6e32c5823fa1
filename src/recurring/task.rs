//! # Recurring Task
//!
//! Client-side handle for a repeating schedule of callback requests, and the
//! one-shot deactivation protocol attached to it.
//!
//! A task starts [`TaskState::Active`] and moves to [`TaskState::Deactivated`]
//! at most once. The transition builds a single [`DeactivationEvent`] and hands
//! it synchronously to every registered observer, in registration order. An
//! observer that returns an error or panics is logged and skipped; the rest are
//! still notified. Observers are consumed by the dispatch, so handlers
//! registered afterwards are rejected.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::events::DeactivationEvent;
use super::states::TaskState;
use crate::config::OperationScope;
use crate::error::{Result, RevaleeError};
use crate::request_error::RevaleeRequestError;

/// Observer invoked once with the deactivation event
pub type DeactivationHandler =
    Box<dyn FnOnce(&DeactivationEvent) -> anyhow::Result<()> + Send + 'static>;

/// Unique identifier of a recurring task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// How often a recurring task issues its callback request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    interval: Duration,
    initial_delay: Duration,
}

impl TaskSchedule {
    /// Repeat every `interval`, starting immediately
    pub fn every(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(RevaleeError::out_of_range("interval", 0));
        }
        Ok(Self {
            interval,
            initial_delay: Duration::ZERO,
        })
    }

    /// Delay the first attempt
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }
}

/// Recurring task handle with a one-way `Active -> Deactivated` lifecycle
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use revalee_client::recurring::{RecurringTask, TaskSchedule};
/// use revalee_client::RevaleeRequestError;
///
/// let task = RecurringTask::new(
///     "heartbeat",
///     "https://app.example.com/heartbeat".parse().unwrap(),
///     TaskSchedule::every(Duration::from_secs(60)).unwrap(),
/// );
///
/// task.on_deactivated(|event| {
///     println!("{} stopped: {}", event.task_name(), event.cause());
///     Ok(())
/// });
///
/// assert!(task.deactivate(RevaleeRequestError::rejected(401, "bad key")).is_some());
/// assert!(task.deactivate(RevaleeRequestError::rejected(401, "bad key")).is_none());
/// ```
pub struct RecurringTask {
    id: TaskId,
    name: Arc<str>,
    callback_uri: Url,
    schedule: TaskSchedule,
    overrides: OperationScope,
    state: AtomicU8,
    observers: Mutex<Vec<DeactivationHandler>>,
    deactivated: Notify,
}

impl RecurringTask {
    /// Create an active task
    pub fn new(name: impl Into<Arc<str>>, callback_uri: Url, schedule: TaskSchedule) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            callback_uri,
            schedule,
            overrides: OperationScope::new(),
            state: AtomicU8::new(TaskState::Active as u8),
            observers: Mutex::new(Vec::new()),
            deactivated: Notify::new(),
        }
    }

    /// Scoped setting overrides applied to every attempt of this task
    #[must_use]
    pub fn with_overrides(mut self, overrides: OperationScope) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callback_uri(&self) -> &Url {
        &self.callback_uri
    }

    pub fn schedule(&self) -> TaskSchedule {
        self.schedule
    }

    pub fn overrides(&self) -> &OperationScope {
        &self.overrides
    }

    /// Get current lifecycle state
    pub fn state(&self) -> TaskState {
        TaskState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Number of observers waiting for deactivation
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Register an observer for the deactivation event
    ///
    /// Returns `false` and drops the handler if the task is already
    /// deactivated, since the event has been dispatched.
    pub fn on_deactivated<F>(&self, handler: F) -> bool
    where
        F: FnOnce(&DeactivationEvent) -> anyhow::Result<()> + Send + 'static,
    {
        // State is checked under the observer lock so a concurrent
        // deactivation either sees this handler or rejects it.
        let mut observers = self.observers.lock();
        if self.state().is_terminal() {
            debug!(
                task_id = %self.id,
                task_name = %self.name,
                "Ignoring observer registered after deactivation"
            );
            return false;
        }

        observers.push(Box::new(handler));
        true
    }

    /// Single-fire view of the deactivation event
    ///
    /// Returns `None` if the task is already deactivated.
    pub fn deactivation(&self) -> Option<oneshot::Receiver<DeactivationEvent>> {
        let (sender, receiver) = oneshot::channel();
        let registered = self.on_deactivated(move |event| {
            // A dropped receiver means nobody is waiting anymore
            let _ = sender.send(event.clone());
            Ok(())
        });

        registered.then_some(receiver)
    }

    /// Wait until the task is deactivated
    pub async fn wait_deactivated(&self) {
        let notified = self.deactivated.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.state().is_terminal() {
            return;
        }
        notified.await;
    }

    /// Transition to `Deactivated` and notify every observer
    ///
    /// Only the first call performs the transition and returns the event it
    /// dispatched; later calls return `None` and notify nobody.
    pub fn deactivate(&self, cause: RevaleeRequestError) -> Option<DeactivationEvent> {
        let transitioned = self
            .state
            .compare_exchange(
                TaskState::Active as u8,
                TaskState::Deactivated as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if !transitioned {
            debug!(
                task_id = %self.id,
                error = %cause,
                "Task already deactivated, discarding cause"
            );
            return None;
        }

        let event = DeactivationEvent::new(self.id, Arc::clone(&self.name), cause);
        let observers = std::mem::take(&mut *self.observers.lock());

        warn!(
            task_id = %self.id,
            task_name = %self.name,
            error = %event.cause(),
            observers = observers.len(),
            "🛑 Recurring task deactivated"
        );

        self.dispatch(&event, observers);
        self.deactivated.notify_waiters();

        Some(event)
    }

    fn dispatch(&self, event: &DeactivationEvent, observers: Vec<DeactivationHandler>) {
        for (index, handler) in observers.into_iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(observer_error)) => {
                    warn!(
                        task_id = %self.id,
                        observer = index,
                        error = %observer_error,
                        "Deactivation observer failed"
                    );
                }
                Err(_) => {
                    error!(
                        task_id = %self.id,
                        observer = index,
                        "Deactivation observer panicked"
                    );
                }
            }
        }

        info!(task_id = %self.id, "Deactivation dispatch complete");
    }
}

impl fmt::Debug for RecurringTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurringTask")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("callback_uri", &self.callback_uri.as_str())
            .field("schedule", &self.schedule)
            .field("state", &self.state())
            .field("observers", &self.observer_count())
            .finish()
    }
}
