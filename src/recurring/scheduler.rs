//! # Recurring Task Scheduler
//!
//! Drives registered [`RecurringTask`]s on a tokio timer. Each attempt resolves
//! its settings from a fresh scope seeded with the task's overrides, hands the
//! request to the [`CallbackDispatcher`], and feeds failures to the
//! [`DeactivationPolicy`]. A deactivated task never starts another attempt: the
//! loop re-checks the task state before every dispatch and exits as soon as
//! the deactivation is observed.

use chrono::Utc;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::dispatcher::{CallbackDispatcher, CallbackRequest};
use super::events::DeactivationEvent;
use super::policy::{DeactivationPolicy, RetryBudgetPolicy};
use super::task::{RecurringTask, TaskId};
use crate::config::SettingsResolver;
use crate::logging::log_task_operation;
use crate::request_error::RevaleeRequestError;

struct ScheduledTask {
    task: Arc<RecurringTask>,
    handle: JoinHandle<()>,
}

/// Timing loop owner for recurring tasks
pub struct RecurringTaskScheduler {
    dispatcher: Arc<dyn CallbackDispatcher>,
    resolver: Arc<SettingsResolver>,
    policy: Arc<dyn DeactivationPolicy>,
    tasks: Arc<DashMap<TaskId, ScheduledTask>>,
}

impl RecurringTaskScheduler {
    /// Create a scheduler using the default [`RetryBudgetPolicy`]
    pub fn new(dispatcher: Arc<dyn CallbackDispatcher>, resolver: Arc<SettingsResolver>) -> Self {
        Self {
            dispatcher,
            resolver,
            policy: Arc::new(RetryBudgetPolicy::default()),
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Replace the deactivation policy
    #[must_use]
    pub fn with_policy(mut self, policy: impl DeactivationPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Start scheduling a task
    ///
    /// Must be called from within a tokio runtime. A task that is already
    /// deactivated is returned without being scheduled.
    pub fn register(&self, task: RecurringTask) -> Arc<RecurringTask> {
        let task = Arc::new(task);
        if !task.is_active() {
            debug!(task_id = %task.id(), "Not scheduling deactivated task");
            return task;
        }

        let id = task.id();
        // The entry guard is held while spawning so the loop cannot remove
        // its own entry before it has been inserted.
        self.tasks.entry(id).or_insert_with(|| ScheduledTask {
            task: Arc::clone(&task),
            handle: tokio::spawn(run_task(
                Arc::clone(&task),
                Arc::clone(&self.dispatcher),
                Arc::clone(&self.resolver),
                Arc::clone(&self.policy),
                Arc::clone(&self.tasks),
            )),
        });

        log_task_operation(
            "schedule",
            &id.to_string(),
            task.name(),
            &task.state().to_string(),
            Some(&format!("every {:?}", task.schedule().interval())),
        );
        task
    }

    /// Look up a scheduled task
    pub fn get(&self, id: TaskId) -> Option<Arc<RecurringTask>> {
        self.tasks.get(&id).map(|entry| Arc::clone(&entry.task))
    }

    /// Number of tasks still being scheduled
    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Deactivate a scheduled task from outside its timing loop
    pub fn deactivate(&self, id: TaskId, cause: RevaleeRequestError) -> Option<DeactivationEvent> {
        let task = self.get(id)?;
        task.deactivate(cause)
    }

    /// Stop scheduling a task without deactivating it
    pub fn cancel(&self, id: TaskId) -> bool {
        match self.tasks.remove(&id) {
            Some((_, scheduled)) => {
                scheduled.handle.abort();
                debug!(task_id = %id, "Recurring task cancelled");
                true
            }
            None => false,
        }
    }

    /// Stop every timing loop
    pub fn shutdown(&self) {
        let ids: Vec<TaskId> = self.tasks.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.cancel(id);
        }
        info!("Recurring task scheduler shut down");
    }
}

impl Drop for RecurringTaskScheduler {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.handle.abort();
        }
    }
}

impl fmt::Debug for RecurringTaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurringTaskScheduler")
            .field("policy", &self.policy)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

async fn run_task(
    task: Arc<RecurringTask>,
    dispatcher: Arc<dyn CallbackDispatcher>,
    resolver: Arc<SettingsResolver>,
    policy: Arc<dyn DeactivationPolicy>,
    tasks: Arc<DashMap<TaskId, ScheduledTask>>,
) {
    let schedule = task.schedule();
    let mut ticker = interval_at(Instant::now() + schedule.initial_delay(), schedule.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = task.wait_deactivated() => break,
        }

        if !task.is_active() {
            break;
        }

        match attempt(&task, dispatcher.as_ref(), &resolver).await {
            Ok(callback_id) => {
                consecutive_failures = 0;
                debug!(
                    task_id = %task.id(),
                    callback_id = %callback_id,
                    "Recurring callback scheduled"
                );
            }
            Err(err) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                if policy.should_deactivate(consecutive_failures, &err) {
                    let details = err.to_string();
                    if task.deactivate(err).is_some() {
                        log_task_operation(
                            "deactivate",
                            &task.id().to_string(),
                            task.name(),
                            &task.state().to_string(),
                            Some(&details),
                        );
                    }
                    break;
                }

                warn!(
                    task_id = %task.id(),
                    consecutive_failures,
                    error = %err,
                    "Recurring callback request failed, will retry"
                );
            }
        }
    }

    tasks.remove(&task.id());
    debug!(task_id = %task.id(), "Recurring task loop exited");
}

async fn attempt(
    task: &RecurringTask,
    dispatcher: &dyn CallbackDispatcher,
    resolver: &SettingsResolver,
) -> Result<uuid::Uuid, RevaleeRequestError> {
    let scope = task.overrides().clone();
    let settings = resolver.resolve(&scope);
    let request = CallbackRequest::new(Utc::now(), task.callback_uri().clone()).for_task(task.id());

    match settings.request_timeout.as_duration() {
        Some(limit) => tokio::time::timeout(limit, dispatcher.dispatch(&request, &settings))
            .await
            .unwrap_or_else(|_| {
                Err(RevaleeRequestError::timeout(format!(
                    "Callback request timed out after {}",
                    settings.request_timeout
                ))
                .with_service_base_uri(settings.service_base_uri.clone())
                .with_callback_uri(request.callback_uri.clone()))
            }),
        None => dispatcher.dispatch(&request, &settings).await,
    }
}
