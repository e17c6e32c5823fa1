//! Recurring Task Deactivation Tests
//!
//! Drives tasks through the scheduler with a scripted dispatcher and paused
//! tokio time, checking the one-shot deactivation contract end to end.

mod common;

use common::mock_dispatcher::{Outcome, ScriptedDispatcher};
use common::{resolver, section};
use revalee_client::config::{AppSettings, OperationScope, SettingsResolver};
use revalee_client::recurring::{
    RecurringTask, RecurringTaskScheduler, RetryBudgetPolicy, TaskSchedule, TaskState,
};
use revalee_client::{RequestFailureKind, RevaleeRequestError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const INTERVAL: Duration = Duration::from_secs(60);

fn heartbeat() -> RecurringTask {
    RecurringTask::new(
        "heartbeat",
        Url::parse("https://app.example.com/heartbeat").unwrap(),
        TaskSchedule::every(INTERVAL).unwrap(),
    )
}

fn scheduler_with(dispatcher: Arc<ScriptedDispatcher>) -> RecurringTaskScheduler {
    let resolver = resolver(
        Some(section(Some("section-key"), 0, Some("https://callbacks.example.com"))),
        AppSettings::new(),
    );
    RecurringTaskScheduler::new(dispatcher, Arc::new(resolver))
}

async fn idle_for(intervals: u32) {
    tokio::time::sleep(INTERVAL * intervals).await;
}

#[tokio::test(start_paused = true)]
async fn non_recoverable_failure_deactivates_after_one_attempt() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Fail(
        RequestFailureKind::Unauthorized,
    )));
    let scheduler = scheduler_with(Arc::clone(&dispatcher));

    let task = heartbeat();
    let receiver = task.deactivation().unwrap();
    let task = scheduler.register(task);

    let event = receiver.await.expect("deactivation event");
    assert_eq!(event.task_id(), task.id());
    assert_eq!(event.cause().kind(), RequestFailureKind::Unauthorized);
    assert_eq!(task.state(), TaskState::Deactivated);

    idle_for(10).await;
    assert_eq!(dispatcher.calls(), 1);
    assert_eq!(scheduler.active_task_count(), 0);
    assert!(scheduler.get(task.id()).is_none());
}

#[tokio::test(start_paused = true)]
async fn recoverable_failures_exhaust_retry_budget() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Fail(
        RequestFailureKind::Rejected { status: 503 },
    )));
    let scheduler = scheduler_with(Arc::clone(&dispatcher)).with_policy(RetryBudgetPolicy::new(3));

    let events = Arc::new(AtomicUsize::new(0));
    let task = heartbeat();
    let counter = Arc::clone(&events);
    task.on_deactivated(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let receiver = task.deactivation().unwrap();
    scheduler.register(task);

    receiver.await.expect("deactivation event");
    idle_for(10).await;

    assert_eq!(dispatcher.calls(), 3);
    assert_eq!(events.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn success_resets_consecutive_failures() {
    let transport = Outcome::Fail(RequestFailureKind::Transport);
    let dispatcher = Arc::new(ScriptedDispatcher::new([
        transport,
        transport,
        Outcome::Accept,
        transport,
        transport,
        transport,
    ]));
    let scheduler = scheduler_with(Arc::clone(&dispatcher)).with_policy(RetryBudgetPolicy::new(3));

    let task = heartbeat();
    let receiver = task.deactivation().unwrap();
    scheduler.register(task);

    receiver.await.expect("deactivation event");
    idle_for(10).await;

    assert_eq!(dispatcher.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn failing_observer_does_not_block_others() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Fail(
        RequestFailureKind::InvalidRequest,
    )));
    let scheduler = scheduler_with(Arc::clone(&dispatcher));

    let task = heartbeat();
    task.on_deactivated(|_| Err(anyhow::anyhow!("pager unavailable")));
    task.on_deactivated(|_| panic!("observer bug"));
    let receiver = task.deactivation().unwrap();
    let task = scheduler.register(task);

    let event = receiver.await.expect("later observer still notified");
    assert_eq!(event.task_name(), "heartbeat");
    assert_eq!(task.state(), TaskState::Deactivated);
}

#[tokio::test(start_paused = true)]
async fn external_deactivation_stops_future_attempts() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Accept));
    let scheduler = scheduler_with(Arc::clone(&dispatcher));

    let task = scheduler.register(heartbeat());
    idle_for(2).await;
    let calls_before = dispatcher.calls();
    assert!(calls_before >= 2);

    let event = scheduler
        .deactivate(task.id(), RevaleeRequestError::rejected(410, "endpoint retired"))
        .expect("first deactivation");
    assert_eq!(event.cause().message(), "endpoint retired");

    // Already deactivated: no second event
    assert!(task
        .deactivate(RevaleeRequestError::rejected(410, "endpoint retired"))
        .is_none());

    idle_for(10).await;
    assert_eq!(dispatcher.calls(), calls_before);
    assert_eq!(scheduler.active_task_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn attempts_use_task_overrides_over_section() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Accept));
    let scheduler = scheduler_with(Arc::clone(&dispatcher));

    let mut overrides = OperationScope::new();
    SettingsResolver::set_request_timeout(&mut overrides, Some(2_500)).unwrap();
    SettingsResolver::set_authorization_key(&mut overrides, Some("task-key"));

    let task = scheduler.register(heartbeat().with_overrides(overrides));
    idle_for(1).await;

    let settings = dispatcher.seen_settings();
    assert!(!settings.is_empty());
    assert_eq!(settings[0].authorization_key.as_deref(), Some("task-key"));
    assert_eq!(settings[0].request_timeout.as_raw(), 2_500);
    assert_eq!(
        settings[0].service_base_uri.as_str(),
        "https://callbacks.example.com/"
    );

    let requests = dispatcher.seen_requests();
    assert_eq!(requests[0].task_id, Some(task.id()));
    assert_eq!(requests[0].callback_uri.as_str(), "https://app.example.com/heartbeat");

    scheduler.shutdown();
    assert_eq!(scheduler.active_task_count(), 0);
    assert_eq!(task.state(), TaskState::Active);
}

#[tokio::test(start_paused = true)]
async fn stalled_requests_time_out_and_count_as_failures() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Stall(
        Duration::from_secs(30),
    )));
    let scheduler = scheduler_with(Arc::clone(&dispatcher)).with_policy(RetryBudgetPolicy::new(2));

    let mut overrides = OperationScope::new();
    SettingsResolver::set_request_timeout(&mut overrides, Some(1_000)).unwrap();
    let task = heartbeat().with_overrides(overrides);
    let receiver = task.deactivation().unwrap();
    scheduler.register(task);

    let event = receiver.await.expect("deactivation event");
    assert_eq!(event.cause().kind(), RequestFailureKind::Timeout);
    assert_eq!(dispatcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_without_deactivating() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Accept));
    let scheduler = scheduler_with(Arc::clone(&dispatcher));

    let task = scheduler.register(heartbeat());
    idle_for(1).await;

    assert!(scheduler.cancel(task.id()));
    assert!(!scheduler.cancel(task.id()));
    let calls = dispatcher.calls();

    idle_for(5).await;
    assert_eq!(dispatcher.calls(), calls);
    assert_eq!(task.state(), TaskState::Active);
}

#[tokio::test(start_paused = true)]
async fn deactivated_task_is_not_scheduled() {
    let dispatcher = Arc::new(ScriptedDispatcher::always(Outcome::Accept));
    let scheduler = scheduler_with(Arc::clone(&dispatcher));

    let task = heartbeat();
    task.deactivate(RevaleeRequestError::rejected(401, "revoked"));
    let task = scheduler.register(task);

    idle_for(3).await;
    assert_eq!(dispatcher.calls(), 0);
    assert!(scheduler.get(task.id()).is_none());
}
