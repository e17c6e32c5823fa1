use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use revalee_client::config::CallbackSettings;
use revalee_client::recurring::{CallbackDispatcher, CallbackRequest};
use revalee_client::{RequestFailureKind, RevaleeRequestError};

/// Outcome of a single scripted dispatch
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Accept,
    Fail(RequestFailureKind),
    /// Sleep before accepting, to exercise request timeouts
    Stall(Duration),
}

/// Dispatcher replaying a script of outcomes; the last outcome repeats forever
#[derive(Debug)]
pub struct ScriptedDispatcher {
    script: Mutex<VecDeque<Outcome>>,
    last: Mutex<Outcome>,
    calls: AtomicUsize,
    seen_settings: Mutex<Vec<CallbackSettings>>,
    seen_requests: Mutex<Vec<CallbackRequest>>,
}

impl ScriptedDispatcher {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> Self {
        let script: VecDeque<Outcome> = script.into_iter().collect();
        let last = script.back().copied().unwrap_or(Outcome::Accept);
        Self {
            script: Mutex::new(script),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            seen_settings: Mutex::new(Vec::new()),
            seen_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: Outcome) -> Self {
        Self::new([outcome])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_settings(&self) -> Vec<CallbackSettings> {
        self.seen_settings.lock().clone()
    }

    pub fn seen_requests(&self) -> Vec<CallbackRequest> {
        self.seen_requests.lock().clone()
    }

    fn next_outcome(&self) -> Outcome {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| *self.last.lock())
    }
}

#[async_trait]
impl CallbackDispatcher for ScriptedDispatcher {
    async fn dispatch(
        &self,
        request: &CallbackRequest,
        settings: &CallbackSettings,
    ) -> Result<Uuid, RevaleeRequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_settings.lock().push(settings.clone());
        self.seen_requests.lock().push(request.clone());

        match self.next_outcome() {
            Outcome::Accept => Ok(Uuid::new_v4()),
            Outcome::Fail(kind) => Err(RevaleeRequestError::new(kind, "scripted failure")
                .with_service_base_uri(settings.service_base_uri.clone())
                .with_callback_uri(request.callback_uri.clone())),
            Outcome::Stall(duration) => {
                tokio::time::sleep(duration).await;
                Ok(Uuid::new_v4())
            }
        }
    }
}
