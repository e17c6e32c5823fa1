// Recurring task module
//
// Task handles with a one-way Active -> Deactivated lifecycle, the one-shot
// deactivation notification, and a tokio scheduler that drives task attempts
// through a pluggable callback dispatcher.

pub mod dispatcher;
pub mod events;
pub mod policy;
pub mod scheduler;
pub mod states;
pub mod task;

// Re-export main types for convenient access
pub use dispatcher::{CallbackDispatcher, CallbackRequest};
pub use events::DeactivationEvent;
pub use policy::{DeactivationPolicy, RetryBudgetPolicy};
pub use scheduler::RecurringTaskScheduler;
pub use states::TaskState;
pub use task::{DeactivationHandler, RecurringTask, TaskId, TaskSchedule};
