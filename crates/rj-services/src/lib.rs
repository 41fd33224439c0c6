//! rusty-journal/crates/rj-services/src/lib.rs
//!
//! Stateful coordinators built on the `rj-core` ports: connectivity, the
//! local draft slot, streak bookkeeping, saving with retries, reconnection
//! and reminders.

pub mod cleanup;
pub mod connectivity;
pub mod draft;
pub mod orchestrator;
pub mod reconcile;
pub mod scheduler;
pub mod streak_service;

pub use cleanup::TextCleaner;
pub use connectivity::ConnectivityMonitor;
pub use draft::LocalDraftStore;
pub use orchestrator::{RetryPolicy, SaveOrchestrator, SaveOutcome, SavedEntry};
pub use reconcile::{describe_age, ReconcileOutcome, ReconciliationFlow, SyncDecision, SyncPrompt};
pub use scheduler::{ReminderScheduler, ReminderSink, TimerRegistry};
pub use streak_service::StreakService;
