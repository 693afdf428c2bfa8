//! # Flowdeck Triggers
//!
//! Background firing of flows: time-based schedules and folder watchers. The
//! firing decision logic lives in plain state types ([`ScheduleState`],
//! [`FolderWatchState`]) that take the clock or filesystem snapshot as input;
//! the [`TriggerManager`] wraps them in polling threads and persists the
//! trigger set across restarts.

mod error;
mod manager;
mod schedule;
mod watcher;

pub use error::TriggerError;
pub use manager::{TriggerCallback, TriggerFire, TriggerManager};
pub use schedule::{SCHEDULE_POLL, ScheduleState};
pub use watcher::{FolderWatchState, WATCH_POLL};
