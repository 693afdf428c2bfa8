//! Progress notifications emitted by the interpreter.
//!
//! The interpreter publishes discrete events through the [`RunObserver`]
//! seam and knows nothing about its subscriber; hosts attach an editor, a
//! console printer, or a channel consumer without touching the run loop.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use flowdeck_types::{ActionDef, ActionResult};

/// One discrete progress notification.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A step is about to be dispatched.
    StepStarted {
        /// Zero-based position in the action list.
        index: usize,
        /// Raw step definition.
        action: ActionDef,
    },
    /// A step finished (executed, skipped, or handled as a conditional).
    StepCompleted {
        /// Zero-based position in the action list.
        index: usize,
        /// Raw step definition.
        action: ActionDef,
        /// Structured outcome.
        result: ActionResult,
    },
    /// The run ended, normally or early.
    FlowCompleted {
        /// True only if every recorded result is SUCCESS or SKIPPED.
        success: bool,
        /// Location of the per-run log file.
        log_path: PathBuf,
    },
    /// One formatted, timestamped run-log line.
    LogLine(String),
}

/// Subscriber seam for progress notifications.
pub trait RunObserver: Send + Sync {
    /// Receives each event as the run progresses. Called on the interpreter's
    /// thread; implementations should hand off quickly.
    fn on_event(&self, event: &RunEvent);
}

/// Observer that discards every event.
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_event(&self, _event: &RunEvent) {}
}

/// Observer that forwards cloned events over an `mpsc` channel.
///
/// A disconnected receiver is tolerated silently so a departing consumer can
/// never fail a run.
pub struct ChannelObserver {
    sender: Sender<RunEvent>,
}

impl ChannelObserver {
    /// Wraps a channel sender.
    pub fn new(sender: Sender<RunEvent>) -> Self {
        Self { sender }
    }
}

impl RunObserver for ChannelObserver {
    fn on_event(&self, event: &RunEvent) {
        let _ = self.sender.send(event.clone());
    }
}
