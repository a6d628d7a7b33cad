//! The session-owner contract.
//!
//! The owner is the external authority that holds true timer state and
//! advances it on its own clock. The engine only ever holds a read-only
//! mirror, obtained through this trait. Injecting the trait keeps the
//! engine testable against a fake owner.

pub mod http;

use chrono::{DateTime, Utc};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::error::OwnerError;
use crate::reminder::ReminderConfig;
use crate::timer::{FocusSession, TimerState};

pub use http::HttpSessionOwner;

/// One completion notification, delivered at most once per finished
/// interval. Delivery is not guaranteed exclusive with the polling path;
/// the engine deduplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSignal {
    pub at: DateTime<Utc>,
}

/// Receiving end of the owner's completion-signal channel.
///
/// Dropping the handle cancels the subscription -- the owner side observes
/// a closed channel and stops delivering. A view that comes back later must
/// re-sync state rather than rely on signals it missed.
pub struct CompletionSignalHandle {
    rx: Receiver<CompletionSignal>,
}

impl CompletionSignalHandle {
    /// Create a connected (sender, handle) pair.
    pub fn channel() -> (Sender<CompletionSignal>, Self) {
        let (tx, rx) = channel();
        (tx, Self { rx })
    }

    /// Non-blocking receive of the next pending signal.
    pub fn try_recv(&self) -> Option<CompletionSignal> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending signals, returning the last one.
    ///
    /// Duplicates collapse here; the engine's per-interval flag handles the
    /// rest.
    pub fn drain(&self) -> Option<CompletionSignal> {
        let mut last = None;
        while let Some(signal) = self.try_recv() {
            last = Some(signal);
        }
        last
    }
}

impl std::fmt::Debug for CompletionSignalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSignalHandle").finish_non_exhaustive()
    }
}

/// Remote authority for the focus-session timer.
///
/// All methods are a single request/response round trip. Mutating calls
/// return once the owner has acknowledged the action, so a state fetch
/// issued afterwards observes the action's effect.
pub trait SessionOwner: Send + Sync {
    /// Begin a new interval. Rejected if a session is already active.
    fn start_session(&self, duration_secs: i64, task_id: Option<i64>) -> Result<(), OwnerError>;

    /// Pause the active interval; remaining time stops decreasing.
    fn pause_session(&self) -> Result<(), OwnerError>;

    /// Resume a paused interval.
    fn resume_session(&self) -> Result<(), OwnerError>;

    /// End the active interval without completing it.
    fn stop_session(&self) -> Result<(), OwnerError>;

    /// Fetch the owner's current timer state.
    fn session_state(&self) -> Result<TimerState, OwnerError>;

    /// Persist the record for a finished interval and return it.
    fn complete_session(
        &self,
        duration_secs: i64,
        task_id: Option<i64>,
    ) -> Result<FocusSession, OwnerError>;

    /// Subscribe to push completion signals, if this owner can deliver
    /// them. Owners without a push channel return `None`; the engine then
    /// relies on the zero-remaining polling path alone.
    fn subscribe_completions(&self) -> Option<CompletionSignalHandle> {
        None
    }

    /// Cheap connectivity probe.
    fn ping(&self) -> Result<(), OwnerError> {
        self.session_state().map(|_| ())
    }
}

/// Holder of the water-reminder configuration.
///
/// The original app keeps these settings next to the session owner; the
/// engine reads and writes them through this seam.
pub trait ReminderStore: Send + Sync {
    fn reminder_config(&self) -> Result<ReminderConfig, OwnerError>;
    fn save_reminder_config(&self, config: &ReminderConfig) -> Result<(), OwnerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_collapses_duplicates() {
        let (tx, handle) = CompletionSignalHandle::channel();
        let first = CompletionSignal { at: Utc::now() };
        let second = CompletionSignal { at: Utc::now() };
        tx.send(first).unwrap();
        tx.send(second).unwrap();
        assert_eq!(handle.drain(), Some(second));
        assert_eq!(handle.drain(), None);
    }

    #[test]
    fn dropping_handle_cancels_subscription() {
        let (tx, handle) = CompletionSignalHandle::channel();
        drop(handle);
        assert!(tx.send(CompletionSignal { at: Utc::now() }).is_err());
    }
}
