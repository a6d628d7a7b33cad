use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{DisplayState, EnginePhase, FocusSession};

/// Every state change in the engine produces an Event.
/// The presentation layer polls for events; hosts render or relay them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        duration_secs: i64,
        task_id: Option<i64>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: i64,
        at: DateTime<Utc>,
    },
    /// Session ended without completing -- no side effects fire.
    TimerStopped {
        at: DateTime<Utc>,
    },
    /// Interval finished and the completion bundle ran; carries the
    /// persisted record.
    TimerCompleted {
        session: FocusSession,
        at: DateTime<Utc>,
    },
    /// Water reminder interval elapsed.
    ReminderFired {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: EnginePhase,
        display: DisplayState,
        at: DateTime<Utc>,
    },
}
