//! Timer state as reported by the session owner, plus the records and
//! display projections derived from it.
//!
//! Field names follow the owner's wire format: the engine mirrors what the
//! backend emits and never invents fields of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authoritative timer state, owned by the session owner and mirrored
/// locally. The local copy is overwritten wholesale on every sync -- it is
/// never merged and never mutated field-by-field.
///
/// Invariants (enforced by the owner, checked here only for display):
/// `0 <= time_remaining <= duration`; `is_paused` implies `is_running`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_running: bool,
    pub is_paused: bool,
    /// Total length of the current interval, in seconds.
    pub duration: i64,
    /// Seconds left; non-increasing while running, constant while paused.
    pub time_remaining: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl TimerState {
    /// The null state: what the owner reports after stop or completion ack.
    pub fn cleared() -> Self {
        Self {
            is_running: false,
            is_paused: false,
            duration: 0,
            time_remaining: 0,
            task_id: None,
            started_at: None,
        }
    }

    /// A session exists (running or paused).
    pub fn is_active(&self) -> bool {
        self.is_running
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::cleared()
    }
}

/// A completed focus interval, persisted by the session owner exactly once
/// per completion. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,
    /// Planned interval length in seconds.
    pub duration_secs: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// What the presentation layer renders, recomputed at display cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    pub remaining_seconds: i64,
    pub is_running: bool,
    pub is_paused: bool,
    /// 0.0 .. 100.0 progress through the current interval.
    pub progress_pct: f64,
}

impl DisplayState {
    pub fn idle() -> Self {
        Self {
            remaining_seconds: 0,
            is_running: false,
            is_paused: false,
            progress_pct: 0.0,
        }
    }
}

/// Progress through an interval as a percentage, saturating at 100.
pub(crate) fn progress_pct(duration: i64, remaining: i64) -> f64 {
    if duration <= 0 {
        return 0.0;
    }
    let consumed = (duration - remaining).max(0) as f64;
    (consumed / duration as f64 * 100.0).min(100.0)
}
