//! Interval clock: pure remaining-time projections.
//!
//! The clock only renders a smooth countdown between authoritative polls.
//! It is never ground truth -- the owner's reported `time_remaining`
//! overwrites any projection on every sync.

use chrono::{DateTime, Duration, Utc};

/// Project the remaining time of an interval.
///
/// `accumulated_pause` is the total time the interval spent paused since
/// `started_at`; paused time does not consume the interval. The result is
/// clamped to `[0, duration]`, so the projection never goes negative and
/// never exceeds the planned length. Never blocks, never fails.
pub fn remaining(
    duration: Duration,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    accumulated_pause: Duration,
) -> Duration {
    let duration = duration.max(Duration::zero());
    let elapsed = (now - started_at - accumulated_pause).max(Duration::zero());
    (duration - elapsed).clamp(Duration::zero(), duration)
}

/// Render whole seconds as `MM:SS` for countdown displays.
///
/// Minutes are not wrapped at an hour: 90 minutes renders as `90:00`.
pub fn format_mm_ss(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{mins:02}:{secs:02}")
}
