//! Session engine: the client-side coordinator for a timer owned elsewhere.
//!
//! The engine does not advance time itself -- the session owner does. The
//! caller drives `tick()` on a wall-clock cadence (once per second while a
//! session is active); between ticks the interval clock projects a smooth
//! countdown from the last authoritative sync.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Completing -> Idle
//!            |           |
//!            +-- stop ---+---------------> Idle   (no side effects)
//! ```
//!
//! Completion is observed through two non-exclusive paths: a push signal
//! from the owner and `time_remaining` reaching zero on a sync. The
//! per-interval `completion_handled` flag makes the side-effect bundle
//! (persist record, sound, screen lock, notice) run exactly once; it is
//! cleared only on the next `Idle -> Running` transition.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock;
use super::state::{progress_pct, DisplayState, TimerState};
use super::synchronizer::StateSynchronizer;
use crate::effects::CompletionEffects;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::owner::{CompletionSignalHandle, SessionOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePhase {
    Idle,
    Running,
    Paused,
    Completing,
}

/// Local bookkeeping for the interval currently mirrored from the owner.
/// Owner-owned fields live in the mirror; this only records what the
/// completion bundle will need.
#[derive(Debug, Clone)]
struct ActiveInterval {
    id: Uuid,
    duration_secs: i64,
    task_id: Option<i64>,
}

impl ActiveInterval {
    fn from_mirror(mirror: &TimerState) -> Self {
        Self {
            id: Uuid::new_v4(),
            duration_secs: mirror.duration,
            task_id: mirror.task_id,
        }
    }
}

pub struct SessionEngine {
    synchronizer: StateSynchronizer,
    effects: Arc<dyn CompletionEffects>,
    signals: Option<CompletionSignalHandle>,
    phase: EnginePhase,
    interval: Option<ActiveInterval>,
    completion_handled: bool,
}

impl SessionEngine {
    pub fn new(owner: Arc<dyn SessionOwner>, effects: Arc<dyn CompletionEffects>) -> Self {
        let signals = owner.subscribe_completions();
        Self {
            synchronizer: StateSynchronizer::new(owner),
            effects,
            signals,
            phase: EnginePhase::Idle,
            interval: None,
            completion_handled: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// The local mirror of the owner's state; may be stale between syncs.
    pub fn mirror(&self) -> &TimerState {
        self.synchronizer.mirror()
    }

    /// What the presentation layer should render right now. The remaining
    /// time is projected from the last sync while running; the projection
    /// is never written back to the mirror.
    pub fn display_state(&self, now: DateTime<Utc>) -> DisplayState {
        let mirror = self.synchronizer.mirror();
        if !mirror.is_active() {
            return DisplayState::idle();
        }
        let remaining = if mirror.is_paused {
            mirror.time_remaining
        } else {
            let synced_at = self.synchronizer.last_synced_at().unwrap_or(now);
            clock::remaining(
                Duration::seconds(mirror.time_remaining),
                synced_at,
                now,
                Duration::zero(),
            )
            .num_seconds()
        };
        DisplayState {
            remaining_seconds: remaining,
            is_running: true,
            is_paused: mirror.is_paused,
            progress_pct: progress_pct(mirror.duration, remaining),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            display: self.display_state(now),
            at: Utc::now(),
        }
    }

    // ── Actions ──────────────────────────────────────────────────────
    //
    // Each action is forwarded to the owner first; the follow-up sync is
    // issued only after the owner acknowledged, so the fetched state
    // reflects the action's effect.

    pub fn start(
        &mut self,
        duration_secs: i64,
        task_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Event, CoreError> {
        if duration_secs <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration_secs".into(),
                message: "duration must be positive".into(),
            }
            .into());
        }
        self.synchronizer.owner().start_session(duration_secs, task_id)?;
        self.synchronizer.sync(now)?;
        self.reconcile(now)?;
        let mirror = self.synchronizer.mirror();
        Ok(Event::TimerStarted {
            duration_secs: mirror.duration,
            task_id: mirror.task_id,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<Event, CoreError> {
        self.synchronizer.owner().pause_session()?;
        self.synchronizer.sync(now)?;
        self.reconcile(now)?;
        Ok(Event::TimerPaused {
            remaining_secs: self.synchronizer.mirror().time_remaining,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Event, CoreError> {
        self.synchronizer.owner().resume_session()?;
        self.synchronizer.sync(now)?;
        self.reconcile(now)?;
        Ok(Event::TimerResumed {
            remaining_secs: self.synchronizer.mirror().time_remaining,
            at: Utc::now(),
        })
    }

    /// Stop without completing. No side effects fire, now or when the
    /// owner's zeroed state is observed later.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Event, CoreError> {
        self.synchronizer.owner().stop_session()?;
        // Drop the interval before syncing: the owner zeroes remaining time
        // on stop, and a zero observed with no active interval is inert.
        self.interval = None;
        self.phase = EnginePhase::Idle;
        self.synchronizer.sync(now)?;
        Ok(Event::TimerStopped { at: Utc::now() })
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// Periodic tick while a session is active. Polls the owner, applies
    /// the fetched state, and runs the completion bundle when the interval
    /// is observed finished. Does nothing while idle -- no needless
    /// backend calls.
    ///
    /// A sync failure is returned once per failing tick; the mirror keeps
    /// its last known value and the next tick retries.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<Option<Event>, CoreError> {
        // Push path first: the signal may arrive between polls.
        let signaled = self.signals.as_ref().and_then(|h| h.drain()).is_some();
        if signaled && !self.completion_handled {
            debug!("completion signal received");
            if let Some(interval) = self.interval.take() {
                return self.complete(interval, now).map(Some);
            }
        }
        if self.interval.is_none() {
            return Ok(None);
        }
        self.synchronizer.sync(now)?;
        self.reconcile(now)
    }

    /// Unconditional re-sync, for a view becoming active again (or a fresh
    /// process). Adopts an already-running session instead of trusting
    /// stale local state.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<Option<Event>, CoreError> {
        self.synchronizer.sync(now)?;
        self.reconcile(now)
    }

    /// Apply the mirror to the local phase and detect transitions.
    fn reconcile(&mut self, now: DateTime<Utc>) -> Result<Option<Event>, CoreError> {
        let mirror = self.synchronizer.mirror().clone();
        if mirror.is_active() {
            if self.interval.is_none() {
                // Idle -> Running: new interval, fresh completion flag.
                let interval = ActiveInterval::from_mirror(&mirror);
                debug!(interval_id = %interval.id, duration_secs = interval.duration_secs, "interval active");
                self.interval = Some(interval);
                self.completion_handled = false;
            }
            self.phase = if mirror.is_paused {
                EnginePhase::Paused
            } else {
                EnginePhase::Running
            };
            return Ok(None);
        }

        // The owner nulls its state entirely on stop, while a finished
        // interval keeps its duration until the completion is acknowledged.
        // That difference is what separates the two zero-remaining cases.
        match self.interval.take() {
            Some(interval)
                if mirror.duration > 0
                    && mirror.time_remaining <= 0
                    && !self.completion_handled =>
            {
                // Poll path: the owner finished the interval.
                self.complete(interval, now).map(Some)
            }
            Some(_) => {
                // Stopped from elsewhere; no completion side effects.
                self.phase = EnginePhase::Idle;
                Ok(Some(Event::TimerStopped { at: Utc::now() }))
            }
            None => {
                self.phase = EnginePhase::Idle;
                Ok(None)
            }
        }
    }

    /// The one-time completion bundle. Persist first; sound, screen lock
    /// and notice are independent best-effort attempts. Always settles in
    /// `Idle`, even when persistence failed (at-most-once, no retry).
    fn complete(&mut self, interval: ActiveInterval, now: DateTime<Utc>) -> Result<Event, CoreError> {
        self.phase = EnginePhase::Completing;
        self.completion_handled = true;
        info!(interval_id = %interval.id, duration_secs = interval.duration_secs, "focus interval completed");

        let persisted = self
            .synchronizer
            .owner()
            .complete_session(interval.duration_secs, interval.task_id);

        if persisted.is_ok() {
            if let Err(e) = self.effects.play_sound() {
                warn!(error = %e, "completion sound failed");
            }
            if let Err(e) = self.effects.lock_screen() {
                warn!(error = %e, "screen lock failed");
            }
            if let Err(e) = self
                .effects
                .show_notice("Focus complete", "Focus session complete. Time for a break!")
            {
                warn!(error = %e, "completion notice failed");
            }
        }

        if let Err(e) = self.synchronizer.sync(now) {
            warn!(error = %e, "post-completion sync failed");
        }
        self.phase = EnginePhase::Idle;

        match persisted {
            Ok(session) => Ok(Event::TimerCompleted {
                session,
                at: Utc::now(),
            }),
            Err(e) => Err(CoreError::Persistence(e)),
        }
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("phase", &self.phase)
            .field("completion_handled", &self.completion_handled)
            .field("mirror", self.synchronizer.mirror())
            .finish_non_exhaustive()
    }
}
