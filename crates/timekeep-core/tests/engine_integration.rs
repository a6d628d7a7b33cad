//! Integration tests for the session engine against a scripted owner.
//!
//! The fake owner mimics the real backend: it holds the authoritative
//! timer state, advances it when told, rejects double starts, and can be
//! made to fail fetches or persistence to exercise the error paths.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use timekeep_core::effects::CompletionEffects;
use timekeep_core::error::{CoreError, OwnerError};
use timekeep_core::owner::{CompletionSignal, CompletionSignalHandle, SessionOwner};
use timekeep_core::timer::{EnginePhase, FocusSession, SessionEngine, TimerState};
use timekeep_core::Event;

#[derive(Default)]
struct FakeOwnerInner {
    state: TimerState,
    completed: Vec<FocusSession>,
    signal_tx: Option<Sender<CompletionSignal>>,
    fail_state_fetches: usize,
    fail_next_complete: bool,
    next_session_id: i64,
}

/// In-process stand-in for the remote session owner.
struct FakeOwner {
    inner: Mutex<FakeOwnerInner>,
}

impl FakeOwner {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FakeOwnerInner {
                next_session_id: 1,
                ..FakeOwnerInner::default()
            }),
        })
    }

    /// Advance the owner's internal clock by `secs` of running time.
    /// Remaining time only decreases while running and not paused; at zero
    /// the owner marks the session finished, as the real backend does.
    fn advance(&self, secs: i64) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state.is_running && !inner.state.is_paused {
            inner.state.time_remaining = (inner.state.time_remaining - secs).max(0);
            if inner.state.time_remaining == 0 {
                inner.state.is_running = false;
                inner.state.is_paused = false;
            }
        }
    }

    /// Run the interval to its end, emitting the push signal if there is a
    /// live subscription.
    fn finish_interval(&self) {
        let remaining = self.inner.lock().unwrap().state.time_remaining;
        self.advance(remaining);
        self.send_signal();
    }

    fn send_signal(&self) {
        let inner = self.inner.lock().unwrap();
        if let Some(tx) = &inner.signal_tx {
            let _ = tx.send(CompletionSignal { at: Utc::now() });
        }
    }

    fn fail_state_fetches(&self, count: usize) {
        self.inner.lock().unwrap().fail_state_fetches = count;
    }

    fn fail_next_complete(&self) {
        self.inner.lock().unwrap().fail_next_complete = true;
    }

    fn completed_sessions(&self) -> Vec<FocusSession> {
        self.inner.lock().unwrap().completed.clone()
    }
}

impl SessionOwner for FakeOwner {
    fn start_session(&self, duration_secs: i64, task_id: Option<i64>) -> Result<(), OwnerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state.is_running {
            return Err(OwnerError::Rejected("session already running".into()));
        }
        inner.state = TimerState {
            is_running: true,
            is_paused: false,
            duration: duration_secs,
            time_remaining: duration_secs,
            task_id,
            started_at: Some(Utc::now()),
        };
        Ok(())
    }

    fn pause_session(&self) -> Result<(), OwnerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state.is_running {
            inner.state.is_paused = true;
        }
        Ok(())
    }

    fn resume_session(&self) -> Result<(), OwnerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state.is_running {
            inner.state.is_paused = false;
        }
        Ok(())
    }

    fn stop_session(&self) -> Result<(), OwnerError> {
        self.inner.lock().unwrap().state = TimerState::cleared();
        Ok(())
    }

    fn session_state(&self) -> Result<TimerState, OwnerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_state_fetches > 0 {
            inner.fail_state_fetches -= 1;
            return Err(OwnerError::Unreachable("connection refused".into()));
        }
        Ok(inner.state.clone())
    }

    fn complete_session(
        &self,
        duration_secs: i64,
        task_id: Option<i64>,
    ) -> Result<FocusSession, OwnerError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_complete {
            inner.fail_next_complete = false;
            return Err(OwnerError::Unreachable("database is locked".into()));
        }
        let now = Utc::now();
        let session = FocusSession {
            id: inner.next_session_id,
            task_id,
            duration_secs,
            started_at: now - Duration::seconds(duration_secs),
            completed_at: now,
        };
        inner.next_session_id += 1;
        inner.completed.push(session.clone());
        inner.state = TimerState::cleared();
        Ok(session)
    }

    fn subscribe_completions(&self) -> Option<CompletionSignalHandle> {
        let (tx, handle) = CompletionSignalHandle::channel();
        self.inner.lock().unwrap().signal_tx = Some(tx);
        Some(handle)
    }
}

/// Records side-effect invocations instead of touching the system.
#[derive(Default)]
struct RecordingEffects {
    sounds: AtomicUsize,
    locks: AtomicUsize,
    notices: Mutex<Vec<String>>,
}

impl RecordingEffects {
    fn notice_count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

impl CompletionEffects for RecordingEffects {
    fn play_sound(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.sounds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn lock_screen(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.locks.fetch_add(1, Ordering::SeqCst);
        // Screen lock failing must not block anything downstream.
        Err("no display".into())
    }

    fn show_notice(&self, _title: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.notices.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn harness() -> (Arc<FakeOwner>, Arc<RecordingEffects>, SessionEngine) {
    let owner = FakeOwner::new();
    let effects = Arc::new(RecordingEffects::default());
    let engine = SessionEngine::new(owner.clone(), effects.clone());
    (owner, effects, engine)
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[test]
fn start_then_stop_creates_no_session() {
    let (owner, effects, mut engine) = harness();

    for duration in [1, 60, 1500] {
        engine.start(duration, None, now()).unwrap();
        engine.stop(now()).unwrap();
        assert!(!engine.mirror().is_running);
        assert_eq!(engine.phase(), EnginePhase::Idle);
    }

    assert!(owner.completed_sessions().is_empty());
    assert_eq!(effects.notice_count(), 0);
}

#[test]
fn remaining_decreases_only_while_unpaused() {
    let (owner, _effects, mut engine) = harness();
    engine.start(600, None, now()).unwrap();

    owner.advance(10);
    engine.tick(now()).unwrap();
    assert_eq!(engine.mirror().time_remaining, 590);

    engine.pause(now()).unwrap();
    owner.advance(120);
    engine.tick(now()).unwrap();
    // Constant while paused.
    assert_eq!(engine.mirror().time_remaining, 590);
    assert_eq!(engine.phase(), EnginePhase::Paused);

    engine.resume(now()).unwrap();
    owner.advance(5);
    engine.tick(now()).unwrap();
    assert_eq!(engine.mirror().time_remaining, 585);
}

#[test]
fn completion_via_poll_path() {
    let (owner, effects, mut engine) = harness();
    engine.start(1500, Some(9), now()).unwrap();

    // Owner reports zero remaining on the next poll.
    owner.advance(1500);
    let event = engine.tick(now()).unwrap().expect("completion event");

    match event {
        Event::TimerCompleted { session, .. } => {
            assert_eq!(session.duration_secs, 1500);
            assert_eq!(session.task_id, Some(9));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(engine.phase(), EnginePhase::Idle);

    let sessions = owner.completed_sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].duration_secs, 1500);
    assert_eq!(effects.notice_count(), 1);
    assert_eq!(effects.sounds.load(Ordering::SeqCst), 1);
}

#[test]
fn duplicate_signals_complete_exactly_once() {
    let (owner, effects, mut engine) = harness();
    engine.start(300, None, now()).unwrap();

    owner.finish_interval();
    owner.send_signal(); // duplicate push delivery

    let first = engine.tick(now()).unwrap();
    assert!(matches!(first, Some(Event::TimerCompleted { .. })));

    // Both signals were drained together; later ticks find no active
    // interval and stay quiet.
    for _ in 0..3 {
        assert!(engine.tick(now()).unwrap().is_none());
    }

    assert_eq!(owner.completed_sessions().len(), 1);
    assert_eq!(effects.notice_count(), 1);
}

#[test]
fn push_and_poll_paths_are_not_exclusive() {
    let (owner, effects, mut engine) = harness();

    // Poll-only owner round first.
    engine.start(120, None, now()).unwrap();
    owner.advance(120);
    engine.tick(now()).unwrap();
    assert_eq!(owner.completed_sessions().len(), 1);

    // Push round second; the flag was cleared by the new start.
    engine.start(120, None, now()).unwrap();
    owner.finish_interval();
    engine.tick(now()).unwrap();

    assert_eq!(owner.completed_sessions().len(), 2);
    assert_eq!(effects.notice_count(), 2);
}

#[test]
fn sync_failures_leave_mirror_at_last_known_value() {
    let (owner, _effects, mut engine) = harness();
    engine.start(900, None, now()).unwrap();

    owner.advance(15);
    engine.tick(now()).unwrap();
    assert_eq!(engine.mirror().time_remaining, 885);

    owner.fail_state_fetches(3);
    for _ in 0..3 {
        let err = engine.tick(now()).unwrap_err();
        assert!(matches!(err, CoreError::Owner(OwnerError::Unreachable(_))));
        // No reset to zero or idle.
        assert_eq!(engine.mirror().time_remaining, 885);
        assert!(engine.mirror().is_running);
    }

    // Next poll recovers.
    owner.advance(5);
    engine.tick(now()).unwrap();
    assert_eq!(engine.mirror().time_remaining, 880);
}

#[test]
fn persistence_failure_surfaces_and_settles_idle() {
    let (owner, effects, mut engine) = harness();
    engine.start(600, None, now()).unwrap();

    owner.fail_next_complete();
    owner.advance(600);
    let err = engine.tick(now()).unwrap_err();
    assert!(matches!(err, CoreError::Persistence(_)));

    // The record is lost, not retried; the engine is usable again.
    assert_eq!(engine.phase(), EnginePhase::Idle);
    assert!(owner.completed_sessions().is_empty());
    assert!(engine.tick(now()).unwrap().is_none());
    assert_eq!(effects.notice_count(), 0);

    engine.start(300, None, now()).unwrap();
    assert_eq!(engine.phase(), EnginePhase::Running);
}

#[test]
fn external_stop_fires_no_side_effects() {
    let (owner, effects, mut engine) = harness();
    engine.start(600, None, now()).unwrap();

    // Stopped from outside the engine (e.g. the tray) with time left.
    owner.advance(10);
    owner.stop_session().unwrap();
    let event = engine.tick(now()).unwrap();

    assert!(matches!(event, Some(Event::TimerStopped { .. })));
    assert_eq!(engine.phase(), EnginePhase::Idle);
    assert!(owner.completed_sessions().is_empty());
    assert_eq!(effects.notice_count(), 0);
}

#[test]
fn best_effort_lock_failure_does_not_block_bundle() {
    let (owner, effects, mut engine) = harness();
    engine.start(60, None, now()).unwrap();

    owner.advance(60);
    engine.tick(now()).unwrap();

    // RecordingEffects fails lock_screen; sound and notice still ran and
    // the session record was persisted.
    assert_eq!(effects.locks.load(Ordering::SeqCst), 1);
    assert_eq!(effects.sounds.load(Ordering::SeqCst), 1);
    assert_eq!(effects.notice_count(), 1);
    assert_eq!(owner.completed_sessions().len(), 1);
}
