use chrono::Utc;
use clap::Subcommand;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

use timekeep_core::error::{CoreError, OwnerError};
use timekeep_core::timer::clock;
use timekeep_core::{Config, Event, HttpSessionOwner, NoopEffects, SessionEngine, SystemEffects};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session
    Start {
        /// Session length in minutes
        #[arg(long, default_value_t = 25)]
        minutes: i64,
        /// Task to associate with the session
        #[arg(long)]
        task: Option<i64>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop the session without completing it
    Stop,
    /// Print the current timer state as JSON
    Status,
    /// Follow the countdown and run the completion bundle when it ends
    Watch,
}

fn engine(
    config: &Config,
    effects: Arc<dyn timekeep_core::CompletionEffects>,
) -> Result<SessionEngine, Box<dyn std::error::Error>> {
    let owner = Arc::new(HttpSessionOwner::from_config(&config.owner)?);
    Ok(SessionEngine::new(owner, effects))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        TimerAction::Start { minutes, task } => {
            let mut engine = engine(&config, Arc::new(NoopEffects))?;
            let event = engine.start(minutes * 60, task, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Pause => {
            let mut engine = engine(&config, Arc::new(NoopEffects))?;
            let event = engine.pause(Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Resume => {
            let mut engine = engine(&config, Arc::new(NoopEffects))?;
            let event = engine.resume(Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Stop => {
            let mut engine = engine(&config, Arc::new(NoopEffects))?;
            let event = engine.stop(Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        TimerAction::Status => {
            let mut engine = engine(&config, Arc::new(NoopEffects))?;
            engine.refresh(Utc::now())?;
            let snapshot = engine.snapshot(Utc::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        TimerAction::Watch => watch(&config)?,
    }

    Ok(())
}

/// The 1 Hz poll loop: keyed off wall-clock time, not any render cycle.
/// Completion side effects run here, so `watch` is the process that holds
/// the sound/lock/notice responsibilities while it is in the foreground.
fn watch(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let effects = Arc::new(SystemEffects::from_config(&config.notifications));
    let mut engine = engine(config, effects)?;

    engine.refresh(Utc::now())?;
    if !engine.mirror().is_active() {
        println!("no active session");
        return Ok(());
    }

    let cadence = std::time::Duration::from_millis(config.poll.cadence_ms.max(100));
    loop {
        match engine.tick(Utc::now()) {
            Ok(Some(event)) => {
                println!();
                println!("{}", serde_json::to_string_pretty(&event)?);
                if matches!(event, Event::TimerCompleted { .. } | Event::TimerStopped { .. }) {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(CoreError::Owner(OwnerError::Unreachable(message))) => {
                // Transient: keep the last known state and retry next tick.
                warn!(%message, "sync failed");
            }
            Err(e) => {
                println!();
                return Err(e.into());
            }
        }

        if !engine.mirror().is_active() {
            println!();
            return Ok(());
        }

        let display = engine.display_state(Utc::now());
        print!(
            "\r{} {}   ",
            clock::format_mm_ss(display.remaining_seconds),
            if display.is_paused { "(paused)" } else { "" }
        );
        std::io::stdout().flush()?;
        std::thread::sleep(cadence);
    }
}
