//! # Timekeep Core Library
//!
//! Client engine for a focus-session timer that is owned and advanced by a
//! separate process (the *session owner*). The library keeps a consistent
//! local view of that timer, coordinates the one-time completion bundle,
//! and schedules the independent water reminder. The CLI binary is a thin
//! host over this library.
//!
//! ## Architecture
//!
//! - **Session Engine**: a caller-driven state machine; the host invokes
//!   `tick()` on a wall-clock cadence while a session is active
//! - **Synchronizer**: polls the owner and mirrors its state wholesale
//!   (the owner always wins; the mirror is never merged or mutated locally)
//! - **Interval Clock**: pure remaining-time projections between polls
//! - **Reminder Scheduler**: drift-free wall-clock firing, independent of
//!   the focus state machine
//! - **Owner contract**: injected [`SessionOwner`] / [`ReminderStore`]
//!   traits with an HTTP binding
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: completion coordination and display projections
//! - [`HttpSessionOwner`]: reqwest client for a remote owner
//! - [`ReminderScheduler`]: water reminder cycle
//! - [`Config`]: application configuration management

pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod owner;
pub mod reminder;
pub mod timer;

pub use config::Config;
pub use effects::{CompletionEffects, NoopEffects, SystemEffects};
pub use error::{ConfigError, CoreError, OwnerError, ValidationError};
pub use events::Event;
pub use owner::{
    CompletionSignal, CompletionSignalHandle, HttpSessionOwner, ReminderStore, SessionOwner,
};
pub use reminder::{ReminderConfig, ReminderScheduler};
pub use timer::{DisplayState, EnginePhase, FocusSession, SessionEngine, TimerState};
