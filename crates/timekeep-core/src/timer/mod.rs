pub mod clock;
mod engine;
mod state;
mod synchronizer;

pub use engine::{EnginePhase, SessionEngine};
pub use state::{DisplayState, FocusSession, TimerState};
pub use synchronizer::StateSynchronizer;
