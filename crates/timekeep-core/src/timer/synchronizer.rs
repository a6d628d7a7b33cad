//! Session state synchronizer.
//!
//! Keeps a local copy of [`TimerState`] eventually consistent with the
//! remote owner. The owner always wins: a successful fetch replaces the
//! mirror unconditionally, and a failed fetch leaves it untouched until the
//! next scheduled attempt.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::error::OwnerError;
use crate::owner::SessionOwner;
use crate::timer::TimerState;

pub struct StateSynchronizer {
    owner: Arc<dyn SessionOwner>,
    mirror: TimerState,
    last_synced_at: Option<DateTime<Utc>>,
}

impl StateSynchronizer {
    pub fn new(owner: Arc<dyn SessionOwner>) -> Self {
        Self {
            owner,
            mirror: TimerState::cleared(),
            last_synced_at: None,
        }
    }

    /// Fetch the owner's state and overwrite the mirror (last-write-wins).
    ///
    /// On error the mirror and `last_synced_at` are left unchanged; the
    /// caller reports the failure once and retries on its next tick.
    pub fn sync(&mut self, now: DateTime<Utc>) -> Result<&TimerState, OwnerError> {
        let state = self.owner.session_state()?;
        debug!(
            is_running = state.is_running,
            is_paused = state.is_paused,
            time_remaining = state.time_remaining,
            "synced timer state"
        );
        self.mirror = state;
        self.last_synced_at = Some(now);
        Ok(&self.mirror)
    }

    /// The current local mirror; may be stale between syncs.
    pub fn mirror(&self) -> &TimerState {
        &self.mirror
    }

    /// When the mirror was last confirmed against the owner.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    pub fn owner(&self) -> &Arc<dyn SessionOwner> {
        &self.owner
    }
}

impl std::fmt::Debug for StateSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSynchronizer")
            .field("mirror", &self.mirror)
            .field("last_synced_at", &self.last_synced_at)
            .finish_non_exhaustive()
    }
}
