//! Water reminder scheduler.
//!
//! Independent of the focus-session state machine: it runs whether or not
//! a session is active. Firing is measured in wall-clock time elapsed since
//! the last firing, so a changed interval applies at the next check without
//! resetting progress, and enable/disable toggles do not restart the cycle.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

/// Interval choices offered by the settings UI, in minutes.
pub const PRESET_INTERVALS_MIN: [u32; 3] = [30, 60, 90];

/// Bounds for the custom interval override, in minutes (one minute to one
/// day).
pub const CUSTOM_INTERVAL_MIN: u32 = 1;
pub const CUSTOM_INTERVAL_MAX: u32 = 1440;

/// Water reminder configuration, held by the reminder subsystem owner and
/// mirrored here. Wire field names match the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub enabled: bool,
    /// Preset period between firings, in minutes.
    #[serde(default = "default_interval_mins")]
    pub interval_mins: u32,
    /// Custom override; wins over the preset when set and within bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval_mins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reminder: Option<DateTime<Utc>>,
}

fn default_interval_mins() -> u32 {
    60
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_mins: default_interval_mins(),
            custom_interval_mins: None,
            last_reminder: None,
        }
    }
}

impl ReminderConfig {
    /// Check the configured intervals against their bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_mins == 0 {
            return Err(ValidationError::InvalidValue {
                field: "interval_mins".into(),
                message: "interval must be positive".into(),
            });
        }
        if let Some(custom) = self.custom_interval_mins {
            if !(CUSTOM_INTERVAL_MIN..=CUSTOM_INTERVAL_MAX).contains(&custom) {
                return Err(ValidationError::OutOfRange {
                    field: "custom_interval_mins".into(),
                    value: custom as i64,
                    min: CUSTOM_INTERVAL_MIN as i64,
                    max: CUSTOM_INTERVAL_MAX as i64,
                });
            }
        }
        Ok(())
    }

    /// The period actually used: the custom override when present and in
    /// bounds, otherwise the preset.
    pub fn effective_interval_mins(&self) -> u32 {
        match self.custom_interval_mins {
            Some(custom) if (CUSTOM_INTERVAL_MIN..=CUSTOM_INTERVAL_MAX).contains(&custom) => custom,
            _ => self.interval_mins,
        }
    }
}

/// Caller-driven reminder scheduler.
///
/// Like the timer engine, it has no internal thread: the host calls
/// `tick()` periodically and reacts to the returned event (raise the
/// notice, persist `last_reminder` through the store).
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    config: ReminderConfig,
    last_fired: Option<DateTime<Utc>>,
}

impl ReminderScheduler {
    pub fn new(config: ReminderConfig) -> Self {
        let last_fired = config.last_reminder;
        Self { config, last_fired }
    }

    pub fn config(&self) -> &ReminderConfig {
        &self.config
    }

    /// Replace the configuration. Elapsed progress toward the next firing
    /// is kept: a changed interval applies at the next check, and toggling
    /// enabled off and back on does not restart the cycle.
    pub fn update_config(
        &mut self,
        config: ReminderConfig,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        config.validate()?;
        let enabling = config.enabled && !self.config.enabled;
        self.config = config;
        if enabling && self.last_fired.is_none() {
            // First enable ever: measure from enable time.
            self.last_fired = Some(now);
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool, now: DateTime<Utc>) {
        let mut config = self.config.clone();
        config.enabled = enabled;
        // Only the flag changes; the config was already valid.
        let _ = self.update_config(config, now);
    }

    /// Check whether a reminder is due. Fires at most once per call; the
    /// next cycle is measured from this firing.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.config.enabled {
            return None;
        }
        let interval = Duration::minutes(self.config.effective_interval_mins() as i64);
        match self.last_fired {
            None => {
                // Never fired and enabled before construction: seed now.
                self.last_fired = Some(now);
                None
            }
            Some(last) if now - last >= interval => {
                self.last_fired = Some(now);
                self.config.last_reminder = Some(now);
                Some(Event::ReminderFired { at: now })
            }
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(mins: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + mins * 60, 0).unwrap()
    }

    fn enabled_config(interval_mins: u32) -> ReminderConfig {
        ReminderConfig {
            enabled: true,
            interval_mins,
            ..ReminderConfig::default()
        }
    }

    #[test]
    fn custom_interval_bounds() {
        let mut config = ReminderConfig::default();

        config.custom_interval_mins = Some(0);
        assert!(config.validate().is_err());

        config.custom_interval_mins = Some(1441);
        assert!(config.validate().is_err());

        config.custom_interval_mins = Some(1);
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_interval_mins(), 1);

        config.custom_interval_mins = Some(1440);
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_interval_mins(), 1440);
    }

    #[test]
    fn custom_interval_overrides_preset() {
        let mut config = enabled_config(60);
        assert_eq!(config.effective_interval_mins(), 60);
        config.custom_interval_mins = Some(45);
        assert_eq!(config.effective_interval_mins(), 45);
    }

    #[test]
    fn fires_once_per_interval() {
        let mut scheduler = ReminderScheduler::new(ReminderConfig {
            last_reminder: Some(at(0)),
            ..enabled_config(60)
        });

        assert!(scheduler.tick(at(30)).is_none());
        assert!(scheduler.tick(at(59)).is_none());
        assert!(scheduler.tick(at(60)).is_some());
        // Next cycle measured from the firing.
        assert!(scheduler.tick(at(61)).is_none());
        assert!(scheduler.tick(at(120)).is_some());
    }

    #[test]
    fn toggles_do_not_reset_elapsed_progress() {
        let mut scheduler = ReminderScheduler::new(ReminderConfig {
            last_reminder: Some(at(0)),
            ..enabled_config(60)
        });

        assert!(scheduler.tick(at(20)).is_none());
        scheduler.set_enabled(false, at(25));
        assert!(scheduler.tick(at(40)).is_none()); // disabled: no firing
        scheduler.set_enabled(true, at(45));

        // Net-enabled for the whole hour: exactly one firing at the mark.
        assert!(scheduler.tick(at(59)).is_none());
        assert!(scheduler.tick(at(60)).is_some());
    }

    #[test]
    fn disabling_stops_future_firings() {
        let mut scheduler = ReminderScheduler::new(ReminderConfig {
            last_reminder: Some(at(0)),
            ..enabled_config(60)
        });
        scheduler.set_enabled(false, at(10));
        assert!(scheduler.tick(at(200)).is_none());
    }

    #[test]
    fn first_enable_measures_from_enable_time() {
        let mut scheduler = ReminderScheduler::new(ReminderConfig::default());
        scheduler.set_enabled(true, at(100));

        assert!(scheduler.tick(at(100)).is_none());
        assert!(scheduler.tick(at(159)).is_none());
        assert!(scheduler.tick(at(160)).is_some());
    }

    #[test]
    fn interval_change_applies_to_current_cycle() {
        let mut scheduler = ReminderScheduler::new(ReminderConfig {
            last_reminder: Some(at(0)),
            ..enabled_config(60)
        });
        assert!(scheduler.tick(at(30)).is_none());

        let mut config = scheduler.config().clone();
        config.custom_interval_mins = Some(40);
        scheduler.update_config(config, at(35)).unwrap();

        // 40 minutes since the last firing have already elapsed.
        assert!(scheduler.tick(at(40)).is_some());
    }

    proptest! {
        #[test]
        fn validate_accepts_exactly_the_custom_range(custom in 0u32..3000) {
            let config = ReminderConfig {
                custom_interval_mins: Some(custom),
                ..ReminderConfig::default()
            };
            let in_range = (CUSTOM_INTERVAL_MIN..=CUSTOM_INTERVAL_MAX).contains(&custom);
            prop_assert_eq!(config.validate().is_ok(), in_range);
        }

        #[test]
        fn effective_interval_is_always_positive_and_bounded(
            preset in 1u32..=1440,
            custom in proptest::option::of(0u32..3000),
        ) {
            let config = ReminderConfig {
                interval_mins: preset,
                custom_interval_mins: custom,
                ..ReminderConfig::default()
            };
            let effective = config.effective_interval_mins();
            prop_assert!(effective >= 1);
            prop_assert!(effective <= 1440);
        }
    }
}
