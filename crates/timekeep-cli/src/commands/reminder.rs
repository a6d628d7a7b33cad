use chrono::Utc;
use clap::Subcommand;
use tracing::warn;

use timekeep_core::reminder::PRESET_INTERVALS_MIN;
use timekeep_core::{
    CompletionEffects, Config, HttpSessionOwner, ReminderScheduler, ReminderStore, SystemEffects,
};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Turn the water reminder on
    Enable,
    /// Turn the water reminder off
    Disable,
    /// Set the reminder interval
    SetInterval {
        /// Interval in minutes
        minutes: u32,
        /// Store as a custom interval instead of a preset
        #[arg(long)]
        custom: bool,
    },
    /// Print the current reminder settings as JSON
    Status,
    /// Run the reminder cycle in the foreground
    Watch,
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = HttpSessionOwner::from_config(&config.owner)?;

    match action {
        ReminderAction::Enable => {
            let mut reminder = store.reminder_config()?;
            reminder.enabled = true;
            reminder.validate()?;
            store.save_reminder_config(&reminder)?;
            println!("water reminder enabled ({} min)", reminder.effective_interval_mins());
        }
        ReminderAction::Disable => {
            let mut reminder = store.reminder_config()?;
            reminder.enabled = false;
            store.save_reminder_config(&reminder)?;
            println!("water reminder disabled");
        }
        ReminderAction::SetInterval { minutes, custom } => {
            let mut reminder = store.reminder_config()?;
            if custom {
                reminder.custom_interval_mins = Some(minutes);
            } else {
                if !PRESET_INTERVALS_MIN.contains(&minutes) {
                    return Err(format!(
                        "{minutes} is not a preset interval (presets: {PRESET_INTERVALS_MIN:?}); \
                         pass --custom for arbitrary values"
                    )
                    .into());
                }
                reminder.interval_mins = minutes;
                reminder.custom_interval_mins = None;
            }
            reminder.validate()?;
            store.save_reminder_config(&reminder)?;
            println!(
                "reminder interval set to {} minutes",
                reminder.effective_interval_mins()
            );
        }
        ReminderAction::Status => {
            let reminder = store.reminder_config()?;
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::Watch => {
            let effects = SystemEffects::from_config(&config.notifications);
            let mut scheduler = ReminderScheduler::new(store.reminder_config()?);
            if !scheduler.config().enabled {
                println!("water reminder is disabled");
                return Ok(());
            }
            println!(
                "watching: one reminder every {} minutes",
                scheduler.config().effective_interval_mins()
            );
            loop {
                if let Some(event) = scheduler.tick(Utc::now()) {
                    if let Err(e) = effects.show_notice("Water Reminder", "It's time to drink water!")
                    {
                        warn!(error = %e, "water notice failed");
                    }
                    // Best-effort: the firing time is kept locally either way.
                    if let Err(e) = store.save_reminder_config(scheduler.config()) {
                        warn!(error = %e, "failed to persist last reminder time");
                    }
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                std::thread::sleep(std::time::Duration::from_secs(1));
            }
        }
    }

    Ok(())
}
