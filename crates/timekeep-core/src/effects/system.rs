//! Platform side effects via external commands.
//!
//! Mirrors what the desktop app shells out to on each OS: session lock
//! through the platform lock command, notices through the native
//! notification tool, sound through a locally available player.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::NotificationsConfig;

/// Command-backed [`CompletionEffects`](super::CompletionEffects)
/// implementation.
pub struct SystemEffects {
    sound_enabled: bool,
    custom_sound: Option<PathBuf>,
    lock_enabled: bool,
}

impl SystemEffects {
    pub fn new(sound_enabled: bool, custom_sound: Option<PathBuf>, lock_enabled: bool) -> Self {
        Self {
            sound_enabled,
            custom_sound,
            lock_enabled,
        }
    }

    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self::new(
            config.sound_enabled,
            config.custom_sound.as_ref().map(PathBuf::from),
            config.lock_screen_on_complete,
        )
    }

    fn run(command: Option<Command>) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut command) = command else {
            // Nothing to do on this platform.
            return Ok(());
        };
        let status = command.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("command exited with {status}").into())
        }
    }
}

impl super::CompletionEffects for SystemEffects {
    fn play_sound(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.sound_enabled {
            return Ok(());
        }
        let Some(path) = &self.custom_sound else {
            // No sound file configured; the notice still fires.
            return Ok(());
        };
        Self::run(sound_command(path))
    }

    fn lock_screen(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.lock_enabled {
            return Ok(());
        }
        Self::run(lock_command())
    }

    fn show_notice(&self, title: &str, message: &str) -> Result<(), Box<dyn std::error::Error>> {
        Self::run(notice_command(title, message))
    }
}

#[cfg(target_os = "linux")]
fn sound_command(path: &Path) -> Option<Command> {
    let mut cmd = Command::new("paplay");
    cmd.arg(path);
    Some(cmd)
}

#[cfg(target_os = "macos")]
fn sound_command(path: &Path) -> Option<Command> {
    let mut cmd = Command::new("afplay");
    cmd.arg(path);
    Some(cmd)
}

#[cfg(target_os = "windows")]
fn sound_command(path: &Path) -> Option<Command> {
    let mut cmd = Command::new("powershell");
    cmd.arg("-NoProfile").arg("-Command").arg(format!(
        "(New-Object Media.SoundPlayer '{}').PlaySync()",
        path.display()
    ));
    Some(cmd)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn sound_command(_path: &Path) -> Option<Command> {
    None
}

#[cfg(target_os = "windows")]
fn lock_command() -> Option<Command> {
    let mut cmd = Command::new("rundll32.exe");
    cmd.arg("user32.dll,LockWorkStation");
    Some(cmd)
}

#[cfg(target_os = "linux")]
fn lock_command() -> Option<Command> {
    // Desktop environments differ; try the common lockers in order.
    let mut cmd = Command::new("bash");
    cmd.args([
        "-c",
        "if command -v gnome-screensaver-command >/dev/null 2>&1; then \
           gnome-screensaver-command --lock; \
         elif command -v loginctl >/dev/null 2>&1; then \
           loginctl lock-session; \
         elif command -v xdg-screensaver >/dev/null 2>&1; then \
           xdg-screensaver lock; \
         else \
           exit 1; \
         fi",
    ]);
    Some(cmd)
}

#[cfg(target_os = "macos")]
fn lock_command() -> Option<Command> {
    let mut cmd = Command::new("pmset");
    cmd.arg("displaysleepnow");
    Some(cmd)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn lock_command() -> Option<Command> {
    None
}

#[cfg(target_os = "linux")]
fn notice_command(title: &str, message: &str) -> Option<Command> {
    let mut cmd = Command::new("notify-send");
    cmd.args([title, message]);
    Some(cmd)
}

#[cfg(target_os = "macos")]
fn notice_command(title: &str, message: &str) -> Option<Command> {
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(format!(
        "display notification \"{}\" with title \"{}\"",
        message.replace('"', "'"),
        title.replace('"', "'")
    ));
    Some(cmd)
}

#[cfg(target_os = "windows")]
fn notice_command(title: &str, message: &str) -> Option<Command> {
    let mut cmd = Command::new("msg");
    cmd.arg("*").arg(format!("{title}: {message}"));
    Some(cmd)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn notice_command(_title: &str, _message: &str) -> Option<Command> {
    None
}
