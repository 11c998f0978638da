//! Completion notifications for the terminal.

use std::io::Write;

use cadence_core::storage::NotificationsConfig;
use cadence_core::{Event, TimerMode, TimerState};

pub struct Notifier {
    enabled: bool,
    bell: bool,
}

impl Notifier {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            enabled: config.enabled,
            bell: config.bell,
        }
    }

    /// Observer callback: announce finished intervals on stderr.
    pub fn on_event(&self, event: &Event, _state: &TimerState) {
        let Some(message) = self.message_for(event) else {
            return;
        };
        let mut stderr = std::io::stderr().lock();
        if self.bell {
            let _ = write!(stderr, "\x07");
        }
        let _ = writeln!(stderr, "\n{message}");
    }

    fn message_for(&self, event: &Event) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let Event::TimerCompleted { mode, next_mode, .. } = event else {
            return None;
        };
        let message = match (mode, next_mode) {
            (TimerMode::Work, Some(next)) => format!("Work finished. Next: {next}."),
            (_, Some(TimerMode::Work)) => "Break over. Time to focus.".to_string(),
            (mode, _) => format!("{mode} stopped."),
        };
        Some(message)
    }
}
