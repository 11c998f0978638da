use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    Work,
    ShortBreak,
    LongBreak,
    Continuous,
}

impl TimerMode {
    pub fn is_break(self) -> bool {
        matches!(self, TimerMode::ShortBreak | TimerMode::LongBreak)
    }

    /// Work and the two breaks count down; Continuous counts up.
    pub fn counts_down(self) -> bool {
        self != TimerMode::Continuous
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
            TimerMode::Continuous => "continuous",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Work",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
            TimerMode::Continuous => "Continuous",
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(TimerMode::Work),
            "short_break" => Ok(TimerMode::ShortBreak),
            "long_break" => Ok(TimerMode::LongBreak),
            "continuous" => Ok(TimerMode::Continuous),
            other => Err(format!("unknown timer mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    /// Interval finished; a signal for the UI until the next `start()`.
    Completed,
}

/// The one time figure that is meaningful for the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Reading {
    Remaining { secs: u64 },
    Elapsed { secs: u64 },
}

/// Snapshot of the engine, handed to observers after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub reading: Reading,
    /// Work intervals finished since the last long break.
    pub completed_work_cycles: u32,
    pub linked_task_id: Option<String>,
    /// Start of the current running stretch; unset while paused, idle or completed.
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds consumed before the current pause.
    pub paused_accumulated_secs: u64,
}

impl TimerState {
    pub fn remaining_secs(&self) -> Option<u64> {
        match self.reading {
            Reading::Remaining { secs } => Some(secs),
            Reading::Elapsed { .. } => None,
        }
    }

    pub fn elapsed_secs(&self) -> Option<u64> {
        match self.reading {
            Reading::Elapsed { secs } => Some(secs),
            Reading::Remaining { .. } => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, TimerStatus::Running | TimerStatus::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip_through_from_str() {
        for mode in [
            TimerMode::Work,
            TimerMode::ShortBreak,
            TimerMode::LongBreak,
            TimerMode::Continuous,
        ] {
            assert_eq!(mode.as_str().parse::<TimerMode>().unwrap(), mode);
        }
    }

    #[test]
    fn reading_serializes_with_kind_tag() {
        let json = serde_json::to_value(Reading::Remaining { secs: 12 }).unwrap();
        assert_eq!(json["kind"], "remaining");
        assert_eq!(json["secs"], 12);
    }

    #[test]
    fn only_matching_reading_is_exposed() {
        let state = TimerState {
            mode: TimerMode::Continuous,
            status: TimerStatus::Running,
            reading: Reading::Elapsed { secs: 42 },
            completed_work_cycles: 0,
            linked_task_id: None,
            started_at: None,
            paused_accumulated_secs: 0,
        };
        assert_eq!(state.elapsed_secs(), Some(42));
        assert_eq!(state.remaining_secs(), None);
    }
}
