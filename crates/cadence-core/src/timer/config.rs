use serde::{Deserialize, Serialize};

use super::state::TimerMode;
use crate::error::ConfigError;

/// Which family of modes the engine starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultMode {
    Pomodoro,
    Continuous,
}

impl DefaultMode {
    /// The mode an idle engine sits in for this family.
    pub fn initial_mode(self) -> TimerMode {
        match self {
            DefaultMode::Pomodoro => TimerMode::Work,
            DefaultMode::Continuous => TimerMode::Continuous,
        }
    }
}

impl std::str::FromStr for DefaultMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pomodoro" => Ok(DefaultMode::Pomodoro),
            "continuous" => Ok(DefaultMode::Continuous),
            other => Err(ConfigError::invalid(
                "default_mode",
                format!("expected 'pomodoro' or 'continuous', got '{other}'"),
            )),
        }
    }
}

/// Durations and auto-start behaviour for one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfiguration {
    pub work_duration_secs: u64,
    pub short_break_duration_secs: u64,
    pub long_break_duration_secs: u64,
    pub cycles_before_long_break: u32,
    pub default_mode: DefaultMode,
    pub auto_start_breaks: bool,
    pub auto_start_next_work: bool,
}

impl Default for TimerConfiguration {
    fn default() -> Self {
        Self {
            work_duration_secs: 25 * 60,
            short_break_duration_secs: 5 * 60,
            long_break_duration_secs: 15 * 60,
            cycles_before_long_break: 4,
            default_mode: DefaultMode::Pomodoro,
            auto_start_breaks: false,
            auto_start_next_work: false,
        }
    }
}

impl TimerConfiguration {
    /// Reject zero durations and a zero cycle count.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("work_duration_secs", self.work_duration_secs),
            ("short_break_duration_secs", self.short_break_duration_secs),
            ("long_break_duration_secs", self.long_break_duration_secs),
        ];
        for (key, secs) in durations {
            if secs == 0 {
                return Err(ConfigError::invalid(key, "must be greater than zero"));
            }
        }
        if self.cycles_before_long_break < 1 {
            return Err(ConfigError::invalid(
                "cycles_before_long_break",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Target duration for `mode`, or `None` for the open-ended stopwatch.
    pub fn duration_secs(&self, mode: TimerMode) -> Option<u64> {
        match mode {
            TimerMode::Work => Some(self.work_duration_secs),
            TimerMode::ShortBreak => Some(self.short_break_duration_secs),
            TimerMode::LongBreak => Some(self.long_break_duration_secs),
            TimerMode::Continuous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TimerConfiguration::default().validate().is_ok());
    }

    #[test]
    fn zero_duration_is_rejected() {
        let cfg = TimerConfiguration {
            short_break_duration_secs: 0,
            ..TimerConfiguration::default()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "short_break_duration_secs")
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn zero_cycles_is_rejected() {
        let cfg = TimerConfiguration {
            cycles_before_long_break: 0,
            ..TimerConfiguration::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn continuous_has_no_duration() {
        let cfg = TimerConfiguration::default();
        assert_eq!(cfg.duration_secs(TimerMode::Continuous), None);
        assert_eq!(cfg.duration_secs(TimerMode::LongBreak), Some(900));
    }

    #[test]
    fn default_mode_parses_case_insensitively() {
        assert_eq!("Continuous".parse::<DefaultMode>().unwrap(), DefaultMode::Continuous);
        assert!("stopwatch".parse::<DefaultMode>().is_err());
    }
}
