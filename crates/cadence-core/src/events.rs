use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::timer::{Reading, TimerMode};

/// Every state change in the engine produces an Event.
/// Observers receive it together with the post-change state snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        /// `None` for the open-ended continuous mode.
        duration_secs: Option<u64>,
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        consumed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        consumed_secs: u64,
        at: DateTime<Utc>,
    },
    Ticked {
        reading: Reading,
        at: DateTime<Utc>,
    },
    /// Interval over. `mode` is the mode that just finished.
    TimerCompleted {
        mode: TimerMode,
        next_mode: Option<TimerMode>,
        completed_work_cycles: u32,
        at: DateTime<Utc>,
    },
    ModeAdvanced {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// A running period ended and should be persisted.
    SessionEnded {
        record: SessionRecord,
    },
    ConfigurationChanged {
        /// `false` when held back until the next reset or mode transition.
        applied: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::Ticked { at, .. }
            | Event::TimerCompleted { at, .. }
            | Event::ModeAdvanced { at, .. }
            | Event::TimerSkipped { at, .. }
            | Event::TimerReset { at, .. }
            | Event::ConfigurationChanged { at, .. } => *at,
            Event::SessionEnded { record } => record.ended_at,
        }
    }
}
