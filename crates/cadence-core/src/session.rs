//! Session records and the persistence seam.
//!
//! The engine never writes to storage itself. It emits
//! [`Event::SessionEnded`] and the host wires a [`persistence_observer`]
//! over whichever [`SessionStore`] it uses.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::events::Event;
use crate::timer::{TimerMode, TimerState};

/// How a running period ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Countdown reached zero.
    Completed,
    /// Cut short with `skip()`.
    Skipped,
    /// Continuous stopwatch stopped by hand.
    Stopped,
    /// Discarded with `reset()` or a mode switch.
    Abandoned,
}

impl SessionOutcome {
    pub fn counts_as_completed(self) -> bool {
        matches!(self, SessionOutcome::Completed | SessionOutcome::Stopped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionOutcome::Completed => "completed",
            SessionOutcome::Skipped => "skipped",
            SessionOutcome::Stopped => "stopped",
            SessionOutcome::Abandoned => "abandoned",
        }
    }
}

impl std::str::FromStr for SessionOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SessionOutcome::Completed),
            "skipped" => Ok(SessionOutcome::Skipped),
            "stopped" => Ok(SessionOutcome::Stopped),
            "abandoned" => Ok(SessionOutcome::Abandoned),
            other => Err(format!("unknown session outcome: {other}")),
        }
    }
}

/// One finished or abandoned running period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub kind: TimerMode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Time actually consumed, pauses excluded.
    pub duration_secs: u64,
    pub task_id: Option<String>,
    pub completed: bool,
    pub outcome: SessionOutcome,
}

/// A record together with the id its store assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: i64,
    #[serde(flatten)]
    pub record: SessionRecord,
}

pub trait SessionStore {
    /// Persist `record`, returning its id.
    fn record(&mut self, record: &SessionRecord) -> Result<i64>;

    /// Most recent sessions first.
    fn recent(&self, limit: usize) -> Result<Vec<StoredSession>>;
}

/// In-memory store used by tests and by hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Vec<StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> &[StoredSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn record(&mut self, record: &SessionRecord) -> Result<i64> {
        let id = self.sessions.len() as i64 + 1;
        self.sessions.push(StoredSession {
            id,
            record: record.clone(),
        });
        Ok(id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredSession>> {
        Ok(self.sessions.iter().rev().take(limit).cloned().collect())
    }
}

/// Observer that writes every ended session to `store`.
///
/// Storage failures are logged and dropped; observers have no caller to
/// report to.
pub fn persistence_observer<S>(store: Rc<RefCell<S>>) -> impl FnMut(&Event, &TimerState) + 'static
where
    S: SessionStore + 'static,
{
    move |event, _state| {
        let Event::SessionEnded { record } = event else {
            return;
        };
        if let Err(e) = store.borrow_mut().record(record) {
            warn!(error = %e, kind = %record.kind, "failed to persist session");
        }
    }
}
