//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Ended timer sessions (completed, skipped, stopped, abandoned)
//! - Session statistics (daily and all-time)

use std::path::Path;

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, Result};
use crate::session::{SessionOutcome, SessionRecord, SessionStore, StoredSession};
use crate::timer::TimerMode;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    /// Completed work intervals.
    pub work_sessions: u64,
    pub total_work_secs: u64,
    pub total_break_secs: u64,
    pub total_continuous_secs: u64,
    pub today_sessions: u64,
    pub today_work_secs: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("cadence.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                kind          TEXT NOT NULL,
                started_at    TEXT NOT NULL,
                ended_at      TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                task_id       TEXT,
                completed     INTEGER NOT NULL,
                outcome       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_kind ON sessions(kind);
            CREATE INDEX IF NOT EXISTS idx_sessions_task_id ON sessions(task_id);",
        )?;
        Ok(())
    }

    /// Insert a session record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_session(&self, record: &SessionRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (kind, started_at, ended_at, duration_secs, task_id, completed, outcome)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.kind.as_str(),
                timestamp(record.started_at),
                timestamp(record.ended_at),
                record.duration_secs,
                record.task_id,
                record.completed,
                record.outcome.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<StoredSession>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_sessions(
            "SELECT id, kind, started_at, ended_at, duration_secs, task_id, completed, outcome
             FROM sessions ORDER BY ended_at DESC, id DESC LIMIT ?1",
            params![limit],
        )
    }

    /// All sessions attributed to `task_id`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn sessions_for_task(&self, task_id: &str) -> Result<Vec<StoredSession>> {
        self.query_sessions(
            "SELECT id, kind, started_at, ended_at, duration_secs, task_id, completed, outcome
             FROM sessions WHERE task_id = ?1 ORDER BY ended_at ASC, id ASC",
            params![task_id],
        )
    }

    pub fn stats_today(&self) -> Result<Stats> {
        self.stats_since(start_of_day(Utc::now()))
    }

    /// Statistics for sessions ending at or after `since`.
    pub fn stats_since(&self, since: DateTime<Utc>) -> Result<Stats> {
        let rows = self.aggregate(Some(since))?;
        let mut stats = fold_stats(&rows);
        stats.today_sessions = stats.total_sessions;
        stats.today_work_secs = stats.total_work_secs;
        Ok(stats)
    }

    pub fn stats_all(&self) -> Result<Stats> {
        let mut stats = fold_stats(&self.aggregate(None)?);
        let today = fold_stats(&self.aggregate(Some(start_of_day(Utc::now())))?);
        stats.today_sessions = today.total_sessions;
        stats.today_work_secs = today.total_work_secs;
        Ok(stats)
    }

    /// Per (kind, completed) count and duration sum.
    fn aggregate(&self, since: Option<DateTime<Utc>>) -> Result<Vec<(String, bool, u64, u64)>> {
        let since = since.map(timestamp).unwrap_or_default();
        let mut stmt = self.conn.prepare(
            "SELECT kind, completed, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             WHERE ended_at >= ?1
             GROUP BY kind, completed",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn query_sessions(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<StoredSession>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(RawSession {
                id: row.get(0)?,
                kind: row.get(1)?,
                started_at: row.get(2)?,
                ended_at: row.get(3)?,
                duration_secs: row.get(4)?,
                task_id: row.get(5)?,
                completed: row.get(6)?,
                outcome: row.get(7)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.decode()?);
        }
        Ok(sessions)
    }
}

impl SessionStore for Database {
    fn record(&mut self, record: &SessionRecord) -> Result<i64> {
        self.insert_session(record)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredSession>> {
        self.recent_sessions(limit)
    }
}

struct RawSession {
    id: i64,
    kind: String,
    started_at: String,
    ended_at: String,
    duration_secs: u64,
    task_id: Option<String>,
    completed: bool,
    outcome: String,
}

impl RawSession {
    fn decode(self) -> Result<StoredSession> {
        let id = self.id;
        let corrupt = |message: String| CoreError::from(DatabaseError::CorruptRow { id, message });
        let parse_time = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| corrupt(format!("bad timestamp '{s}': {e}")))
        };
        Ok(StoredSession {
            id,
            record: SessionRecord {
                kind: self.kind.parse::<TimerMode>().map_err(corrupt)?,
                started_at: parse_time(&self.started_at)?,
                ended_at: parse_time(&self.ended_at)?,
                duration_secs: self.duration_secs,
                task_id: self.task_id,
                completed: self.completed,
                outcome: self.outcome.parse::<SessionOutcome>().map_err(corrupt)?,
            },
        })
    }
}

fn fold_stats(rows: &[(String, bool, u64, u64)]) -> Stats {
    let mut stats = Stats::default();
    for (kind, completed, count, secs) in rows {
        stats.total_sessions += count;
        if *completed {
            stats.completed_sessions += count;
        }
        match kind.parse::<TimerMode>() {
            Ok(TimerMode::Work) => {
                stats.total_work_secs += secs;
                if *completed {
                    stats.work_sessions += count;
                }
            }
            Ok(TimerMode::ShortBreak | TimerMode::LongBreak) => stats.total_break_secs += secs,
            Ok(TimerMode::Continuous) => stats.total_continuous_secs += secs,
            Err(_) => {}
        }
    }
    stats
}

/// Fixed-width UTC timestamps so string comparison orders correctly.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
