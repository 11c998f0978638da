//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads or timers - the caller is responsible for calling
//! `tick()` periodically. Progress is always recomputed from the stored
//! start timestamp, so late or missing ticks never cause drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |            |
//!           +--> Completed --start()--> Running (next mode)
//! ```
//!
//! Work completes into a short or long break, breaks complete into work.
//! Continuous mode never completes on its own.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfiguration::default())?;
//! engine.subscribe(|event, state| println!("{event:?} -> {:?}", state.status));
//! engine.start(None);
//! // In a loop:
//! engine.tick(Utc::now());
//! ```

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::config::{DefaultMode, TimerConfiguration};
use super::observer::{Observers, SubscriptionId};
use super::state::{Reading, TimerMode, TimerState, TimerStatus};
use crate::clock::{Clock, SystemClock};
use crate::error::ConfigError;
use crate::events::Event;
use crate::session::{SessionOutcome, SessionRecord};

/// Core timer engine.
///
/// Owns the single authoritative [`TimerState`]. Control calls that are
/// not valid for the current status are ignored.
pub struct TimerEngine {
    config: TimerConfiguration,
    /// Settings received while an interval was in flight.
    pending_config: Option<TimerConfiguration>,
    state: TimerState,
    /// Mode to enter on the next `start()` after a completion.
    upcoming: Option<TimerMode>,
    /// First instant of the current running period, kept across pauses.
    period_began_at: Option<DateTime<Utc>>,
    paused_accumulated_ms: u64,
    clock: Box<dyn Clock>,
    observers: Observers,
}

impl TimerEngine {
    /// Create an engine reading the system clock.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for zero durations or cycle count.
    pub fn new(config: TimerConfiguration) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock)
    }

    /// Create an engine with a custom clock source.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for zero durations or cycle count.
    pub fn with_clock(
        config: TimerConfiguration,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mode = config.default_mode.initial_mode();
        let reading = idle_reading(&config, mode);
        Ok(Self {
            state: TimerState {
                mode,
                status: TimerStatus::Idle,
                reading,
                completed_work_cycles: 0,
                linked_task_id: None,
                started_at: None,
                paused_accumulated_secs: 0,
            },
            config,
            pending_config: None,
            upcoming: None,
            period_began_at: None,
            paused_accumulated_ms: 0,
            clock: Box::new(clock),
            observers: Observers::default(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn config(&self) -> &TimerConfiguration {
        &self.config
    }

    pub fn pending_config(&self) -> Option<&TimerConfiguration> {
        self.pending_config.as_ref()
    }

    /// Mode the next `start()` will enter, set while `Completed`.
    pub fn upcoming_mode(&self) -> Option<TimerMode> {
        self.upcoming
    }

    /// Target length of the current mode, `None` in continuous mode.
    pub fn target_secs(&self) -> Option<u64> {
        self.config.duration_secs(self.state.mode)
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        match (self.target_secs(), self.state.reading) {
            (Some(total), Reading::Remaining { secs }) if total > 0 => {
                1.0 - (secs as f64 / total as f64)
            }
            _ => 0.0,
        }
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event, &TimerState) + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin an interval in the current mode. From `Completed`, first moves
    /// to the upcoming mode.
    pub fn start(&mut self, task_id: Option<String>) {
        let now = self.clock.now();
        match self.state.status {
            TimerStatus::Idle => {}
            TimerStatus::Completed => {
                self.apply_pending_config();
                self.advance_mode(now);
            }
            TimerStatus::Running | TimerStatus::Paused => {
                debug!(status = ?self.state.status, "start ignored");
                return;
            }
        }
        self.begin_interval(now, task_id);
    }

    pub fn pause(&mut self) {
        if self.state.status != TimerStatus::Running {
            debug!(status = ?self.state.status, "pause ignored");
            return;
        }
        let now = self.clock.now();
        let consumed = self.consumed_ms(now);
        if self.is_expired(consumed) {
            // The interval ran out before anyone ticked.
            self.finish_interval(now, SessionOutcome::Completed);
            return;
        }
        self.paused_accumulated_ms = consumed;
        self.state.paused_accumulated_secs = consumed / 1000;
        self.state.started_at = None;
        self.state.status = TimerStatus::Paused;
        self.refresh_reading(consumed);
        self.emit(Event::TimerPaused {
            consumed_secs: consumed / 1000,
            at: now,
        });
    }

    pub fn resume(&mut self) {
        if self.state.status != TimerStatus::Paused {
            debug!(status = ?self.state.status, "resume ignored");
            return;
        }
        let now = self.clock.now();
        self.state.status = TimerStatus::Running;
        self.state.started_at = Some(now);
        self.emit(Event::TimerResumed {
            consumed_secs: self.paused_accumulated_ms / 1000,
            at: now,
        });
    }

    /// Return to `Idle` with the full duration restored. An interval in
    /// flight is recorded as abandoned. The work-cycle count is kept.
    pub fn reset(&mut self) {
        let now = self.clock.now();
        self.abandon_in_flight(now);
        let family_changed = self.apply_pending_config();
        if self.state.status == TimerStatus::Completed {
            self.advance_mode(now);
        }
        if family_changed {
            self.state.mode = self.config.default_mode.initial_mode();
        }
        self.go_idle();
        self.emit(Event::TimerReset {
            mode: self.state.mode,
            at: now,
        });
    }

    /// Finish the current interval now, as if its time had run out.
    /// In continuous mode this stops the stopwatch.
    pub fn skip(&mut self) {
        if !self.state.is_active() {
            debug!(status = ?self.state.status, "skip ignored");
            return;
        }
        let now = self.clock.now();
        self.emit(Event::TimerSkipped {
            mode: self.state.mode,
            at: now,
        });
        let outcome = if self.state.mode.counts_down() {
            SessionOutcome::Skipped
        } else {
            SessionOutcome::Stopped
        };
        self.finish_interval(now, outcome);
    }

    /// Recompute progress for `now`. Fires the completion transition
    /// within this call once the interval is over.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.state.status != TimerStatus::Running {
            return;
        }
        let consumed = self.consumed_ms(now);
        if self.is_expired(consumed) {
            self.finish_interval(now, SessionOutcome::Completed);
            return;
        }
        self.refresh_reading(consumed);
        self.emit(Event::Ticked {
            reading: self.state.reading,
            at: now,
        });
    }

    /// Switch between the pomodoro cycle and the continuous stopwatch.
    /// Any interval in flight is abandoned; the work-cycle count is kept.
    /// A pending long break still resets the count, as with [`reset`].
    ///
    /// [`reset`]: TimerEngine::reset
    pub fn switch_mode(&mut self, family: DefaultMode) {
        let now = self.clock.now();
        self.abandon_in_flight(now);
        self.apply_pending_config();
        if self.state.status == TimerStatus::Completed {
            self.advance_mode(now);
        }
        self.upcoming = None;
        self.state.mode = family.initial_mode();
        self.go_idle();
        self.emit(Event::TimerReset {
            mode: self.state.mode,
            at: now,
        });
    }

    /// Replace the configuration. Takes effect at once when idle, otherwise
    /// on the next reset or mode transition.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if `config` fails validation.
    pub fn set_configuration(&mut self, config: TimerConfiguration) -> Result<(), ConfigError> {
        config.validate()?;
        let now = self.clock.now();
        let applied = self.state.status == TimerStatus::Idle;
        self.pending_config = Some(config);
        if applied {
            if self.apply_pending_config() {
                self.state.mode = self.config.default_mode.initial_mode();
            }
            self.state.reading = idle_reading(&self.config, self.state.mode);
        }
        self.emit(Event::ConfigurationChanged { applied, at: now });
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn consumed_ms(&self, now: DateTime<Utc>) -> u64 {
        let running = self
            .state
            .started_at
            .map(|since| (now - since).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        self.paused_accumulated_ms.saturating_add(running)
    }

    fn target_ms(&self) -> Option<u64> {
        self.target_secs().map(|secs| secs.saturating_mul(1000))
    }

    fn is_expired(&self, consumed_ms: u64) -> bool {
        self.target_ms().is_some_and(|target| consumed_ms >= target)
    }

    fn refresh_reading(&mut self, consumed_ms: u64) {
        self.state.reading = match self.target_ms() {
            Some(target) => Reading::Remaining {
                secs: target.saturating_sub(consumed_ms).div_ceil(1000),
            },
            None => Reading::Elapsed {
                secs: consumed_ms / 1000,
            },
        };
    }

    fn begin_interval(&mut self, now: DateTime<Utc>, task_id: Option<String>) {
        self.state.status = TimerStatus::Running;
        self.state.started_at = Some(now);
        self.state.linked_task_id = task_id;
        self.state.paused_accumulated_secs = 0;
        self.state.reading = idle_reading(&self.config, self.state.mode);
        self.paused_accumulated_ms = 0;
        self.period_began_at = Some(now);
        debug!(mode = %self.state.mode, task = ?self.state.linked_task_id, "interval started");
        self.emit(Event::TimerStarted {
            mode: self.state.mode,
            duration_secs: self.target_secs(),
            task_id: self.state.linked_task_id.clone(),
            at: now,
        });
    }

    /// Shared by natural completion, `skip()` and a late `pause()`.
    fn finish_interval(&mut self, now: DateTime<Utc>, outcome: SessionOutcome) {
        let consumed = self.consumed_ms(now);
        let (consumed, ended_at) = match self.target_ms() {
            Some(target) if consumed >= target => (target, self.expiry_instant(target, now)),
            _ => (consumed, now),
        };
        self.end_session(ended_at, consumed, outcome);

        let finished = self.state.mode;
        self.upcoming = match finished {
            TimerMode::Work => {
                self.state.completed_work_cycles += 1;
                if self.state.completed_work_cycles % self.config.cycles_before_long_break == 0 {
                    Some(TimerMode::LongBreak)
                } else {
                    Some(TimerMode::ShortBreak)
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => Some(TimerMode::Work),
            TimerMode::Continuous => None,
        };
        self.state.status = TimerStatus::Completed;
        self.state.started_at = None;
        self.state.paused_accumulated_secs = 0;
        self.paused_accumulated_ms = 0;
        self.period_began_at = None;
        self.state.reading = match self.state.reading {
            Reading::Remaining { .. } => Reading::Remaining { secs: 0 },
            Reading::Elapsed { .. } => Reading::Elapsed {
                secs: consumed / 1000,
            },
        };

        info!(
            mode = %finished,
            next = ?self.upcoming,
            cycles = self.state.completed_work_cycles,
            ?outcome,
            "interval completed"
        );
        self.emit(Event::TimerCompleted {
            mode: finished,
            next_mode: self.upcoming,
            completed_work_cycles: self.state.completed_work_cycles,
            at: now,
        });

        let auto_start = match self.upcoming {
            Some(next) if next.is_break() => self.config.auto_start_breaks,
            Some(_) => self.config.auto_start_next_work,
            None => false,
        };
        if auto_start {
            let task_id = self.state.linked_task_id.clone();
            self.apply_pending_config();
            self.advance_mode(now);
            self.begin_interval(now, task_id);
        }
    }

    /// Wall-clock instant at which the countdown hit zero.
    fn expiry_instant(&self, target_ms: u64, fallback: DateTime<Utc>) -> DateTime<Utc> {
        let Some(since) = self.state.started_at else {
            return fallback;
        };
        let left = target_ms.saturating_sub(self.paused_accumulated_ms);
        let left = i64::try_from(left).unwrap_or(i64::MAX);
        since
            .checked_add_signed(Duration::milliseconds(left))
            .map_or(fallback, |at| at.min(fallback))
    }

    fn end_session(&mut self, ended_at: DateTime<Utc>, consumed_ms: u64, outcome: SessionOutcome) {
        let record = SessionRecord {
            kind: self.state.mode,
            started_at: self.period_began_at.unwrap_or(ended_at),
            ended_at,
            duration_secs: consumed_ms / 1000,
            task_id: self.state.linked_task_id.clone(),
            completed: outcome.counts_as_completed(),
            outcome,
        };
        self.emit(Event::SessionEnded { record });
    }

    /// Record the interval in flight as abandoned. Periods shorter than a
    /// second leave no record.
    fn abandon_in_flight(&mut self, now: DateTime<Utc>) {
        if !self.state.is_active() {
            return;
        }
        let consumed = self.consumed_ms(now);
        if consumed >= 1000 {
            self.end_session(now, consumed, SessionOutcome::Abandoned);
        }
    }

    fn advance_mode(&mut self, now: DateTime<Utc>) {
        let Some(next) = self.upcoming.take() else {
            return;
        };
        let from = self.state.mode;
        self.state.mode = next;
        if next == TimerMode::LongBreak {
            self.state.completed_work_cycles = 0;
        }
        self.state.reading = idle_reading(&self.config, next);
        debug!(%from, to = %next, "mode advanced");
        self.emit(Event::ModeAdvanced { from, to: next, at: now });
    }

    /// Returns `true` if the default mode family changed.
    fn apply_pending_config(&mut self) -> bool {
        let Some(config) = self.pending_config.take() else {
            return false;
        };
        let family_changed = config.default_mode != self.config.default_mode;
        self.config = config;
        family_changed
    }

    fn go_idle(&mut self) {
        self.upcoming = None;
        self.state.status = TimerStatus::Idle;
        self.state.started_at = None;
        self.state.linked_task_id = None;
        self.state.paused_accumulated_secs = 0;
        self.state.reading = idle_reading(&self.config, self.state.mode);
        self.paused_accumulated_ms = 0;
        self.period_began_at = None;
    }

    fn emit(&mut self, event: Event) {
        self.observers.notify(&event, &self.state);
    }
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("upcoming", &self.upcoming)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

fn idle_reading(config: &TimerConfiguration, mode: TimerMode) -> Reading {
    match config.duration_secs(mode) {
        Some(secs) => Reading::Remaining { secs },
        None => Reading::Elapsed { secs: 0 },
    }
}
