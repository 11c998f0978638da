//! Integration tests wiring the engine to SQLite through the persistence
//! observer.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::{
    persistence_observer, Clock, Database, DefaultMode, ManualClock, SessionOutcome,
    TimerConfiguration, TimerEngine, TimerMode,
};
use chrono::Utc;

#[test]
fn engine_sessions_land_in_database() {
    let clock = ManualClock::new(Utc::now());
    let config = TimerConfiguration {
        work_duration_secs: 120,
        short_break_duration_secs: 30,
        long_break_duration_secs: 60,
        cycles_before_long_break: 2,
        ..TimerConfiguration::default()
    };
    let mut engine = TimerEngine::with_clock(config, clock.clone()).unwrap();
    let db = Rc::new(RefCell::new(Database::open_memory().unwrap()));
    engine.subscribe(persistence_observer(Rc::clone(&db)));

    engine.start(Some("inbox-zero".into()));
    clock.advance_secs(120);
    engine.tick(clock.now());

    engine.start(None);
    clock.advance_secs(10);
    engine.skip();

    engine.switch_mode(DefaultMode::Continuous);
    engine.start(Some("email".into()));
    clock.advance_secs(95);
    engine.tick(clock.now());
    engine.skip();

    let db = db.borrow();
    let recent = db.recent_sessions(10).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].record.kind, TimerMode::Continuous);
    assert_eq!(recent[0].record.outcome, SessionOutcome::Stopped);
    assert_eq!(recent[0].record.duration_secs, 95);
    assert_eq!(recent[1].record.outcome, SessionOutcome::Skipped);
    assert_eq!(recent[2].record.task_id.as_deref(), Some("inbox-zero"));

    let stats = db.stats_all().unwrap();
    assert_eq!(stats.total_sessions, 3);
    assert_eq!(stats.work_sessions, 1);
    assert_eq!(stats.total_work_secs, 120);
    assert_eq!(stats.total_break_secs, 10);
    assert_eq!(stats.total_continuous_secs, 95);

    let for_task = db.sessions_for_task("email").unwrap();
    assert_eq!(for_task.len(), 1);
}
