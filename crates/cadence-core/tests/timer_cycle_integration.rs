//! Integration tests for the full work/break cycle.
//!
//! Drives the engine one tick per second through complete pomodoro cycles
//! and checks mode transitions, cycle counting and session accounting.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::{
    Clock, Event, ManualClock, SessionOutcome, TimerConfiguration, TimerEngine, TimerMode,
    TimerStatus,
};
use chrono::{TimeZone, Utc};

fn classic_config() -> TimerConfiguration {
    TimerConfiguration {
        work_duration_secs: 1500,
        short_break_duration_secs: 300,
        long_break_duration_secs: 900,
        cycles_before_long_break: 4,
        auto_start_breaks: false,
        auto_start_next_work: false,
        ..TimerConfiguration::default()
    }
}

fn setup(config: TimerConfiguration) -> (TimerEngine, ManualClock, Rc<RefCell<Vec<Event>>>) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap());
    let mut engine = TimerEngine::with_clock(config, clock.clone()).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.subscribe(move |event, _| sink.borrow_mut().push(event.clone()));
    (engine, clock, events)
}

/// Tick once per second for `secs` seconds.
fn run_for(engine: &mut TimerEngine, clock: &ManualClock, secs: u64) {
    for _ in 0..secs {
        clock.advance_secs(1);
        engine.tick(clock.now());
    }
}

#[test]
fn work_interval_completes_after_exact_duration() {
    let (mut engine, clock, _) = setup(classic_config());
    engine.start(None);

    run_for(&mut engine, &clock, 1499);
    assert_eq!(engine.status(), TimerStatus::Running);
    assert_eq!(engine.state().remaining_secs(), Some(1));

    run_for(&mut engine, &clock, 1);
    assert_eq!(engine.status(), TimerStatus::Completed);
    assert_eq!(engine.mode(), TimerMode::Work);
    assert_eq!(engine.state().remaining_secs(), Some(0));

    engine.start(None);
    assert_eq!(engine.mode(), TimerMode::ShortBreak);
}

#[test]
fn four_work_intervals_lead_to_long_break() {
    let (mut engine, clock, events) = setup(classic_config());

    for cycle in 1..=4u32 {
        engine.start(Some("write-report".into()));
        assert_eq!(engine.mode(), TimerMode::Work);
        run_for(&mut engine, &clock, 1500);
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert_eq!(engine.state().completed_work_cycles, cycle);

        engine.start(None);
        if cycle < 4 {
            assert_eq!(engine.mode(), TimerMode::ShortBreak);
            run_for(&mut engine, &clock, 300);
            assert_eq!(engine.status(), TimerStatus::Completed);
        }
    }

    assert_eq!(engine.mode(), TimerMode::LongBreak);
    assert_eq!(engine.state().completed_work_cycles, 0);
    assert_eq!(engine.state().remaining_secs(), Some(900));

    let completed_work = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::SessionEnded { record } if record.kind == TimerMode::Work && record.completed))
        .count();
    assert_eq!(completed_work, 4);
}

#[test]
fn completion_event_carries_pre_transition_mode() {
    let (mut engine, clock, events) = setup(classic_config());
    engine.start(None);
    run_for(&mut engine, &clock, 1500);

    let completed = events
        .borrow()
        .iter()
        .find_map(|e| match e {
            Event::TimerCompleted { mode, next_mode, .. } => Some((*mode, *next_mode)),
            _ => None,
        });
    assert_eq!(completed, Some((TimerMode::Work, Some(TimerMode::ShortBreak))));
}

#[test]
fn auto_start_runs_cycle_without_user_input() {
    let config = TimerConfiguration {
        auto_start_breaks: true,
        auto_start_next_work: true,
        ..classic_config()
    };
    let (mut engine, clock, _) = setup(config);
    engine.start(None);

    run_for(&mut engine, &clock, 1500);
    assert_eq!(engine.mode(), TimerMode::ShortBreak);
    assert_eq!(engine.status(), TimerStatus::Running);

    run_for(&mut engine, &clock, 300);
    assert_eq!(engine.mode(), TimerMode::Work);
    assert_eq!(engine.status(), TimerStatus::Running);
    assert_eq!(engine.state().completed_work_cycles, 1);
}

#[test]
fn reset_mid_work_preserves_cycles_and_is_not_completed() {
    let (mut engine, clock, events) = setup(classic_config());
    engine.start(None);
    run_for(&mut engine, &clock, 1500);
    engine.start(None);
    run_for(&mut engine, &clock, 300);

    engine.start(None);
    run_for(&mut engine, &clock, 700);
    engine.reset();

    assert_eq!(engine.status(), TimerStatus::Idle);
    assert_eq!(engine.mode(), TimerMode::Work);
    assert_eq!(engine.state().completed_work_cycles, 1);
    assert_eq!(engine.state().remaining_secs(), Some(1500));

    let last_session = events.borrow().iter().rev().find_map(|e| match e {
        Event::SessionEnded { record } => Some(record.clone()),
        _ => None,
    });
    let last_session = last_session.unwrap();
    assert_eq!(last_session.outcome, SessionOutcome::Abandoned);
    assert!(!last_session.completed);
    assert_eq!(last_session.duration_secs, 700);
}
