use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use cadence_core::{
    persistence_observer, Config, Database, DefaultMode, Event, TimerConfiguration, TimerEngine,
    TimerStatus,
};
use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::notify::Notifier;
use crate::render;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Pomodoro,
    Continuous,
}

impl From<ModeArg> for DefaultMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Pomodoro => DefaultMode::Pomodoro,
            ModeArg::Continuous => DefaultMode::Continuous,
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground, ticking once per second
    Run {
        /// Task ID to attribute sessions to
        #[arg(long)]
        task: Option<String>,
        /// Pomodoro cycle or open-ended stopwatch (defaults to config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Number of intervals to finish before exiting
        #[arg(long, default_value = "1")]
        intervals: u32,
        /// Override work duration in seconds
        #[arg(long)]
        work: Option<u64>,
        /// Override short break duration in seconds
        #[arg(long)]
        short_break: Option<u64>,
        /// Override long break duration in seconds
        #[arg(long)]
        long_break: Option<u64>,
        /// Stop after this many seconds of wall-clock time
        #[arg(long)]
        stop_after: Option<u64>,
        /// Print events as JSON lines instead of a status line
        #[arg(long)]
        json: bool,
    },
    /// Print the effective timer configuration as JSON
    Show,
}

struct RunOptions {
    task: Option<String>,
    intervals: u32,
    stop_after: Option<Duration>,
    json: bool,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        TimerAction::Run {
            task,
            mode,
            intervals,
            work,
            short_break,
            long_break,
            stop_after,
            json,
        } => {
            let mut timer = config.timer_configuration()?;
            if let Some(mode) = mode {
                timer.default_mode = mode.into();
            }
            timer.work_duration_secs = work.unwrap_or(timer.work_duration_secs);
            timer.short_break_duration_secs = short_break.unwrap_or(timer.short_break_duration_secs);
            timer.long_break_duration_secs = long_break.unwrap_or(timer.long_break_duration_secs);

            let options = RunOptions {
                task,
                intervals: intervals.max(1),
                stop_after: stop_after.map(Duration::from_secs),
                json,
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_foreground(&config, timer, options))
        }
        TimerAction::Show => {
            let timer = config.timer_configuration()?;
            println!("{}", serde_json::to_string_pretty(&timer)?);
            Ok(())
        }
    }
}

async fn run_foreground(
    config: &Config,
    timer: TimerConfiguration,
    options: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = TimerEngine::new(timer)?;
    let db = Rc::new(RefCell::new(Database::open()?));
    engine.subscribe(persistence_observer(Rc::clone(&db)));

    let notifier = Notifier::new(&config.notifications);
    engine.subscribe(move |event, state| notifier.on_event(event, state));

    let completions = Rc::new(Cell::new(0u32));
    {
        let completions = Rc::clone(&completions);
        engine.subscribe(move |event, _| {
            if let Event::TimerCompleted { .. } = event {
                completions.set(completions.get() + 1);
            }
        });
    }

    if options.json {
        engine.subscribe(|event, _| {
            if matches!(event, Event::Ticked { .. }) {
                return;
            }
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        });
    }

    engine.start(options.task.clone());
    info!(mode = %engine.mode(), intervals = options.intervals, "timer running");

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = options.stop_after.map(|after| Instant::now() + after);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.tick(Utc::now());
                if !options.json {
                    print_status(&engine);
                }
                if completions.get() >= options.intervals {
                    break;
                }
                if engine.status() == TimerStatus::Completed {
                    engine.start(options.task.clone());
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    debug!("stop-after deadline reached");
                    stop(&mut engine);
                    break;
                }
            }
            result = &mut ctrl_c => {
                result?;
                debug!("interrupted");
                stop(&mut engine);
                break;
            }
        }
    }

    // An auto-started follow-up interval is not wanted once we are done.
    if engine.state().is_active() {
        engine.reset();
    }
    if !options.json {
        println!();
    }
    Ok(())
}

/// Continuous sessions are kept; a countdown cut short is abandoned.
fn stop(engine: &mut TimerEngine) {
    if engine.mode().counts_down() {
        engine.reset();
    } else {
        engine.skip();
    }
}

fn print_status(engine: &TimerEngine) {
    let line = render::status_line(engine.state(), engine.progress());
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "\r{line}\x1b[K");
    let _ = stdout.flush();
}
