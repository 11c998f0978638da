//! Terminal rendering of timer state.

use cadence_core::{Reading, TimerState, TimerStatus};

/// `MM:SS`, or `H:MM:SS` past the hour.
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Fixed-width text bar for a 0.0 .. 1.0 fraction.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn status_line(state: &TimerState, progress: f64) -> String {
    let status = match state.status {
        TimerStatus::Idle => "idle",
        TimerStatus::Running => "running",
        TimerStatus::Paused => "paused",
        TimerStatus::Completed => "done",
    };
    let task = state
        .linked_task_id
        .as_deref()
        .map(|t| format!(" ({t})"))
        .unwrap_or_default();
    match state.reading {
        Reading::Remaining { secs } => format!(
            "{:<11} {} {} {status} #{}{task}",
            state.mode.label(),
            format_clock(secs),
            progress_bar(progress, 20),
            state.completed_work_cycles,
        ),
        Reading::Elapsed { secs } => format!(
            "{:<11} {} {status}{task}",
            state.mode.label(),
            format_clock(secs),
        ),
    }
}
