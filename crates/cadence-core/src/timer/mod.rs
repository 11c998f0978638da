mod config;
mod engine;
mod observer;
mod state;

pub use config::{DefaultMode, TimerConfiguration};
pub use engine::TimerEngine;
pub use observer::{Callback, Observers, SubscriptionId};
pub use state::{Reading, TimerMode, TimerState, TimerStatus};
