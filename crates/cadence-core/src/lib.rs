//! # Cadence Core Library
//!
//! Core logic for the Cadence work/break timer, shared by every front end.
//! The CLI binary and any GUI shell are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()`; it never schedules timers of its own
//! - **Observers**: Synchronous callbacks receiving every [`Event`] with the
//!   resulting [`TimerState`]
//! - **Sessions**: Records of ended running periods, persisted through the
//!   [`SessionStore`] seam
//! - **Storage**: SQLite-based session storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Database`]: Session and statistics persistence
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use session::{
    persistence_observer, MemorySessionStore, SessionOutcome, SessionRecord, SessionStore,
    StoredSession,
};
pub use storage::{Config, Database, Stats};
pub use timer::{
    DefaultMode, Reading, SubscriptionId, TimerConfiguration, TimerEngine, TimerMode, TimerState,
    TimerStatus,
};
