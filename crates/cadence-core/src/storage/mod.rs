mod config;
pub mod database;

pub use config::{Config, NotificationsConfig, TimerSettings};
pub use database::{Database, Stats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Resolves the directory holding `config.toml` and `cadence.db`.
///
/// `CADENCE_HOME` wins when set. Otherwise `~/.config/cadence`, or
/// `~/.config/cadence-dev` when `CADENCE_ENV=dev`. The directory is created
/// if missing.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CADENCE_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("cadence-dev")
            } else {
                base_dir.join("cadence")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
