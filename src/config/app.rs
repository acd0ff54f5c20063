//! Application configuration loading from `meter-buddy.toml`.
//!
//! Every field is optional. A missing file is not an error: the defaults describe
//! a single-site setup (Russian month names, reminders from the 24th
//! at noon).

use crate::{
    core::{calendar::Locale, reminder::ReminderSchedule},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Site label stamped on readings when the config does not name one.
pub const DEFAULT_ADDRESS: &str = "уч.143а";

const DEFAULT_CONFIG_PATH: &str = "meter-buddy.toml";

/// Configuration structure representing the whole `meter-buddy.toml` file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Label written into the `address` column of new readings
    pub address: String,
    /// Language used for month names
    pub locale: Locale,
    /// When reminders start and fire
    pub reminder: ReminderSchedule,
    /// Directory for a `history_<timestamp>.txt` backup after every saved reading; off when unset
    pub backup_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            locale: Locale::default(),
            reminder: ReminderSchedule::default(),
            backup_dir: None,
        }
    }
}

/// Resolves the config path: `METER_BUDDY_CONFIG` if set, else `./meter-buddy.toml`.
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var("METER_BUDDY_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed, or if the
/// reminder schedule is out of range.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config file at {:?}, using defaults", path);
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Parses configuration from TOML text and validates it.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse meter-buddy.toml: {e}"),
    })?;
    config.reminder.validate()?;
    Ok(config)
}
