//! # Configuration
//!
//! Runtime configuration loaded from environment variables (and a `.env`
//! file, loaded by the binary before this runs).
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Split into `ScheduleConfig` and `AlertConfig`, configurable tool timeout
//! - 1.0.0: Initial release with interval and state directory settings

use anyhow::{anyhow, Result};
use chrono::Duration;
use std::path::PathBuf;

/// Default icon shown next to the desktop notification
pub const DEFAULT_ICON_URL: &str =
    "https://i.pinimg.com/originals/fc/60/62/fc60622ac3c047ba90d9adaba24325bd.jpg";

const DEFAULT_INTERVAL_MINUTES: u64 = 150;
const DEFAULT_REPEAT_MINUTES: u64 = 10;
const DEFAULT_AWAKE_HOURS: u64 = 14;
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 15;

/// Timing rules shared by the command interpreter and the polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Gap between an acknowledged reflection and the next deadline
    pub notification_interval: Duration,
    /// Minimum gap between two alerts for the same overdue reflection
    pub notification_repeat_interval: Duration,
    /// Length of the planned day, used to derive bedtime on wakeup
    pub awake_per_day: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            notification_interval: Duration::minutes(DEFAULT_INTERVAL_MINUTES as i64),
            notification_repeat_interval: Duration::minutes(DEFAULT_REPEAT_MINUTES as i64),
            awake_per_day: Duration::hours(DEFAULT_AWAKE_HOURS as i64),
        }
    }
}

/// Settings for the external notification and speech tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    pub icon_url: String,
    pub tool_timeout: std::time::Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            icon_url: DEFAULT_ICON_URL.to_string(),
            tool_timeout: std::time::Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub schedule: ScheduleConfig,
    pub alerts: AlertConfig,
    pub log_level: String,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let state_dir = match lookup("NOTIFY_AT_STATE_DIR").filter(|v| !v.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir(lookup("HOME")),
        };

        let interval = positive_number(&lookup, "NOTIFY_AT_INTERVAL_MINUTES", DEFAULT_INTERVAL_MINUTES)?;
        let repeat = positive_number(&lookup, "NOTIFY_AT_REPEAT_MINUTES", DEFAULT_REPEAT_MINUTES)?;
        let awake = positive_number(&lookup, "NOTIFY_AT_AWAKE_HOURS", DEFAULT_AWAKE_HOURS)?;
        let timeout = positive_number(&lookup, "NOTIFY_AT_TOOL_TIMEOUT_SECS", DEFAULT_TOOL_TIMEOUT_SECS)?;

        let icon_url = lookup("NOTIFY_AT_ICON_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ICON_URL.to_string());

        Ok(Config {
            state_dir,
            schedule: ScheduleConfig {
                notification_interval: Duration::minutes(interval as i64),
                notification_repeat_interval: Duration::minutes(repeat as i64),
                awake_per_day: Duration::hours(awake as i64),
            },
            alerts: AlertConfig {
                icon_url,
                tool_timeout: std::time::Duration::from_secs(timeout),
            },
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn default_state_dir(home: Option<String>) -> PathBuf {
    match home.filter(|h| !h.is_empty()) {
        Some(home) => PathBuf::from(home).join(".notify-at").join("state"),
        None => PathBuf::from("state"),
    }
}

fn positive_number<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        // Bounded so the chrono constructors cannot overflow
        Ok(value) if value > 0 && value <= 1_000_000 => Ok(value),
        _ => Err(anyhow!("{key} must be a positive whole number, got '{raw}'")),
    }
}
