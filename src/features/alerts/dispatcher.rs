//! Alert composition and delivery
//!
//! Builds the overdue notice and hands it to the platform's notification
//! and speech programs, bounded by a timeout.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Tool failures return `ExternalTool` errors to the caller
//! - 1.1.0: notify-send / spd-say outside macOS
//! - 1.0.0: Initial release with terminal-notifier and say

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use std::fmt::Display;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::{fmt_time_diff, AlertConfig, ReflectError, ReflectResult};
use crate::features::state::StateSnapshot;

/// What gets spoken when voice is enabled
pub const SPEECH_PHRASE: &str = "reflect now";

/// One rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    /// Build the overdue notice from the current state
    pub fn compose<Tz>(snapshot: &StateSnapshot, now: DateTime<Utc>, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let clock = |instant: DateTime<Utc>| instant.with_timezone(tz).format("%H:%M").to_string();

        Alert {
            title: format!(
                "Reflect now ({})",
                fmt_time_diff(snapshot.next_reflection_time, now, false)
            ),
            message: format!(
                "It's {} / {}. EOD in {} (at {}).",
                snapshot.j_time(now, false),
                clock(now),
                snapshot.eod(now, false),
                clock(snapshot.bedtime)
            ),
        }
    }
}

/// Where alerts go. The polling loop only talks to this trait.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Show a desktop notification
    async fn notify(&self, alert: &Alert) -> ReflectResult<()>;

    /// Say a phrase out loud
    async fn speak(&self, phrase: &str) -> ReflectResult<()>;
}

/// Runs the platform's notification and text-to-speech programs
#[derive(Debug, Clone)]
pub struct DesktopAlerts {
    config: AlertConfig,
}

impl DesktopAlerts {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Program and arguments for a desktop notification on this platform
    fn notify_command(&self, alert: &Alert) -> (&'static str, Vec<String>) {
        if cfg!(target_os = "macos") {
            (
                "terminal-notifier",
                vec![
                    "-title".to_string(),
                    alert.title.clone(),
                    "-message".to_string(),
                    alert.message.clone(),
                    "-contentImage".to_string(),
                    self.config.icon_url.clone(),
                ],
            )
        } else {
            (
                "notify-send",
                vec![
                    "-i".to_string(),
                    self.config.icon_url.clone(),
                    alert.title.clone(),
                    alert.message.clone(),
                ],
            )
        }
    }

    fn speech_program() -> &'static str {
        if cfg!(target_os = "macos") {
            "say"
        } else {
            "spd-say"
        }
    }

    async fn run_tool(&self, program: &str, args: &[String]) -> ReflectResult<()> {
        debug!("Running {} {:?}", program, args);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.config.tool_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ReflectError::external_tool(program, e)),
            Err(_) => {
                return Err(ReflectError::external_tool(
                    program,
                    format!("timed out after {}s", self.config.tool_timeout.as_secs()),
                ))
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ReflectError::external_tool(
                program,
                format!("{} {}", output.status, stderr.trim()),
            ))
        }
    }
}

#[async_trait]
impl AlertSink for DesktopAlerts {
    async fn notify(&self, alert: &Alert) -> ReflectResult<()> {
        let (program, args) = self.notify_command(alert);
        self.run_tool(program, &args).await?;
        info!("Notified: {}", alert.title);
        Ok(())
    }

    async fn speak(&self, phrase: &str) -> ReflectResult<()> {
        self.run_tool(Self::speech_program(), &[phrase.to_string()]).await
    }
}
