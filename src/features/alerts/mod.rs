//! # Feature: Alert Dispatcher
//!
//! Desktop notification (and optional speech) telling the user a
//! reflection is overdue.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.2.0: Tool failures are returned as `ExternalTool` errors instead of aborting
//! - 1.1.0: Linux fallback via notify-send / spd-say
//! - 1.0.0: Initial release with terminal-notifier and say

pub mod dispatcher;

pub use dispatcher::{Alert, AlertSink, DesktopAlerts, SPEECH_PHRASE};
