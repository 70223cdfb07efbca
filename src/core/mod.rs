//! # Core Module
//!
//! Configuration, error kinds and duration formatting shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add thiserror-based `ReflectError`
//! - 1.0.0: Initial creation with config and time formatting

pub mod config;
pub mod error;
pub mod time_format;

// Re-export commonly used items
pub use config::{AlertConfig, Config, ScheduleConfig};
pub use error::{ReflectError, ReflectResult};
pub use time_format::{fmt_time_diff, format_time_delta};
