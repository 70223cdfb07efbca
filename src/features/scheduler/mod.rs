//! # Feature: Reflection Loop
//!
//! Long-running mode that watches the reflection deadline, nags until
//! the user acknowledges, then re-arms the deadline.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Driven by a tokio interval, alert failures no longer stop the loop
//! - 1.0.0: Initial release

pub mod machine;

pub use machine::{Phase, ReflectionLoop, TickOutcome};
