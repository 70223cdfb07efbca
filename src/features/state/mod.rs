//! # Feature: State Store
//!
//! Four independently persisted values (wakeup, bedtime, next reflection
//! deadline, reflected flag) shared between the long-running loop and
//! one-shot invocations through the filesystem.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Versioned RFC-3339 text records, atomic replace on write
//! - 1.0.0: Initial release

pub mod store;

pub use store::{StateKey, StateSnapshot, StateStore};
