//! # Command System
//!
//! Command-line surface: flag definitions and the interpreter that turns
//! one invocation into state changes and printed output.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Parse every `--set-*` value before writing anything
//! - 2.0.0: Move flags to clap derive
//! - 1.0.0: Initial release

pub mod args;
pub mod interpreter;

pub use args::Args;
pub use interpreter::CommandInterpreter;
