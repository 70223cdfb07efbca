//! Command-line flags
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: clap derive definitions for every flag

use clap::Parser;

/// Periodic reflection reminders tied to your wakeup time.
#[derive(Debug, Default, Parser)]
#[command(name = "notify-at", version, about)]
pub struct Args {
    /// Set the wakeup time to now and make the next reflection due immediately.
    #[arg(long)]
    pub wakeup: bool,
    /// Set the wakeup time (e.g. "2024-01-01 07:30", "7am").
    #[arg(long, value_name = "WHEN")]
    pub set_wakeup: Option<String>,
    /// Set the next time to reflect at.
    #[arg(long, value_name = "WHEN")]
    pub set_reflection: Option<String>,
    /// Set the end of day (bedtime).
    #[arg(long, value_name = "WHEN")]
    pub set_eod: Option<String>,
    /// Print the current state. Useful for a status widget.
    #[arg(long)]
    pub get_state: bool,
    /// Also announce reflections with text-to-speech (with --loop).
    #[arg(long)]
    pub use_voice: bool,
    /// Keep running and alert whenever a reflection is due.
    /// Meant to be kept alive by a service manager.
    #[arg(long = "loop")]
    pub run_loop: bool,
    /// Declare the current reflection finished.
    #[arg(long)]
    pub reflected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_combine() {
        let args = Args::try_parse_from([
            "notify-at",
            "--wakeup",
            "--get-state",
            "--set-eod",
            "tomorrow 1am",
            "--loop",
            "--use-voice",
            "--reflected",
        ])
        .unwrap();

        assert!(args.wakeup && args.get_state && args.run_loop && args.use_voice && args.reflected);
        assert_eq!(args.set_eod.as_deref(), Some("tomorrow 1am"));
        assert_eq!(args.set_wakeup, None);
        assert_eq!(args.set_reflection, None);
    }

    #[test]
    fn test_setter_requires_value() {
        assert!(Args::try_parse_from(["notify-at", "--set-reflection"]).is_err());
    }
}
