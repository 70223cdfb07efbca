// Core layer - configuration, errors, formatting
pub mod core;

// Features layer - state store, dates, reporter, alerts, loop
pub mod features;

// Application layer - CLI flags and interpreter
pub mod commands;

pub use crate::core::{Config, ReflectError, ScheduleConfig};

pub use features::{
    // Alerts
    Alert, AlertSink, DesktopAlerts,
    // Dates
    parse_datetime,
    // Reporter
    render_report,
    // Scheduler
    ReflectionLoop, TickOutcome,
    // State
    StateKey, StateSnapshot, StateStore,
};

pub use commands::{Args, CommandInterpreter};
