//! # Features Module
//!
//! One module per responsibility of the reflection scheduler. They only
//! coordinate through the state store.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

pub mod alerts;
pub mod dates;
pub mod reporter;
pub mod scheduler;
pub mod state;

pub use alerts::{Alert, AlertSink, DesktopAlerts};
pub use dates::parse_datetime;
pub use reporter::render_report;
pub use scheduler::{ReflectionLoop, TickOutcome};
pub use state::{StateKey, StateSnapshot, StateStore};
