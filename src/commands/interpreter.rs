//! Command interpreter
//!
//! Applies one invocation's flags to the state store and builds the text
//! printed to stdout.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: `--set-reflection` is applied before `--wakeup`, so a wakeup always wins
//! - 1.1.0: Parse every `--set-*` value before writing anything
//! - 1.0.0: Initial release

use chrono::{DateTime, TimeZone, Utc};
use log::info;
use std::fmt::Display;

use super::Args;
use crate::core::{ReflectResult, ScheduleConfig};
use crate::features::dates::parse_datetime;
use crate::features::reporter::render_report;
use crate::features::state::{StateKey, StateStore};

/// Applies one invocation's flags to the store.
///
/// Everything except `--loop` is handled here; the caller enters the loop
/// after printing what this returns.
pub struct CommandInterpreter {
    store: StateStore,
    schedule: ScheduleConfig,
}

/// `--set-*` values, parsed before anything is written
struct Setters {
    wakeup: Option<DateTime<Utc>>,
    reflection: Option<DateTime<Utc>>,
    eod: Option<DateTime<Utc>>,
}

impl CommandInterpreter {
    pub fn new(store: StateStore, schedule: ScheduleConfig) -> Self {
        Self { store, schedule }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run the invocation at `now` and return the text to print
    pub fn execute<Tz>(&self, args: &Args, now: &DateTime<Tz>) -> ReflectResult<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let parse = |text: &Option<String>| text.as_deref().map(|t| parse_datetime(t, now)).transpose();
        let setters = Setters {
            wakeup: parse(&args.set_wakeup)?,
            reflection: parse(&args.set_reflection)?,
            eod: parse(&args.set_eod)?,
        };

        let now_utc = now.with_timezone(&Utc);
        let tz = now.timezone();
        let clock = |instant: DateTime<Utc>| instant.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string();
        let mut lines: Vec<String> = Vec::new();

        self.store.timestamp_or_init(StateKey::NextReflectionTime, now_utc)?;

        // Applied before wakeup so a wakeup always leaves the reflection due now
        if let Some(next) = setters.reflection {
            self.store.write_timestamp(StateKey::NextReflectionTime, &next)?;
            info!("Next reflection set to {}", next);
            lines.push(format!("Next reflection set to {}.", clock(next)));
        }

        if args.wakeup || !self.store.exists(StateKey::WakeupTime) {
            let bedtime = self.wake_up(now_utc)?;
            lines.push(format!("Good morning. Reflection is due now, bedtime at {}.", clock(bedtime)));
        }

        if let Some(wakeup) = setters.wakeup {
            self.store.write_timestamp(StateKey::WakeupTime, &wakeup)?;
            info!("Wakeup set to {}", wakeup);
            lines.push(format!("Wakeup set to {}.", clock(wakeup)));
        }

        if let Some(eod) = setters.eod {
            self.store.write_timestamp(StateKey::Bedtime, &eod)?;
            info!("End of day set to {}", eod);
            lines.push(format!("End of day set to {}.", clock(eod)));
        }

        if args.reflected {
            self.store.set_reflected(now_utc)?;
            info!("Reflection acknowledged");
            lines.push("Reflection marked as done.".to_string());
        }

        let mut out = String::new();
        for line in &lines {
            out.push_str(line);
            out.push('\n');
        }

        if args.get_state {
            let snapshot = self.store.snapshot(now_utc)?;
            out.push_str(&render_report(&snapshot, now));
        }

        Ok(out)
    }

    /// Start a new day at `now`; returns the derived bedtime
    fn wake_up(&self, now: DateTime<Utc>) -> ReflectResult<DateTime<Utc>> {
        let bedtime = now + self.schedule.awake_per_day;

        self.store.write_timestamp(StateKey::WakeupTime, &now)?;
        self.store.clear_reflected()?;
        self.store.write_timestamp(StateKey::NextReflectionTime, &now)?;
        self.store.write_timestamp(StateKey::Bedtime, &bedtime)?;

        info!("Woke up at {}, bedtime {}", now, bedtime);
        Ok(bedtime)
    }
}
