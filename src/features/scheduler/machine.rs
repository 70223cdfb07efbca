//! Reflection loop state machine
//!
//! `Waiting` until the deadline passes, then `Due` with repeated alerts
//! until the reflected flag is set and the deadline is behind us.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Alert body falls back to `now` for unreadable records instead of skipping the alert
//! - 2.0.0: Single `tick` driven by a tokio interval
//! - 1.0.0: Initial release with a sleep-based loop

use chrono::{DateTime, Local, TimeZone, Utc};
use log::{debug, info, warn};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::{ReflectResult, ScheduleConfig};
use crate::features::alerts::{Alert, AlertSink, SPEECH_PHRASE};
use crate::features::state::{StateKey, StateSnapshot, StateStore};

/// How often the deadline is re-checked
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Deadline still ahead
    Waiting,
    /// Deadline passed, waiting for acknowledgment
    Due { last_alert: Option<DateTime<Utc>> },
}

/// What a single [`ReflectionLoop::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Waiting,
    Alerted,
    /// Due, but the previous alert is too recent to repeat
    Snoozed,
    /// Acknowledged; carries the new deadline
    Rearmed(DateTime<Utc>),
}

pub struct ReflectionLoop<S: AlertSink, Tz: TimeZone = Local> {
    store: StateStore,
    schedule: ScheduleConfig,
    sink: S,
    use_voice: bool,
    tz: Tz,
    phase: Phase,
}

impl<S: AlertSink> ReflectionLoop<S, Local> {
    pub fn new(store: StateStore, schedule: ScheduleConfig, sink: S, use_voice: bool) -> Self {
        Self::with_timezone(store, schedule, sink, use_voice, Local)
    }
}

impl<S, Tz> ReflectionLoop<S, Tz>
where
    S: AlertSink,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Same as `new`, rendering alert clock times in `tz`
    pub fn with_timezone(store: StateStore, schedule: ScheduleConfig, sink: S, use_voice: bool, tz: Tz) -> Self {
        Self {
            store,
            schedule,
            sink,
            use_voice,
            tz,
            phase: Phase::Waiting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Poll forever, once per second. Errors in a tick are logged and skipped.
    pub async fn run(&mut self) {
        info!(
            "Reflection loop started (interval {}m, repeat {}m, voice {})",
            self.schedule.notification_interval.num_minutes(),
            self.schedule.notification_repeat_interval.num_minutes(),
            if self.use_voice { "on" } else { "off" }
        );

        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.tick(Utc::now()).await {
                warn!("Reflection loop tick failed: {}", e);
            }
        }
    }

    /// Evaluate the state machine once at `now`
    pub async fn tick(&mut self, now: DateTime<Utc>) -> ReflectResult<TickOutcome> {
        // Re-read every time; another invocation may have moved it
        let next = self.store.timestamp_or_init(StateKey::NextReflectionTime, now)?;
        debug!("{} <> {}", now, next);

        let last_alert = match self.phase {
            Phase::Waiting if now < next => return Ok(TickOutcome::Waiting),
            Phase::Waiting => {
                info!("Time to reflect (due since {})", next);
                self.phase = Phase::Due { last_alert: None };
                None
            }
            Phase::Due { last_alert } => last_alert,
        };

        // The flag alone is not enough: a deadline pushed into the future keeps us nagging
        if self.store.is_reflected() && now >= next {
            return self.rearm(now);
        }

        if let Some(last) = last_alert {
            if now - last < self.schedule.notification_repeat_interval {
                return Ok(TickOutcome::Snoozed);
            }
        }

        self.dispatch(now, next).await;
        self.phase = Phase::Due { last_alert: Some(now) };
        Ok(TickOutcome::Alerted)
    }

    fn rearm(&mut self, now: DateTime<Utc>) -> ReflectResult<TickOutcome> {
        let next = now + self.schedule.notification_interval;
        self.store.clear_reflected()?;
        self.store.write_timestamp(StateKey::NextReflectionTime, &next)?;
        self.phase = Phase::Waiting;
        info!("Reflection acknowledged, next one at {}", next.with_timezone(&self.tz).format("%H:%M"));
        Ok(TickOutcome::Rearmed(next))
    }

    /// Send the alert; failures are logged so the loop survives them
    async fn dispatch(&self, now: DateTime<Utc>, next: DateTime<Utc>) {
        let snapshot = self.alert_snapshot(now, next);

        if self.use_voice {
            if let Err(e) = self.sink.speak(SPEECH_PHRASE).await {
                warn!("Speech failed: {}", e);
            }
        }

        let alert = Alert::compose(&snapshot, now, &self.tz);
        if let Err(e) = self.sink.notify(&alert).await {
            warn!("Notification failed: {}", e);
        }
    }

    /// Read-only view for the alert body; unreadable records fall back to `now`
    fn alert_snapshot(&self, now: DateTime<Utc>, next: DateTime<Utc>) -> StateSnapshot {
        let read_or_now = |key: StateKey| match self.store.read_timestamp(key) {
            Ok(Some(value)) => value,
            Ok(None) => now,
            Err(e) => {
                warn!("Using now for {} in alert: {}", key.as_str(), e);
                now
            }
        };

        StateSnapshot {
            wakeup_time: read_or_now(StateKey::WakeupTime),
            bedtime: read_or_now(StateKey::Bedtime),
            next_reflection_time: next,
            reflected: self.store.is_reflected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ReflectError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct RecordingSink {
        notifications: Mutex<Vec<Alert>>,
        phrases: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn notified(&self) -> usize {
            self.notifications.lock().unwrap().len()
        }

        fn spoken(&self) -> usize {
            self.phrases.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn notify(&self, alert: &Alert) -> ReflectResult<()> {
            self.notifications.lock().unwrap().push(alert.clone());
            if self.fail {
                return Err(ReflectError::external_tool("terminal-notifier", "not installed"));
            }
            Ok(())
        }

        async fn speak(&self, phrase: &str) -> ReflectResult<()> {
            self.phrases.lock().unwrap().push(phrase.to_string());
            if self.fail {
                return Err(ReflectError::external_tool("say", "not installed"));
            }
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> ChronoDuration {
        ChronoDuration::seconds(n)
    }

    fn setup(sink: RecordingSink, use_voice: bool, next: DateTime<Utc>) -> (TempDir, StateStore, ReflectionLoop<RecordingSink, Utc>) {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        store.write_timestamp(StateKey::WakeupTime, &(t0() - ChronoDuration::hours(4))).unwrap();
        store.write_timestamp(StateKey::Bedtime, &(t0() + ChronoDuration::hours(10))).unwrap();
        store.write_timestamp(StateKey::NextReflectionTime, &next).unwrap();
        let machine = ReflectionLoop::with_timezone(store.clone(), ScheduleConfig::default(), sink, use_voice, Utc);
        (dir, store, machine)
    }

    #[tokio::test]
    async fn test_waits_until_deadline() {
        let (_dir, _store, mut machine) = setup(RecordingSink::default(), false, t0());

        assert_eq!(machine.tick(t0() - secs(1)).await.unwrap(), TickOutcome::Waiting);
        assert_eq!(machine.phase(), Phase::Waiting);
        assert_eq!(machine.sink().notified(), 0);

        assert_eq!(machine.tick(t0()).await.unwrap(), TickOutcome::Alerted);
        assert_eq!(machine.phase(), Phase::Due { last_alert: Some(t0()) });
        assert_eq!(machine.sink().notified(), 1);
    }

    #[tokio::test]
    async fn test_alert_repeats_once_per_window_without_voice() {
        let (_dir, _store, mut machine) = setup(RecordingSink::default(), false, t0() - secs(60));

        assert_eq!(machine.tick(t0()).await.unwrap(), TickOutcome::Alerted);
        for s in 1..600 {
            assert_eq!(machine.tick(t0() + secs(s)).await.unwrap(), TickOutcome::Snoozed);
        }
        assert_eq!(machine.sink().notified(), 1);

        assert_eq!(machine.tick(t0() + secs(600)).await.unwrap(), TickOutcome::Alerted);
        assert_eq!(machine.sink().notified(), 2);
        assert_eq!(machine.sink().spoken(), 0);
    }

    #[tokio::test]
    async fn test_voice_speaks_with_each_alert() {
        let (_dir, _store, mut machine) = setup(RecordingSink::default(), true, t0());

        machine.tick(t0()).await.unwrap();
        machine.tick(t0() + secs(1)).await.unwrap();
        machine.tick(t0() + secs(601)).await.unwrap();

        assert_eq!(machine.sink().spoken(), 2);
        assert_eq!(machine.sink().phrases.lock().unwrap()[0], SPEECH_PHRASE);
    }

    #[tokio::test]
    async fn test_alert_body_reads_current_state() {
        let (_dir, _store, mut machine) = setup(RecordingSink::default(), false, t0() - ChronoDuration::minutes(5));

        machine.tick(t0()).await.unwrap();

        let alerts = machine.sink().notifications.lock().unwrap();
        assert_eq!(alerts[0].title, "Reflect now (-00:05)");
        assert_eq!(alerts[0].message, "It's 04:00 / 12:00. EOD in 10:00 (at 22:00).");
    }

    #[tokio::test]
    async fn test_acknowledgment_rearms() {
        let (_dir, store, mut machine) = setup(RecordingSink::default(), false, t0());

        machine.tick(t0()).await.unwrap();
        store.set_reflected(t0()).unwrap();

        let now = t0() + secs(30);
        let expected = now + ChronoDuration::minutes(150);
        assert_eq!(machine.tick(now).await.unwrap(), TickOutcome::Rearmed(expected));
        assert_eq!(machine.phase(), Phase::Waiting);
        assert!(!store.is_reflected());
        assert_eq!(store.read_timestamp(StateKey::NextReflectionTime).unwrap(), Some(expected));

        assert_eq!(machine.tick(now + secs(1)).await.unwrap(), TickOutcome::Waiting);
        assert_eq!(machine.sink().notified(), 1);
    }

    #[tokio::test]
    async fn test_flag_set_before_deadline_does_not_end_due_phase() {
        let (_dir, store, mut machine) = setup(RecordingSink::default(), false, t0());

        machine.tick(t0()).await.unwrap();
        // Deadline pushed out from another terminal, then acknowledged early
        let pushed = t0() + ChronoDuration::minutes(30);
        store.write_timestamp(StateKey::NextReflectionTime, &pushed).unwrap();
        store.set_reflected(t0()).unwrap();

        for s in (1..1800).step_by(7) {
            let outcome = machine.tick(t0() + secs(s)).await.unwrap();
            assert!(matches!(outcome, TickOutcome::Alerted | TickOutcome::Snoozed), "{s}: {outcome:?}");
        }
        assert!(store.is_reflected());

        assert_eq!(
            machine.tick(pushed).await.unwrap(),
            TickOutcome::Rearmed(pushed + ChronoDuration::minutes(150))
        );
    }

    #[tokio::test]
    async fn test_already_reflected_when_due_rearms_without_alert() {
        let (_dir, store, mut machine) = setup(RecordingSink::default(), false, t0());
        store.set_reflected(t0() - secs(10)).unwrap();

        assert!(matches!(machine.tick(t0()).await.unwrap(), TickOutcome::Rearmed(_)));
        assert_eq!(machine.sink().notified(), 0);
    }

    #[tokio::test]
    async fn test_tool_failures_do_not_stop_the_loop() {
        let (_dir, store, mut machine) = setup(RecordingSink::failing(), true, t0());

        assert_eq!(machine.tick(t0()).await.unwrap(), TickOutcome::Alerted);
        assert_eq!(machine.tick(t0() + secs(600)).await.unwrap(), TickOutcome::Alerted);
        assert_eq!(machine.sink().notified(), 2);
        assert_eq!(machine.sink().spoken(), 2);

        store.set_reflected(t0()).unwrap();
        assert!(matches!(machine.tick(t0() + secs(601)).await.unwrap(), TickOutcome::Rearmed(_)));
    }

    #[tokio::test]
    async fn test_unreadable_state_still_alerts() {
        let (_dir, store, mut machine) = setup(RecordingSink::default(), true, t0());
        // A directory where the record should be: unreadable and not replaceable
        std::fs::remove_file(store.path_for(StateKey::WakeupTime)).unwrap();
        std::fs::create_dir(store.path_for(StateKey::WakeupTime)).unwrap();

        assert_eq!(machine.tick(t0()).await.unwrap(), TickOutcome::Alerted);
        assert_eq!(machine.sink().notified(), 1);
        assert_eq!(machine.sink().spoken(), 1);

        let alerts = machine.sink().notifications.lock().unwrap();
        assert_eq!(alerts[0].message, "It's 00:00 / 12:00. EOD in 10:00 (at 22:00).");
    }

    #[tokio::test]
    async fn test_missing_deadline_is_due_immediately() {
        let (_dir, store, mut machine) = setup(RecordingSink::default(), false, t0());
        store.delete(StateKey::NextReflectionTime).unwrap();

        assert_eq!(machine.tick(t0()).await.unwrap(), TickOutcome::Alerted);
        assert_eq!(store.read_timestamp(StateKey::NextReflectionTime).unwrap(), Some(t0()));
    }
}
