//! # Feature: State Reporter
//!
//! Human-readable view of the current day, meant for `--get-state` and
//! status-bar widgets.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

use crate::core::fmt_time_diff;
use crate::features::state::StateSnapshot;

/// Prefix on the reflection line once the deadline has passed
pub const DUE_MARKER: &str = "NOW! ";

impl StateSnapshot {
    /// Elapsed time since wakeup
    pub fn j_time(&self, now: DateTime<Utc>, seconds: bool) -> String {
        fmt_time_diff(now, self.wakeup_time, seconds)
    }

    /// Time left until bedtime, `-` once it has passed
    pub fn eod(&self, now: DateTime<Utc>, seconds: bool) -> String {
        fmt_time_diff(self.bedtime, now, seconds)
    }

    pub fn reflection_due(&self, now: DateTime<Utc>) -> bool {
        self.next_reflection_time <= now
    }
}

/// Render the state report, with clock times in `now`'s timezone
pub fn render_report<Tz>(snapshot: &StateSnapshot, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let clock = |instant: DateTime<Utc>, fmt: &str| instant.with_timezone(&tz).format(fmt).to_string();

    let due = if snapshot.reflection_due(now_utc) { DUE_MARKER } else { "" };

    let lines = [
        format!("         J-Time: {}", snapshot.j_time(now_utc, true)),
        format!(
            "     End of Day: {} {}",
            snapshot.eod(now_utc, true),
            clock(snapshot.bedtime, "%H:%M")
        ),
        format!(
            "Next Reflection: {}{} {}",
            due,
            fmt_time_diff(snapshot.next_reflection_time, now_utc, true),
            clock(snapshot.next_reflection_time, "%H:%M")
        ),
        format!("         Wakeup: {}", clock(snapshot.wakeup_time, "%H:%M  %a")),
        format!("        Bedtime: {}", clock(snapshot.bedtime, "%H:%M")),
    ];

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn snapshot() -> StateSnapshot {
        let wakeup = zone().with_ymd_and_hms(2024, 5, 6, 7, 0, 0).unwrap().with_timezone(&Utc);
        StateSnapshot {
            wakeup_time: wakeup,
            bedtime: wakeup + Duration::hours(14),
            next_reflection_time: wakeup + Duration::hours(5),
            reflected: false,
        }
    }

    #[test]
    fn test_report_before_deadline() {
        let now = zone().with_ymd_and_hms(2024, 5, 6, 10, 15, 30).unwrap();
        let report = render_report(&snapshot(), &now);

        assert_eq!(
            report,
            "         J-Time: 03:15:30\n\
             \x20    End of Day: 10:44:30 21:00\n\
             Next Reflection: 01:44:30 12:00\n\
             \x20        Wakeup: 07:00  Mon\n\
             \x20       Bedtime: 21:00\n"
        );
    }

    #[test]
    fn test_report_when_overdue() {
        let now = zone().with_ymd_and_hms(2024, 5, 6, 22, 0, 5).unwrap();
        let report = render_report(&snapshot(), &now);

        assert!(report.contains("J-Time: 15:00:05\n"), "{report}");
        assert!(report.contains("End of Day: -01:00:05 21:00\n"), "{report}");
        assert!(report.contains("Next Reflection: NOW! -10:00:05 12:00\n"), "{report}");
    }

    #[test]
    fn test_due_exactly_at_deadline() {
        let snap = snapshot();
        let now = snap.next_reflection_time.with_timezone(&zone());
        let report = render_report(&snap, &now);
        assert!(report.contains("Next Reflection: NOW! 00:00:00 12:00"), "{report}");
    }

    #[test]
    fn test_clock_times_follow_requested_zone() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap();
        let report = render_report(&snapshot(), &now);
        assert!(report.contains("Wakeup: 06:00  Mon"), "{report}");
        assert!(report.contains("Bedtime: 20:00"), "{report}");
    }

    #[test]
    fn test_repeated_reports_only_move_live_fields() {
        let snap = snapshot();
        let first = zone().with_ymd_and_hms(2024, 5, 6, 13, 0, 0).unwrap();
        let a = render_report(&snap, &first);
        let b = render_report(&snap, &first);
        assert_eq!(a, b);

        let later = render_report(&snap, &(first + Duration::seconds(61)));
        assert!(a.contains("J-Time: 06:00:00"));
        assert!(later.contains("J-Time: 06:01:01"));
        assert!(a.contains("NOW! -01:00:00"));
        assert!(later.contains("NOW! -01:01:01"));
        assert_eq!(a.lines().nth(3), later.lines().nth(3));
        assert_eq!(a.lines().nth(4), later.lines().nth(4));
    }
}
