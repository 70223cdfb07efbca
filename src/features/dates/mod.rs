//! # Feature: Free-form Dates
//!
//! Turns the text given to `--set-wakeup`, `--set-reflection` and
//! `--set-eod` into an absolute instant.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Relative offsets (`in 30m`, `+1h30m`) and explicit zones
//! - 1.0.0: Initial release with ISO dates, clock times and day words

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::core::{ReflectError, ReflectResult};

fn wall_clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?x)^
            (?:
                (?P<word>today|tomorrow|yesterday)
              | (?P<year>\d{4})[-/](?P<month>\d{1,2})[-/](?P<day>\d{1,2})
            )?
            (?:
                (?:\s+at\s+|\s+|t|at\s+)?
                (?P<hour>\d{1,2})
                (?::(?P<minute>\d{2}))?
                (?::(?P<second>\d{2})(?:\.\d+)?)?
                \s*(?P<meridiem>am|pm|a\.m\.|p\.m\.)?
            )?
            $",
        )
        .expect("wall clock pattern is valid")
    })
}

fn zone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?P<utc>utc|gmt|z)|(?P<sign>[+-])(?P<hh>\d{2}):?(?P<mm>\d{2}))$")
            .expect("zone pattern is valid")
    })
}

/// Parse free-form date/time text relative to `now`.
///
/// Wall-clock input without an explicit zone is read in `now`'s timezone.
pub fn parse_datetime<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> ReflectResult<DateTime<Utc>> {
    let fail = || ReflectError::parse(text);
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(fail());
    }

    if normalized == "now" {
        return Ok(now.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(offset) = relative_offset(&normalized) {
        return Ok(now.with_timezone(&Utc) + offset);
    }

    let (wall_clock, zone) = split_zone(&normalized);
    match zone {
        Some(offset) => {
            let local_now = now.with_timezone(&offset);
            let naive = parse_wall_clock(wall_clock, local_now.date_naive()).ok_or_else(fail)?;
            resolve(&offset, &naive).ok_or_else(fail)
        }
        None => {
            let naive = parse_wall_clock(wall_clock, now.date_naive()).ok_or_else(fail)?;
            resolve(&now.timezone(), &naive).ok_or_else(fail)
        }
    }
}

/// `in 1h30m` or `+45m`
fn relative_offset(text: &str) -> Option<Duration> {
    let rest = text
        .strip_prefix("in ")
        .or_else(|| text.strip_prefix('+'))?;
    parse_duration(rest).map(Duration::seconds)
}

/// Parse a time duration string like "30m", "2h", "1d", "1h30m" into seconds
fn parse_duration(time_str: &str) -> Option<i64> {
    let time_str = time_str.trim().to_lowercase();
    let mut total_seconds: i64 = 0;
    let mut current_number = String::new();

    for c in time_str.chars() {
        if c.is_ascii_digit() {
            current_number.push(c);
        } else if c.is_whitespace() {
            continue;
        } else if !current_number.is_empty() {
            let value: i64 = current_number.parse().ok()?;
            current_number.clear();

            let seconds = match c {
                's' => value,
                'm' => value.checked_mul(60)?,
                'h' => value.checked_mul(60 * 60)?,
                'd' => value.checked_mul(60 * 60 * 24)?,
                'w' => value.checked_mul(60 * 60 * 24 * 7)?,
                _ => return None,
            };
            total_seconds = total_seconds.checked_add(seconds)?;
        } else {
            return None;
        }
    }

    // Trailing digits without a unit are ambiguous
    if !current_number.is_empty() || total_seconds <= 0 {
        return None;
    }
    // Keep well inside what chrono can add to a timestamp
    (total_seconds <= 100 * 365 * 24 * 60 * 60).then_some(total_seconds)
}

/// Peel a trailing zone token (`utc`, `z`, `+02:00`) off the text
fn split_zone(text: &str) -> (&str, Option<FixedOffset>) {
    if let Some((head, last)) = text.rsplit_once(char::is_whitespace) {
        if let Some(offset) = zone_offset(last) {
            return (head.trim_end(), Some(offset));
        }
    }
    // `09:00z` / `2024-01-01t09:00z`
    if let Some(head) = text.strip_suffix('z') {
        if head.ends_with(|c: char| c.is_ascii_digit()) {
            return (head, FixedOffset::east_opt(0));
        }
    }
    (text, None)
}

fn zone_offset(token: &str) -> Option<FixedOffset> {
    let caps = zone_pattern().captures(token)?;
    if caps.name("utc").is_some() {
        return FixedOffset::east_opt(0);
    }
    let hours: i32 = caps["hh"].parse().ok()?;
    let minutes: i32 = caps["mm"].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    match &caps["sign"] {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

fn parse_wall_clock(text: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    let caps = wall_clock_pattern().captures(text.trim())?;

    let date = if let Some(word) = caps.name("word") {
        match word.as_str() {
            "tomorrow" => today.succ_opt()?,
            "yesterday" => today.pred_opt()?,
            _ => today,
        }
    } else if let Some(year) = caps.name("year") {
        NaiveDate::from_ymd_opt(
            year.as_str().parse().ok()?,
            caps["month"].parse().ok()?,
            caps["day"].parse().ok()?,
        )?
    } else {
        today
    };
    let has_date = caps.name("word").is_some() || caps.name("year").is_some();

    let time = match caps.name("hour") {
        None if has_date => NaiveTime::MIN,
        None => return None,
        Some(hour) => {
            let hour: u32 = hour.as_str().parse().ok()?;
            let minute: u32 = caps.name("minute").map_or(Some(0), |m| m.as_str().parse().ok())?;
            let second: u32 = caps.name("second").map_or(Some(0), |s| s.as_str().parse().ok())?;

            let hour = match caps.name("meridiem").map(|m| m.as_str().starts_with('p')) {
                Some(is_pm) => {
                    if !(1..=12).contains(&hour) {
                        return None;
                    }
                    (hour % 12) + if is_pm { 12 } else { 0 }
                }
                // A lone number is a day-of-month to some parsers, an hour to others
                None if caps.name("minute").is_none() => return None,
                None => hour,
            };
            NaiveTime::from_hms_opt(hour, minute, second)?
        }
    };

    Some(date.and_time(time))
}

/// Pin a wall-clock reading to an instant; DST gaps have none
fn resolve<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
