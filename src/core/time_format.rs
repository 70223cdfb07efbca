//! Signed `HH:MM[:SS]` rendering of the gap between two instants.

use chrono::{DateTime, Duration, Utc};

/// Render the magnitude of `delta` as `HH:MM:SS` (or `HH:MM`).
///
/// Hours are not wrapped at 24 and sub-second remainders are truncated.
pub fn format_time_delta(delta: Duration, seconds: bool) -> String {
    let total = delta.num_seconds().unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;

    if seconds {
        format!("{hours:02}:{minutes:02}:{:02}", total % 60)
    } else {
        format!("{hours:02}:{minutes:02}")
    }
}

/// Format `|a - b|`, prefixed with `-` when `b` is later than `a`.
pub fn fmt_time_diff(a: DateTime<Utc>, b: DateTime<Utc>, seconds: bool) -> String {
    let magnitude = format_time_delta(a - b, seconds);
    if b > a {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}
