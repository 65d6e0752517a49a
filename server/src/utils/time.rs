//! Time utility functions

use chrono::{DateTime, NaiveDateTime, Utc};

/// Naive layouts accepted when a timestamp carries no offset (interpreted as UTC)
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse an ISO 8601 timestamp into a UTC instant.
///
/// Accepts RFC 3339 (with `Z` or a numeric offset), `+HHMM` offsets, and naive
/// date-times which are taken to be UTC. Returns `None` for anything else.
pub fn parse_iso_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, format) {
            return Some(naive.and_utc());
        }
    }

    tracing::debug!(ts, "Unparseable timestamp");
    None
}

/// Convert milliseconds since Unix epoch to DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Signed distance `later - earlier` in fractional milliseconds (microsecond precision)
pub fn diff_ms(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1000.0,
        None => delta.num_milliseconds() as f64,
    }
}

/// Human readable duration label used for axis ticks and CLI output
pub fn format_duration_ms(ms: f64) -> String {
    if !ms.is_finite() || ms <= 0.0 {
        return "0ms".to_string();
    }
    if ms < 1.0 {
        return format!("{:.0}µs", ms * 1000.0);
    }
    if ms < 1000.0 {
        return format!("{}ms", trim_fraction(ms, 1));
    }
    let secs = ms / 1000.0;
    if secs < 60.0 {
        return format!("{}s", trim_fraction(secs, 2));
    }
    let minutes = (secs / 60.0).floor();
    let rem = secs - minutes * 60.0;
    if rem < 0.5 {
        format!("{}m", minutes as u64)
    } else {
        format!("{}m {}s", minutes as u64, rem.round() as u64)
    }
}

fn trim_fraction(value: f64, digits: usize) -> String {
    let formatted = format!("{:.*}", digits, value);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}
