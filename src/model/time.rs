// Time arithmetic on UTC timestamps with fractional seconds

use chrono::{DateTime, Duration, Utc};

/// Shift a timestamp by a (possibly negative) number of seconds, at
/// nanosecond resolution
pub fn add_seconds(t: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    t + Duration::nanoseconds((seconds * 1e9).round() as i64)
}

/// `later - earlier` in seconds
pub fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 * 1e-9,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}
