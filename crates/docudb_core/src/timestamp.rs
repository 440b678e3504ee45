//! Record timestamps.
//!
//! Timestamps are stored as ISO-8601 UTC strings with millisecond precision,
//! e.g. `2026-10-16T09:30:00.123Z`. Values are kept truncated to whole
//! milliseconds so that a stored timestamp reads back equal to the original.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

/// Returns the current time truncated to milliseconds.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Returns a time strictly after `previous` (if any), normally the current time.
///
/// Used when a record is edited within the same millisecond as its last
/// change, or when the clock has stepped backwards.
#[must_use]
pub fn advance(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let current = now();
    match previous {
        Some(previous) if current <= previous => previous + Duration::milliseconds(1),
        _ => current,
    }
}

/// Formats a timestamp in the stored form.
#[must_use]
pub fn format(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp, normalizing it to UTC milliseconds.
#[must_use]
pub fn parse(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|time| time.with_timezone(&Utc).trunc_subsecs(3))
}
