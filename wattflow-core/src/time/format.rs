use super::*;

/// Naive timestamp with a space separator; `%.f` makes the fraction optional.
const SPACE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Naive timestamp with an ISO-8601 `T` separator.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Layout used when writing timestamps: millisecond precision.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Parse a naive timestamp into milliseconds since the Unix epoch.
///
/// The value is interpreted as UTC wall time and truncated to milliseconds.
/// Timezone-qualified inputs (`Z`, `+01:00`) are rejected.
pub fn parse_event_time(value: &str) -> Result<EventTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, SPACE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, ISO_FORMAT))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Format an event time as a naive timestamp with millisecond precision.
///
/// Values outside chrono's representable range fall back to `<ms>ms`.
pub fn format_event_time(ts: EventTime) -> String {
    match DateTime::from_timestamp_millis(ts) {
        Some(dt) => dt.naive_utc().format(OUTPUT_FORMAT).to_string(),
        None => format!("{ts}ms"),
    }
}
