//! DateTime parsing and formatting helpers.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Timestamp format used by the conversation export, e.g. `"2025-08-01 10:00:00"`.
pub const CONVERSATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a conversation timestamp in [`CONVERSATION_TIME_FORMAT`] as UTC.
///
/// The whole string must match: leading or trailing whitespace is rejected
/// like any other extra input. Returns `None` on mismatch; callers decide
/// whether that is recoverable.
pub fn parse_conversation_time(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() || s.trim() != s {
        return None;
    }

    NaiveDateTime::parse_from_str(s, CONVERSATION_TIME_FORMAT)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Format a [`DateTime<Utc>`] as a Neo4j Cypher datetime literal.
///
/// Output format: `"2024-01-15T10:30:00.000000000Z"` (ISO 8601, nanosecond precision, UTC).
pub fn format_neo4j_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string()
}
