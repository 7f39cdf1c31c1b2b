use chrono::{SecondsFormat, Utc};

/// The current UTC datetime as an RFC 9557 string, e.g.
/// `2026-08-06T12:30:00.123Z[UTC]`.
pub fn current_datetime_rfc9557() -> String {
    format!("{}[UTC]", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}
