use chrono::{SecondsFormat, Utc};

/// Current instant as an RFC 3339 UTC timestamp with millisecond precision.
pub fn current_utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
