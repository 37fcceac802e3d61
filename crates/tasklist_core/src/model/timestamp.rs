//! Serde format for persisted task timestamps.
//!
//! Writes RFC 3339 UTC text with millisecond precision
//! (`2024-05-01T10:20:30.123Z`). Reads RFC 3339 text with any offset, or a
//! Unix epoch-milliseconds integer. Any other value (`null`, unparseable
//! text, out-of-range numbers) reads as the current time so one damaged
//! record never fails the whole collection.

use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use log::warn;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serializer};

/// Current time truncated to the persisted millisecond precision.
///
/// Truncation keeps a freshly created task equal to its own hydrated copy.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Formats a timestamp the way it is persisted.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses persisted timestamp text into a UTC timestamp.
pub fn parse(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text.trim()).map(|value| value.with_timezone(&Utc))
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        EpochMillis(i64),
        Other(IgnoredAny),
    }

    let decoded = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Text(text) => parse(&text).ok(),
        RawTimestamp::EpochMillis(millis) => Utc.timestamp_millis_opt(millis).single(),
        RawTimestamp::Other(_) => None,
    };

    Ok(decoded.unwrap_or_else(|| {
        warn!(
            "event=task_decode module=model status=fallback field=createdAt reason=invalid_timestamp"
        );
        now()
    }))
}
