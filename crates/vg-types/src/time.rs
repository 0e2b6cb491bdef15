//! Timestamp parsing and ISO-8601 rendering.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Date-time layouts accepted without an explicit offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A successfully parsed event timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    /// An absolute instant carrying its own offset.
    Zoned(DateTime<FixedOffset>),
    /// A wall-clock reading with no offset; it is read in whatever zone the
    /// consumer evaluates hours in.
    Naive(NaiveDateTime),
}

/// Parse a timestamp string.
///
/// Returns `None` for anything unrecognised; callers treat that as "no
/// timestamp" rather than an error.
pub fn parse_timestamp(text: &str) -> Option<ParsedTimestamp> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(ParsedTimestamp::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(ParsedTimestamp::Zoned(dt));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(ParsedTimestamp::Naive(naive));
    }

    // Date-only strings are UTC midnight
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| ParsedTimestamp::Zoned(Utc.from_utc_datetime(&midnight).into()))
}

/// Convert Unix epoch milliseconds into a timestamp.
pub fn from_epoch_millis(millis: i64) -> Option<ParsedTimestamp> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| ParsedTimestamp::Zoned(dt.into()))
}

/// Render an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn to_iso_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Serde adapter writing `DateTime<Utc>` with millisecond precision and a
/// `Z` suffix.
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso_millis(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
