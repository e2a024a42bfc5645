//! Timestamp parsing and display for the `yyyy-MM-dd HH:mm:ss[.SSS]` wire format.
//!
//! Usable as a serde field adapter: `#[serde(with = "crate::core::timestamp")]`.

use super::transaction::TransactionError;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

const FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a timestamp, accepting space or `T` separators, optional fractional
/// seconds, or a bare date (midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, TransactionError> {
    let s = s.trim();
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(TransactionError::InvalidTimestamp(s.to_string()))
}

/// Display form; milliseconds only appear when the value has a sub-second part.
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(dt))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_timestamp(&s).map_err(|err| serde::de::Error::custom(err.to_string()))
}
