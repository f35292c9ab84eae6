//! Serde adapter for optional local times written as `HH:MM`.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%H:%M";

pub fn format(time: &NaiveTime) -> String {
    time.format(FORMAT).to_string()
}

/// Accepts `HH:MM` and `HH:MM:SS`; empty input means no time. Seconds are dropped so
/// the parsed value is exactly what gets stored.
pub fn parse(s: &str) -> anyhow::Result<Option<NaiveTime>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(s, FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0))
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))
}

pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(t) => serializer.serialize_str(&format(t)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(s) => parse(&s).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
