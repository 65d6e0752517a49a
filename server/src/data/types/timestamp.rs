//! Lenient timestamp type for upstream payloads
//!
//! Timestamps arrive as ISO 8601 strings. They are parsed into a UTC instant at
//! deserialization time so that every comparison and subtraction downstream works
//! on instants, never on strings. Unparseable values are kept as "unparsed"
//! instead of failing the whole payload.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::utils::time::{diff_ms, millis_to_datetime, parse_iso_timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Timestamp(Option<DateTime<Utc>>);

impl Timestamp {
    /// Parse from an ISO 8601 string; unparseable input yields an unparsed timestamp
    pub fn parse(value: &str) -> Self {
        Self(parse_iso_timestamp(value))
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(Some(dt))
    }

    /// Build from epoch milliseconds
    pub fn from_millis(millis: i64) -> Self {
        Self(millis_to_datetime(millis))
    }

    pub fn unparsed() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_parsed(&self) -> bool {
        self.0.is_some()
    }

    /// Milliseconds from `origin` to this instant (negative when earlier)
    pub fn ms_since(&self, origin: DateTime<Utc>) -> Option<f64> {
        self.0.map(|dt| diff_ms(dt, origin))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

/// Unparsed timestamps sort before every parsed one
impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "-"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        let ts = match &value {
            JsonValue::String(s) => Self::parse(s),
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .map(Self::from_millis)
                .unwrap_or_default(),
            _ => Self::unparsed(),
        };
        if !ts.is_parsed() && !value.is_null() {
            tracing::debug!(value = %value, "Timestamp not parseable, treating as unparsed");
        }
        Ok(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_rfc3339() {
        let ts: Timestamp = serde_json::from_str(r#""2024-01-15T10:30:00Z""#).unwrap();
        assert!(ts.is_parsed());
        assert_eq!(ts.to_string(), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_deserialize_epoch_millis() {
        let ts: Timestamp = serde_json::from_str("1704067200000").unwrap();
        assert_eq!(ts, Timestamp::parse("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_deserialize_garbage_is_unparsed() {
        let ts: Timestamp = serde_json::from_str(r#""yesterday-ish""#).unwrap();
        assert!(!ts.is_parsed());
        let ts: Timestamp = serde_json::from_str("null").unwrap();
        assert!(!ts.is_parsed());
        let ts: Timestamp = serde_json::from_str(r#"{"nested": true}"#).unwrap();
        assert!(!ts.is_parsed());
    }

    #[test]
    fn test_serialize_roundtrip_shape() {
        let ts = Timestamp::parse("2024-01-15T10:30:00.250+01:00");
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            r#""2024-01-15T09:30:00.250Z""#
        );
        assert_eq!(serde_json::to_string(&Timestamp::unparsed()).unwrap(), "null");
    }

    #[test]
    fn test_ordering_uses_instants() {
        let earlier = Timestamp::parse("2024-01-15T10:30:00+02:00");
        let later = Timestamp::parse("2024-01-15T09:30:00Z");
        assert!(earlier < later);
        assert!(Timestamp::unparsed() < earlier);
    }

    #[test]
    fn test_ms_since() {
        let origin = Timestamp::from_millis(1_000).get().unwrap();
        assert_eq!(Timestamp::from_millis(1_250).ms_since(origin), Some(250.0));
        assert_eq!(Timestamp::unparsed().ms_since(origin), None);
    }
}
