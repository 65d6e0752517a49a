//! Span records as delivered by the span producer

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::attributes::Attributes;
use super::timestamp::Timestamp;
use crate::utils::json::null_as_default;
use crate::utils::time::diff_ms;

/// Span status code. Unrecognized values collapse to `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCode {
    Ok,
    Error,
    Timeout,
    #[default]
    Unset,
    Unknown,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Unset => "UNSET",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Case-insensitive parse; never fails
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        // OTEL exporters sometimes prefix the enum name
        let value = value
            .strip_prefix("STATUS_CODE_")
            .or_else(|| value.strip_prefix("status_code_"))
            .unwrap_or(value);
        if value.eq_ignore_ascii_case("ok") {
            Self::Ok
        } else if value.eq_ignore_ascii_case("error") {
            Self::Error
        } else if value.eq_ignore_ascii_case("timeout") {
            Self::Timeout
        } else if value.eq_ignore_ascii_case("unset") || value.is_empty() {
            Self::Unset
        } else {
            Self::Unknown
        }
    }

    /// Whether the producer reported an explicit outcome
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Ok | Self::Error | Self::Timeout)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Timeout)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Point-in-time event attached to a span
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Attributes,
}

fn default_kind() -> String {
    "INTERNAL".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub span_id: String,
    pub trace_id: String,
    #[serde(default)]
    pub parent_span_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_time: Timestamp,
    #[serde(default)]
    pub end_time: Timestamp,
    #[serde(default)]
    pub status_code: StatusCode,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Attributes,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<SpanEvent>,
    #[serde(default = "default_kind")]
    pub kind: String,
}

impl Span {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            span_id: span_id.into(),
            trace_id: trace_id.into(),
            parent_span_id: None,
            name: name.into(),
            start_time: Timestamp::unparsed(),
            end_time: Timestamp::unparsed(),
            status_code: StatusCode::Unset,
            status_message: None,
            attributes: Attributes::new(),
            events: Vec::new(),
            kind: default_kind(),
        }
    }

    pub fn with_parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    pub fn with_times(mut self, start: impl Into<Timestamp>, end: impl Into<Timestamp>) -> Self {
        self.start_time = start.into();
        self.end_time = end.into();
        self
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn with_event(mut self, name: impl Into<String>, timestamp: impl Into<Timestamp>) -> Self {
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp: timestamp.into(),
            attributes: Attributes::new(),
        });
        self
    }

    /// Parent id, with an empty string treated as absent
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_span_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Resolved `(start, end)` with `end >= start`.
    ///
    /// A missing end collapses onto the start and vice versa. `None` when neither
    /// bound parsed.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start_time.get(), self.end_time.get()) {
            (Some(start), Some(end)) => Some((start, end.max(start))),
            (Some(start), None) => Some((start, start)),
            (None, Some(end)) => Some((end, end)),
            (None, None) => None,
        }
    }

    /// Duration in ms after bounds resolution; 0 when unbounded
    pub fn duration_ms(&self) -> f64 {
        self.bounds()
            .map(|(start, end)| diff_ms(end, start))
            .unwrap_or(0.0)
    }
}
