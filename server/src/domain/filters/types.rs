//! Filter vocabulary and lenient parsing of raw filter input

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::status::TraceStatus;
use crate::utils::string::non_empty;

/// Relative recency window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "15m")]
    Last15Minutes,
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "6h")]
    Last6Hours,
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    const ALL: [Self; 7] = [
        Self::Last15Minutes,
        Self::LastHour,
        Self::Last6Hours,
        Self::Last24Hours,
        Self::Last7Days,
        Self::Last30Days,
        Self::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last15Minutes => "15m",
            Self::LastHour => "1h",
            Self::Last6Hours => "6h",
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(value))
    }

    /// Window length; `None` for the unbounded range
    pub fn window(&self) -> Option<Duration> {
        match self {
            Self::Last15Minutes => Some(Duration::minutes(15)),
            Self::LastHour => Some(Duration::hours(1)),
            Self::Last6Hours => Some(Duration::hours(6)),
            Self::Last24Hours => Some(Duration::hours(24)),
            Self::Last7Days => Some(Duration::days(7)),
            Self::Last30Days => Some(Duration::days(30)),
            Self::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Timestamp,
    Duration,
    SpanCount,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Duration => "duration",
            Self::SpanCount => "span_count",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "timestamp" | "start_time" | "starttime" => Some(Self::Timestamp),
            "duration" => Some(Self::Duration),
            "span_count" | "spancount" => Some(Self::SpanCount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "desc" | "descending" => Some(Self::Desc),
            "asc" | "ascending" => Some(Self::Asc),
            _ => None,
        }
    }
}

/// Typed filter; every field is optional and fields combine with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceFilter {
    pub search: Option<String>,
    pub min_duration_ms: Option<f64>,
    pub max_duration_ms: Option<f64>,
    pub status: Option<TraceStatus>,
    pub session_id: Option<String>,
    pub date_range: Option<DateRange>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl TraceFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_duration_bounds(mut self, min_ms: Option<f64>, max_ms: Option<f64>) -> Self {
        self.min_duration_ms = min_ms;
        self.max_duration_ms = max_ms;
        self
    }

    pub fn with_status(mut self, status: TraceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    pub fn sorted(mut self, sort_by: SortField, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

/// Raw filter input as received from a query string, JSON body or CLI flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceFilterParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_duration: Option<String>,
    #[serde(default)]
    pub max_duration: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub date_range: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
}

impl TraceFilterParams {
    /// Lenient conversion: an unusable value disables its own field only
    pub fn parse(&self) -> TraceFilter {
        TraceFilter {
            search: non_empty(self.search.as_deref()).map(str::to_string),
            min_duration_ms: parse_field("min_duration", &self.min_duration, parse_duration_bound),
            max_duration_ms: parse_field("max_duration", &self.max_duration, parse_duration_bound),
            status: parse_field("status", &self.status, TraceStatus::parse),
            session_id: non_empty(self.session_id.as_deref()).map(str::to_string),
            date_range: parse_field("date_range", &self.date_range, DateRange::parse),
            sort_by: parse_field("sort_by", &self.sort_by, SortField::parse).unwrap_or_default(),
            sort_order: parse_field("sort_order", &self.sort_order, SortOrder::parse)
                .unwrap_or_default(),
        }
    }
}

fn parse_duration_bound(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_field<T>(
    field: &'static str,
    raw: &Option<String>,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = non_empty(raw.as_deref())?;
    let parsed = parse(raw);
    if parsed.is_none() {
        tracing::debug!(field, value = raw, "Ignoring unrecognized filter value");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TraceFilterParams {
        TraceFilterParams::default()
    }

    #[test]
    fn test_empty_params_parse_to_default() {
        assert_eq!(params().parse(), TraceFilter::default());
    }

    #[test]
    fn test_non_numeric_duration_is_ignored() {
        let filter = TraceFilterParams {
            min_duration: Some("abc".into()),
            max_duration: Some("250".into()),
            ..params()
        }
        .parse();
        assert_eq!(filter.min_duration_ms, None);
        assert_eq!(filter.max_duration_ms, Some(250.0));
    }

    #[test]
    fn test_negative_and_infinite_durations_are_ignored() {
        let filter = TraceFilterParams {
            min_duration: Some("-5".into()),
            max_duration: Some("inf".into()),
            ..params()
        }
        .parse();
        assert_eq!(filter.min_duration_ms, None);
        assert_eq!(filter.max_duration_ms, None);
    }

    #[test]
    fn test_unrecognized_enums_fall_back() {
        let filter = TraceFilterParams {
            status: Some("meh".into()),
            date_range: Some("3w".into()),
            sort_by: Some("cost".into()),
            sort_order: Some("sideways".into()),
            ..params()
        }
        .parse();
        assert_eq!(filter.status, None);
        assert_eq!(filter.date_range, None);
        assert_eq!(filter.sort_by, SortField::Timestamp);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_recognized_values() {
        let filter = TraceFilterParams {
            search: Some("  chat ".into()),
            status: Some("SLOW".into()),
            session_id: Some("s-1".into()),
            date_range: Some("24h".into()),
            sort_by: Some("spanCount".into()),
            sort_order: Some("asc".into()),
            ..params()
        }
        .parse();
        assert_eq!(filter.search.as_deref(), Some("chat"));
        assert_eq!(filter.status, Some(TraceStatus::Slow));
        assert_eq!(filter.session_id.as_deref(), Some("s-1"));
        assert_eq!(filter.date_range, Some(DateRange::Last24Hours));
        assert_eq!(filter.sort_by, SortField::SpanCount);
        assert_eq!(filter.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_sort_field_aliases() {
        assert_eq!(SortField::parse("start_time"), Some(SortField::Timestamp));
        assert_eq!(SortField::parse("span_count"), Some(SortField::SpanCount));
        assert_eq!(SortField::parse("Duration"), Some(SortField::Duration));
    }

    #[test]
    fn test_date_range_windows() {
        assert_eq!(DateRange::parse("all"), Some(DateRange::All));
        assert_eq!(DateRange::All.window(), None);
        assert_eq!(DateRange::Last15Minutes.window(), Some(Duration::minutes(15)));
        assert_eq!(DateRange::parse("7D"), Some(DateRange::Last7Days));
    }
}
