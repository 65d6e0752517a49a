//! Trace-level status buckets
//!
//! Span status codes win when the producer reported any; otherwise the bucket
//! falls back to duration thresholds.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::constants::{DEFAULT_ERROR_THRESHOLD_MS, DEFAULT_SLOW_THRESHOLD_MS};
use crate::data::types::{Span, TraceSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Success,
    Slow,
    Error,
}

impl TraceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Slow => "slow",
            Self::Error => "error",
        }
    }

    /// Case-insensitive; `None` for anything unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        [Self::Success, Self::Slow, Self::Error]
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationThresholds {
    pub slow_ms: f64,
    pub error_ms: f64,
}

impl Default for DurationThresholds {
    fn default() -> Self {
        Self {
            slow_ms: DEFAULT_SLOW_THRESHOLD_MS,
            error_ms: DEFAULT_ERROR_THRESHOLD_MS,
        }
    }
}

impl DurationThresholds {
    /// `< slow` success, `< error` slow, otherwise error
    pub fn classify(&self, duration_ms: f64) -> TraceStatus {
        if duration_ms < self.slow_ms {
            TraceStatus::Success
        } else if duration_ms < self.error_ms {
            TraceStatus::Slow
        } else {
            TraceStatus::Error
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SpanOutcome {
    failed: bool,
    reported: bool,
}

/// Per-trace digest of span status codes
#[derive(Debug, Clone, Default)]
pub struct TraceStatusIndex {
    outcomes: HashMap<String, SpanOutcome>,
}

impl TraceStatusIndex {
    pub fn from_spans(spans: &[Span]) -> Self {
        let mut outcomes: HashMap<String, SpanOutcome> = HashMap::new();
        for span in spans {
            let entry = outcomes.entry(span.trace_id.clone()).or_default();
            entry.failed |= span.status_code.is_failure();
            entry.reported |= span.status_code.is_known();
        }
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn resolve(&self, trace: &TraceSummary, thresholds: &DurationThresholds) -> TraceStatus {
        let duration_ms = trace.duration_ms();
        match self.outcomes.get(&trace.trace_id) {
            Some(outcome) if outcome.failed => TraceStatus::Error,
            Some(outcome) if outcome.reported => {
                if duration_ms >= thresholds.slow_ms {
                    TraceStatus::Slow
                } else {
                    TraceStatus::Success
                }
            }
            _ => thresholds.classify(duration_ms),
        }
    }
}

/// Status for one trace, with or without span knowledge
pub fn resolve_status(
    trace: &TraceSummary,
    thresholds: &DurationThresholds,
    statuses: Option<&TraceStatusIndex>,
) -> TraceStatus {
    match statuses {
        Some(index) => index.resolve(trace, thresholds),
        None => thresholds.classify(trace.duration_ms()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{StatusCode, Timestamp};

    fn make_trace(id: &str, duration_ms: i64) -> TraceSummary {
        TraceSummary::new(id, "root", Timestamp::from_millis(0), Timestamp::from_millis(duration_ms))
    }

    fn thresholds() -> DurationThresholds {
        DurationThresholds {
            slow_ms: 1_000.0,
            error_ms: 5_000.0,
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(TraceStatus::parse("Error"), Some(TraceStatus::Error));
        assert_eq!(TraceStatus::parse(" slow "), Some(TraceStatus::Slow));
        assert_eq!(TraceStatus::parse("broken"), None);
    }

    #[test]
    fn test_duration_heuristic_boundaries() {
        let t = thresholds();
        assert_eq!(t.classify(999.0), TraceStatus::Success);
        assert_eq!(t.classify(1_000.0), TraceStatus::Slow);
        assert_eq!(t.classify(4_999.0), TraceStatus::Slow);
        assert_eq!(t.classify(5_000.0), TraceStatus::Error);
    }

    #[test]
    fn test_span_failure_wins_over_duration() {
        let spans = vec![
            Span::new("fast", "a", "x").with_status(StatusCode::Ok),
            Span::new("fast", "b", "y").with_status(StatusCode::Timeout),
        ];
        let index = TraceStatusIndex::from_spans(&spans);
        assert_eq!(index.resolve(&make_trace("fast", 10), &thresholds()), TraceStatus::Error);
    }

    #[test]
    fn test_known_ok_status_caps_at_slow() {
        let spans = vec![Span::new("long", "a", "x").with_status(StatusCode::Ok)];
        let index = TraceStatusIndex::from_spans(&spans);
        assert_eq!(index.resolve(&make_trace("long", 60_000), &thresholds()), TraceStatus::Slow);
        assert_eq!(index.resolve(&make_trace("long", 10), &thresholds()), TraceStatus::Success);
    }

    #[test]
    fn test_unset_statuses_fall_back_to_heuristic() {
        let spans = vec![Span::new("t", "a", "x")];
        let index = TraceStatusIndex::from_spans(&spans);
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve(&make_trace("t", 60_000), &thresholds()), TraceStatus::Error);
        assert_eq!(
            resolve_status(&make_trace("other", 2_000), &thresholds(), Some(&index)),
            TraceStatus::Slow
        );
        assert_eq!(
            resolve_status(&make_trace("other", 20), &thresholds(), None),
            TraceStatus::Success
        );
    }
}
