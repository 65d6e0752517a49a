//! Trace-level summaries and upstream session labels

use serde::{Deserialize, Serialize};

use super::timestamp::Timestamp;
use crate::utils::time::diff_ms;

/// One row of the trace index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: String,
    #[serde(default)]
    pub root_span_name: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub start_time: Timestamp,
    #[serde(default)]
    pub end_time: Timestamp,
    #[serde(default = "default_span_count")]
    pub span_count: u64,
}

fn default_span_count() -> u64 {
    1
}

impl TraceSummary {
    pub fn new(
        trace_id: impl Into<String>,
        root_span_name: impl Into<String>,
        start_time: impl Into<Timestamp>,
        end_time: impl Into<Timestamp>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            root_span_name: root_span_name.into(),
            session_id: None,
            conversation_id: None,
            start_time: start_time.into(),
            end_time: end_time.into(),
            span_count: 1,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_span_count(mut self, span_count: u64) -> Self {
        self.span_count = span_count;
        self
    }

    /// `max(0, end - start)` in ms; 0 when either bound is unparsed
    pub fn duration_ms(&self) -> f64 {
        match (self.start_time.get(), self.end_time.get()) {
            (Some(start), Some(end)) => diff_ms(end, start).max(0.0),
            _ => 0.0,
        }
    }
}

/// Session label record from `GET /sessions/summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub first_message: Option<String>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub message_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trace_summary_duration() {
        let trace = TraceSummary::new(
            "t1",
            "chat.send_message",
            Timestamp::from_millis(1_000),
            Timestamp::from_millis(1_250),
        );
        assert_eq!(trace.duration_ms(), 250.0);

        let inverted = TraceSummary::new(
            "t2",
            "x",
            Timestamp::from_millis(2_000),
            Timestamp::from_millis(1_000),
        );
        assert_eq!(inverted.duration_ms(), 0.0);

        let unparsed = TraceSummary::new("t3", "x", Timestamp::unparsed(), Timestamp::from_millis(1));
        assert_eq!(unparsed.duration_ms(), 0.0);
    }

    #[test]
    fn test_trace_summary_deserialize() {
        let trace: TraceSummary = serde_json::from_value(json!({
            "trace_id": "abc",
            "root_span_name": "chat.send_message",
            "session_id": "s-1",
            "conversation_id": null,
            "start_time": "2024-01-15T10:30:00",
            "end_time": "2024-01-15T10:30:02",
            "span_count": 4
        }))
        .unwrap();
        assert_eq!(trace.span_count, 4);
        assert_eq!(trace.session_id.as_deref(), Some("s-1"));
        assert_eq!(trace.duration_ms(), 2000.0);
    }

    #[test]
    fn test_session_summary_deserialize_sparse() {
        let session: SessionSummary =
            serde_json::from_value(json!({"session_id": "s-1", "title": null})).unwrap();
        assert_eq!(session.title, None);
        assert_eq!(session.message_count, 0);
        assert!(!session.created_at.is_parsed());
    }
}
