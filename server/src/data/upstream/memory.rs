//! In-memory trace source backed by a JSON fixture
//!
//! Lets the CLI and the query API run offline over a span dump. The trace index
//! is derived from the spans the same way the producer derives it.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use super::error::UpstreamError;
use super::source::TraceSource;
use crate::data::types::{SessionSummary, Span, TraceSummary};
use crate::domain::summary::summarize_traces;

/// Accepted fixture layouts: a bare span array, or spans plus session labels
#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Spans(Vec<Span>),
    Bundle {
        spans: Vec<Span>,
        #[serde(default)]
        sessions: Vec<SessionSummary>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTraceSource {
    spans: Vec<Span>,
    traces: Vec<TraceSummary>,
    sessions: Vec<SessionSummary>,
}

impl MemoryTraceSource {
    pub fn new(spans: Vec<Span>, sessions: Vec<SessionSummary>) -> Self {
        let traces = summarize_traces(&spans);
        Self {
            spans,
            traces,
            sessions,
        }
    }

    pub async fn load(path: &Path) -> Result<Self, UpstreamError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let fixture: FixtureFile = serde_json::from_str(&raw)
            .map_err(|e| UpstreamError::Fixture(format!("{}: {}", path.display(), e)))?;
        let (spans, sessions) = match fixture {
            FixtureFile::Spans(spans) => (spans, Vec::new()),
            FixtureFile::Bundle { spans, sessions } => (spans, sessions),
        };
        tracing::debug!(
            path = %path.display(),
            spans = spans.len(),
            sessions = sessions.len(),
            "Loaded span fixture"
        );
        Ok(Self::new(spans, sessions))
    }
}

#[async_trait]
impl TraceSource for MemoryTraceSource {
    async fn list_traces(&self) -> Result<Vec<TraceSummary>, UpstreamError> {
        Ok(self.traces.clone())
    }

    async fn get_trace(&self, trace_id: &str) -> Result<Vec<Span>, UpstreamError> {
        Ok(self
            .spans
            .iter()
            .filter(|s| s.trace_id == trace_id)
            .cloned()
            .collect())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, UpstreamError> {
        Ok(self.sessions.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_bare_span_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"span_id": "a", "trace_id": "t1", "name": "root",
                  "start_time": "2024-01-15T10:30:00", "end_time": "2024-01-15T10:30:01"}},
                {{"span_id": "b", "trace_id": "t2", "name": "other",
                  "start_time": "2024-01-15T11:30:00", "end_time": "2024-01-15T11:30:01"}}
            ]"#
        )
        .unwrap();

        let source = MemoryTraceSource::load(file.path()).await.unwrap();
        let traces = source.list_traces().await.unwrap();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].trace_id, "t2");
        assert_eq!(source.get_trace("t1").await.unwrap().len(), 1);
        assert!(source.get_trace("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_bundle_with_sessions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"spans": [], "sessions": [{{"session_id": "s1", "title": "Hello"}}]}}"#
        )
        .unwrap();

        let source = MemoryTraceSource::load(file.path()).await.unwrap();
        let sessions = source.session_labels().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = MemoryTraceSource::load(file.path()).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Fixture(_)));
    }
}
