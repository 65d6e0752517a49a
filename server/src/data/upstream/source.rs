use async_trait::async_trait;

use super::error::UpstreamError;
use crate::data::types::{SessionSummary, Span, TraceSummary};

/// Read-only access to the span producer
#[async_trait]
pub trait TraceSource: Send + Sync + std::fmt::Debug {
    /// Trace index (`GET /traces`)
    async fn list_traces(&self) -> Result<Vec<TraceSummary>, UpstreamError>;

    /// All spans of one trace (`GET /traces/{trace_id}`)
    async fn get_trace(&self, trace_id: &str) -> Result<Vec<Span>, UpstreamError>;

    /// Session labels (`GET /sessions/summary`)
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, UpstreamError>;

    /// Human-readable backend name
    fn name(&self) -> &'static str;

    /// Session labels, degrading to none when the producer cannot supply them
    async fn session_labels(&self) -> Vec<SessionSummary> {
        match self.list_sessions().await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(
                    source = self.name(),
                    error = %e,
                    "Session labels unavailable, grouping without titles"
                );
                Vec::new()
            }
        }
    }
}
