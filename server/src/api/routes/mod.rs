//! API route handlers

pub mod health;
pub mod metrics;
pub mod sessions;
pub mod traces;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::Utc;

use crate::api::types::ApiError;
use crate::data::TraceSource;
use crate::data::types::Span;
use crate::domain::{DurationThresholds, FilterContext, MetricsOptions, TimelineOptions};

/// Shared state for the analytics endpoints
#[derive(Clone)]
pub struct AnalyticsApiState {
    pub source: Arc<dyn TraceSource>,
    pub thresholds: DurationThresholds,
    pub timeline: TimelineOptions,
    pub metrics: MetricsOptions,
}

impl AnalyticsApiState {
    /// Filter context anchored at the current time
    fn filter_context<'a>(&self) -> FilterContext<'a> {
        FilterContext::new(Utc::now()).with_thresholds(self.thresholds)
    }

    /// Spans of one trace; an upstream 404 or an empty list means unknown trace
    async fn trace_spans(&self, trace_id: &str) -> Result<Vec<Span>, ApiError> {
        match self.source.get_trace(trace_id).await {
            Ok(spans) if spans.is_empty() => Err(ApiError::trace_not_found(trace_id)),
            Ok(spans) => Ok(spans),
            Err(e) if e.is_not_found() => Err(ApiError::trace_not_found(trace_id)),
            Err(e) => Err(ApiError::from_upstream(e)),
        }
    }
}

/// Build analytics routes (mounted under the API prefix)
pub fn routes(state: AnalyticsApiState) -> Router<()> {
    Router::new()
        .route("/health", get(health::health))
        .route("/traces", get(traces::list_traces))
        .route("/traces/{trace_id}/tree", get(traces::get_trace_tree))
        .route("/traces/{trace_id}/timeline", get(traces::get_trace_timeline))
        .route("/traces/{trace_id}/spans", get(traces::search_trace_spans))
        .route("/metrics", get(metrics::get_metrics))
        .route("/sessions", get(sessions::list_sessions))
        .with_state(state)
}
