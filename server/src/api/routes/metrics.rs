//! Aggregate metrics endpoint

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::AnalyticsApiState;
use crate::api::extractors::is_valid_id;
use crate::api::types::ApiError;
use crate::domain::filters::{self, TraceFilterParams};
use crate::domain::{TraceMetrics, TraceStatusIndex, compute_metrics};

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    /// Trace whose spans feed the span-level rates and breakdowns
    pub trace_id: Option<String>,
}

/// Metrics over the filtered trace list, plus span-level figures when a trace is given
pub async fn get_metrics(
    State(state): State<AnalyticsApiState>,
    Query(query): Query<MetricsQuery>,
    Query(params): Query<TraceFilterParams>,
) -> Result<Json<TraceMetrics>, ApiError> {
    let trace_id = query.trace_id.filter(|id| !id.trim().is_empty());
    if let Some(id) = trace_id.as_deref()
        && !is_valid_id(id)
    {
        return Err(ApiError::bad_request(
            "INVALID_TRACE_ID",
            "Invalid trace_id: too long",
        ));
    }

    let list = async {
        state
            .source
            .list_traces()
            .await
            .map_err(ApiError::from_upstream)
    };
    let spans = async {
        match trace_id.as_deref() {
            Some(id) => state.trace_spans(id).await,
            None => Ok(Vec::new()),
        }
    };
    let (traces, spans) = tokio::try_join!(list, spans)?;

    let statuses = TraceStatusIndex::from_spans(&spans);
    let ctx = state.filter_context().with_statuses(&statuses);
    let filtered = filters::apply(&traces, &params.parse(), &ctx);

    Ok(Json(compute_metrics(&filtered, &spans, &state.metrics)))
}
