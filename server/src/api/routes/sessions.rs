//! Session grouping endpoint

use axum::Json;
use axum::extract::State;

use super::AnalyticsApiState;
use crate::api::types::ApiError;
use crate::domain::{SessionGrouping, group_by_session};

/// Traces grouped by session; labels are best effort
pub async fn list_sessions(
    State(state): State<AnalyticsApiState>,
) -> Result<Json<SessionGrouping>, ApiError> {
    let (traces, labels) = tokio::join!(state.source.list_traces(), state.source.session_labels());
    let traces = traces.map_err(ApiError::from_upstream)?;
    Ok(Json(group_by_session(&traces, &labels)))
}
