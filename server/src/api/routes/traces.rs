//! Trace API endpoints

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AnalyticsApiState;
use crate::api::extractors::{TracePath, ValidatedQuery};
use crate::api::types::{
    ApiError, PaginationMeta, default_limit, default_page, paginate, validate_limit,
    validate_page,
};
use crate::data::types::TraceSummary;
use crate::domain::filters::{self, FilterContext, QuickStats, TraceFilterParams};
use crate::domain::timeline::{self, CollapsedSet, TimelineLayout};
use crate::domain::{SpanForest, TraceStatus, build_span_tree};

#[derive(Debug, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
}

/// Trace row with its derived duration and status bucket
#[derive(Debug, Serialize)]
pub struct TraceListItem {
    #[serde(flatten)]
    pub trace: TraceSummary,
    pub duration_ms: f64,
    pub status: TraceStatus,
}

impl TraceListItem {
    fn new(trace: TraceSummary, ctx: &FilterContext<'_>) -> Self {
        Self {
            duration_ms: trace.duration_ms(),
            status: ctx.status_of(&trace),
            trace,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TraceListResponse {
    pub data: Vec<TraceListItem>,
    pub quick_stats: QuickStats,
    pub meta: PaginationMeta,
}

/// List traces. Unusable filter values are ignored rather than rejected.
pub async fn list_traces(
    State(state): State<AnalyticsApiState>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
    Query(params): Query<TraceFilterParams>,
) -> Result<Json<TraceListResponse>, ApiError> {
    let traces = state
        .source
        .list_traces()
        .await
        .map_err(ApiError::from_upstream)?;

    let filter = params.parse();
    let ctx = state.filter_context();
    let filtered = filters::apply(&traces, &filter, &ctx);
    let quick_stats = filters::quick_stats(&filtered, &ctx);

    let items: Vec<TraceListItem> = filtered
        .into_iter()
        .map(|t| TraceListItem::new(t, &ctx))
        .collect();
    let (data, meta) = paginate(items, page.page, page.limit);

    Ok(Json(TraceListResponse {
        data,
        quick_stats,
        meta,
    }))
}

pub async fn get_trace_tree(
    State(state): State<AnalyticsApiState>,
    path: TracePath,
) -> Result<Json<SpanForest>, ApiError> {
    let spans = state.trace_spans(&path.trace_id).await?;
    Ok(Json(build_span_tree(&spans)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TimelineQuery {
    /// Viewport width in pixels
    #[validate(range(
        min = 100.0,
        max = 20000.0,
        message = "width must be between 100 and 20000"
    ))]
    pub width: Option<f64>,
    /// Comma-separated span ids whose descendants are hidden
    pub collapsed: Option<String>,
}

impl TimelineQuery {
    fn collapsed_set(&self) -> CollapsedSet {
        self.collapsed
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub async fn get_trace_timeline(
    State(state): State<AnalyticsApiState>,
    path: TracePath,
    ValidatedQuery(query): ValidatedQuery<TimelineQuery>,
) -> Result<Json<TimelineLayout>, ApiError> {
    let mut options = state.timeline;
    if let Some(width) = query.width {
        if !width.is_finite() || width <= options.label_width {
            return Err(ApiError::bad_request(
                "INVALID_WIDTH",
                format!(
                    "width must exceed the label column ({} px)",
                    options.label_width
                ),
            ));
        }
        options = options.with_viewport_width(width);
    }

    let spans = state.trace_spans(&path.trace_id).await?;
    let forest = build_span_tree(&spans);
    let collapsed = query.collapsed_set();

    tracing::debug!(
        trace_id = %path.trace_id,
        spans = forest.len(),
        collapsed = collapsed.len(),
        "Laying out timeline"
    );
    Ok(Json(timeline::layout(&forest, &collapsed, &options)))
}

#[derive(Debug, Deserialize)]
pub struct SpanSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpanSearchResponse {
    pub trace_id: String,
    pub query: String,
    pub span_ids: Vec<String>,
}

/// Span ids in this trace matching `q`
pub async fn search_trace_spans(
    State(state): State<AnalyticsApiState>,
    path: TracePath,
    Query(query): Query<SpanSearchQuery>,
) -> Result<Json<SpanSearchResponse>, ApiError> {
    let spans = state.trace_spans(&path.trace_id).await?;
    let term = query.q.unwrap_or_default();
    let span_ids = filters::search_spans(&spans, &term);

    Ok(Json(SpanSearchResponse {
        trace_id: path.trace_id,
        query: term,
        span_ids,
    }))
}
