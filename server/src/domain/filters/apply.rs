//! Filter evaluation, sorting and quick stats

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::{SortField, SortOrder, TraceFilter};
use crate::data::types::{Span, TraceSummary};
use crate::domain::status::{DurationThresholds, TraceStatus, TraceStatusIndex, resolve_status};
use crate::utils::string::{contains_ignore_case, non_empty};

/// Inputs the predicates need besides the traces themselves
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub now: DateTime<Utc>,
    pub thresholds: DurationThresholds,
    pub statuses: Option<&'a TraceStatusIndex>,
}

impl<'a> FilterContext<'a> {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            thresholds: DurationThresholds::default(),
            statuses: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: DurationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_statuses(mut self, statuses: &'a TraceStatusIndex) -> Self {
        self.statuses = Some(statuses);
        self
    }

    pub fn status_of(&self, trace: &TraceSummary) -> TraceStatus {
        resolve_status(trace, &self.thresholds, self.statuses)
    }
}

/// Conjunction of every active predicate
pub fn matches(trace: &TraceSummary, filter: &TraceFilter, ctx: &FilterContext<'_>) -> bool {
    if let Some(term) = filter.search.as_deref()
        && !matches_search(trace, term)
    {
        return false;
    }

    let duration_ms = trace.duration_ms();
    if filter.min_duration_ms.is_some_and(|min| duration_ms < min) {
        return false;
    }
    if filter.max_duration_ms.is_some_and(|max| duration_ms > max) {
        return false;
    }

    if let Some(status) = filter.status
        && ctx.status_of(trace) != status
    {
        return false;
    }

    if let Some(session_id) = filter.session_id.as_deref()
        && trace.session_id.as_deref() != Some(session_id)
    {
        return false;
    }

    if let Some(window) = filter.date_range.and_then(|r| r.window()) {
        // Unparsed start times cannot be placed inside a window
        let cutoff = ctx.now - window;
        match trace.start_time.get() {
            Some(start) if start >= cutoff => {}
            _ => return false,
        }
    }

    true
}

fn matches_search(trace: &TraceSummary, term: &str) -> bool {
    contains_ignore_case(&trace.trace_id, term)
        || contains_ignore_case(&trace.root_span_name, term)
        || trace
            .session_id
            .as_deref()
            .is_some_and(|s| contains_ignore_case(s, term))
}

/// Filtered, sorted subset of `traces`. Sorting is stable.
pub fn apply(
    traces: &[TraceSummary],
    filter: &TraceFilter,
    ctx: &FilterContext<'_>,
) -> Vec<TraceSummary> {
    let mut result: Vec<TraceSummary> = traces
        .iter()
        .filter(|t| matches(t, filter, ctx))
        .cloned()
        .collect();
    sort_traces(&mut result, filter.sort_by, filter.sort_order);

    tracing::debug!(
        input = traces.len(),
        output = result.len(),
        sort_by = filter.sort_by.as_str(),
        sort_order = filter.sort_order.as_str(),
        "Applied trace filter"
    );
    result
}

pub fn sort_traces(traces: &mut [TraceSummary], sort_by: SortField, sort_order: SortOrder) {
    let compare = |a: &TraceSummary, b: &TraceSummary| -> Ordering {
        match sort_by {
            SortField::Timestamp => a.start_time.cmp(&b.start_time),
            SortField::Duration => a.duration_ms().total_cmp(&b.duration_ms()),
            SortField::SpanCount => a.span_count.cmp(&b.span_count),
        }
    };
    match sort_order {
        SortOrder::Asc => traces.sort_by(compare),
        SortOrder::Desc => traces.sort_by(|a, b| compare(b, a)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuickStats {
    pub total: usize,
    pub success: usize,
    pub slow: usize,
    pub error: usize,
    pub avg_duration_ms: f64,
    pub total_spans: u64,
    pub unique_sessions: usize,
}

pub fn quick_stats(traces: &[TraceSummary], ctx: &FilterContext<'_>) -> QuickStats {
    let mut stats = QuickStats {
        total: traces.len(),
        ..QuickStats::default()
    };
    if traces.is_empty() {
        return stats;
    }

    let mut sessions: HashSet<&str> = HashSet::new();
    let mut duration_sum = 0.0;
    for trace in traces {
        match ctx.status_of(trace) {
            TraceStatus::Success => stats.success += 1,
            TraceStatus::Slow => stats.slow += 1,
            TraceStatus::Error => stats.error += 1,
        }
        duration_sum += trace.duration_ms();
        stats.total_spans += trace.span_count;
        if let Some(session) = non_empty(trace.session_id.as_deref()) {
            sessions.insert(session);
        }
    }
    stats.avg_duration_ms = duration_sum / traces.len() as f64;
    stats.unique_sessions = sessions.len();
    stats
}

/// Ids of spans matching `term`, in input order. A blank term matches nothing.
pub fn search_spans(spans: &[Span], term: &str) -> Vec<String> {
    let Some(term) = non_empty(Some(term)) else {
        return Vec::new();
    };
    spans
        .iter()
        .filter(|span| {
            contains_ignore_case(&span.name, term)
                || contains_ignore_case(&span.span_id, term)
                || span
                    .status_message
                    .as_deref()
                    .is_some_and(|m| contains_ignore_case(m, term))
                || span
                    .attributes
                    .string_values()
                    .any(|v| contains_ignore_case(v, term))
        })
        .map(|span| span.span_id.clone())
        .collect()
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;
