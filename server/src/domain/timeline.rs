//! Timeline layout
//!
//! Maps a span forest onto render coordinates: a flattened row list with bar
//! placement, event markers and axis ticks. Collapse state belongs to the caller
//! and is passed in on every call.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::tree::{MIN_TOTAL_DURATION_MS, SpanForest, TimelineSpan};
use crate::core::constants::{
    DEFAULT_TIMELINE_INDENT_PER_DEPTH, DEFAULT_TIMELINE_LABEL_WIDTH,
    DEFAULT_TIMELINE_MAX_TICKS, DEFAULT_TIMELINE_MIN_BAR_WIDTH, DEFAULT_TIMELINE_ROW_HEIGHT,
    DEFAULT_TIMELINE_VIEWPORT_WIDTH,
};
use crate::data::types::StatusCode;
use crate::utils::time::format_duration_ms;

/// Span ids whose descendants are hidden
pub type CollapsedSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineOptions {
    pub viewport_width: f64,
    pub label_width: f64,
    pub min_bar_width: f64,
    pub row_height: f64,
    pub indent_per_depth: f64,
    pub max_ticks: usize,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            viewport_width: DEFAULT_TIMELINE_VIEWPORT_WIDTH,
            label_width: DEFAULT_TIMELINE_LABEL_WIDTH,
            min_bar_width: DEFAULT_TIMELINE_MIN_BAR_WIDTH,
            row_height: DEFAULT_TIMELINE_ROW_HEIGHT,
            indent_per_depth: DEFAULT_TIMELINE_INDENT_PER_DEPTH,
            max_ticks: DEFAULT_TIMELINE_MAX_TICKS,
        }
    }
}

impl TimelineOptions {
    pub fn with_viewport_width(mut self, viewport_width: f64) -> Self {
        self.viewport_width = viewport_width;
        self
    }

    /// Width left for bars once the label column is taken
    pub fn track_width(&self) -> f64 {
        let width = self.viewport_width - self.label_width;
        if width.is_finite() { width.max(0.0) } else { 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMarker {
    pub name: String,
    /// Offset on the shared axis (same origin as `start_ms`)
    pub offset_ms: f64,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub span_id: String,
    pub name: String,
    pub status_code: StatusCode,
    pub depth: usize,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub indent: f64,
    pub has_children: bool,
    pub collapsed: bool,
    pub on_critical_path: bool,
    pub events: Vec<EventMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub offset_ms: f64,
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineLayout {
    pub rows: Vec<TimelineRow>,
    pub ticks: Vec<AxisTick>,
    pub total_duration_ms: f64,
    pub track_width: f64,
    pub content_height: f64,
    pub span_count: usize,
    pub critical_path: Vec<String>,
}

/// Visible nodes in display order. A collapsed node stays; its descendants go.
pub fn flatten<'a>(forest: &'a SpanForest, collapsed: &CollapsedSet) -> Vec<&'a TimelineSpan> {
    let mut visible = Vec::with_capacity(forest.len());
    let mut stack: Vec<&TimelineSpan> = forest.roots().iter().rev().collect();
    while let Some(node) = stack.pop() {
        visible.push(node);
        if !collapsed.contains(node.span_id()) {
            stack.extend(node.children.iter().rev());
        }
    }
    visible
}

pub fn layout(
    forest: &SpanForest,
    collapsed: &CollapsedSet,
    options: &TimelineOptions,
) -> TimelineLayout {
    let total = forest.total_duration_ms().max(MIN_TOTAL_DURATION_MS);
    let track_width = options.track_width();
    let scale = track_width / total;
    let critical: HashSet<&str> = forest.critical_path().into_iter().collect();

    let rows: Vec<TimelineRow> = flatten(forest, collapsed)
        .into_iter()
        .enumerate()
        .map(|(index, node)| TimelineRow {
            span_id: node.span.span_id.clone(),
            name: node.span.name.clone(),
            status_code: node.span.status_code,
            depth: node.depth,
            start_ms: node.start_ms,
            duration_ms: node.duration_ms,
            left: node.start_ms * scale,
            width: (node.duration_ms * scale).max(options.min_bar_width),
            top: index as f64 * options.row_height,
            indent: node.depth as f64 * options.indent_per_depth,
            has_children: node.has_children(),
            collapsed: collapsed.contains(node.span_id()),
            on_critical_path: critical.contains(node.span_id()),
            events: event_markers(node, scale),
        })
        .collect();

    TimelineLayout {
        content_height: rows.len() as f64 * options.row_height,
        rows,
        ticks: axis_ticks(total, scale, options.max_ticks),
        total_duration_ms: total,
        track_width,
        span_count: forest.len(),
        critical_path: forest
            .critical_path()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// Events with a parseable timestamp, in chronological order
fn event_markers(node: &TimelineSpan, scale: f64) -> Vec<EventMarker> {
    let Some((span_start, _)) = node.span.bounds() else {
        return Vec::new();
    };
    let mut markers: Vec<EventMarker> = node
        .span
        .events
        .iter()
        .filter_map(|event| {
            let offset_ms = node.start_ms + event.timestamp.ms_since(span_start)?;
            Some(EventMarker {
                name: event.name.clone(),
                offset_ms,
                x: offset_ms * scale,
            })
        })
        .collect();
    markers.sort_by(|a, b| a.offset_ms.total_cmp(&b.offset_ms));
    markers
}

/// Step of the form 1, 2 or 5 x 10^k no smaller than `raw`
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return MIN_TOTAL_DURATION_MS;
    }
    let magnitude = 10_f64.powi(raw.log10().floor() as i32);
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
        .unwrap_or(10.0 * magnitude)
}

fn axis_ticks(total: f64, scale: f64, max_ticks: usize) -> Vec<AxisTick> {
    if max_ticks == 0 {
        return Vec::new();
    }
    let step = if max_ticks == 1 {
        f64::INFINITY
    } else {
        nice_step(total / (max_ticks - 1) as f64)
    };
    let limit = total * (1.0 + 1e-9);
    (0..max_ticks)
        .map(|i| if i == 0 { 0.0 } else { i as f64 * step })
        .take_while(|offset| *offset <= limit)
        .map(|offset_ms| AxisTick {
            offset_ms,
            x: offset_ms * scale,
            label: format_duration_ms(offset_ms),
        })
        .collect()
}

/// New set with `span_id` flipped
pub fn toggle_collapsed(collapsed: &CollapsedSet, span_id: &str) -> CollapsedSet {
    let mut next = collapsed.clone();
    if !next.remove(span_id) {
        next.insert(span_id.to_string());
    }
    next
}

/// Every node that has children
pub fn collapse_all(forest: &SpanForest) -> CollapsedSet {
    forest
        .iter_preorder()
        .filter(|node| node.has_children())
        .map(|node| node.span_id().to_string())
        .collect()
}
