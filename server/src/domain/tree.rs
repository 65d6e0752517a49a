//! Span tree reconstruction
//!
//! Turns a flat, unordered span list into an ordered forest. Parent links are
//! resolved once through an id index, cycles are broken, and every node gets a
//! depth and a position on a time axis shared by the whole span set.
//!
//! All passes use explicit stacks so arbitrarily deep chains are safe to build.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::types::Span;
use crate::utils::time::diff_ms;

/// Lower bound for the forest's total duration, keeps layout ratios finite
pub const MIN_TOTAL_DURATION_MS: f64 = 1.0;

/// A span placed in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSpan {
    #[serde(flatten)]
    pub span: Span,
    pub depth: usize,
    /// Offset from the earliest start in the span set
    pub start_ms: f64,
    pub duration_ms: f64,
    pub children: Vec<TimelineSpan>,
}

impl TimelineSpan {
    pub fn span_id(&self) -> &str {
        &self.span.span_id
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpanForest {
    roots: Vec<TimelineSpan>,
    #[serde(rename = "span_count")]
    len: usize,
    max_depth: usize,
    total_duration_ms: f64,
}

impl SpanForest {
    pub fn roots(&self) -> &[TimelineSpan] {
        &self.roots
    }

    /// Number of nodes across all trees
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// `max(end) - min(start)` over the whole set, at least 1ms when non-empty
    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    pub fn iter_preorder(&self) -> Preorder<'_> {
        Preorder {
            stack: self.roots.iter().rev().collect(),
        }
    }

    pub fn find(&self, span_id: &str) -> Option<&TimelineSpan> {
        self.iter_preorder().find(|node| node.span_id() == span_id)
    }

    /// Chain from the latest-ending root, following the latest-ending child at
    /// each level. Ties keep the earlier node.
    pub fn critical_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut level = self.roots.as_slice();
        while let Some(node) = latest_ending(level) {
            path.push(node.span_id());
            level = node.children.as_slice();
        }
        path
    }
}

fn latest_ending(nodes: &[TimelineSpan]) -> Option<&TimelineSpan> {
    nodes.iter().fold(None, |best: Option<&TimelineSpan>, node| match best {
        Some(b) if b.end_ms() >= node.end_ms() => Some(b),
        _ => Some(node),
    })
}

/// Pre-order walk; children follow their parent in display order
pub struct Preorder<'a> {
    stack: Vec<&'a TimelineSpan>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a TimelineSpan;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Fresh,
    OnChain,
    Done,
}

/// Build the span forest. Never fails; malformed links degrade to roots.
pub fn build_span_tree(spans: &[Span]) -> SpanForest {
    // First occurrence of each id wins
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(spans.len());
    let mut kept: Vec<&Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if index.contains_key(span.span_id.as_str()) {
            tracing::debug!(
                span_id = %span.span_id,
                trace_id = %span.trace_id,
                "Dropping duplicate span id"
            );
            continue;
        }
        index.insert(span.span_id.as_str(), kept.len());
        kept.push(span);
    }

    if kept.is_empty() {
        return SpanForest::default();
    }

    let bounds: Vec<Option<(DateTime<Utc>, DateTime<Utc>)>> =
        kept.iter().map(|s| s.bounds()).collect();
    let origin = bounds.iter().flatten().map(|(start, _)| *start).min();

    let timing: Vec<(f64, f64)> = bounds
        .iter()
        .map(|b| match (b, origin) {
            (Some((start, end)), Some(origin)) => (diff_ms(*start, origin), diff_ms(*end, *start)),
            _ => (0.0, 0.0),
        })
        .collect();

    let mut parent: Vec<Option<usize>> = kept
        .iter()
        .enumerate()
        .map(|(i, span)| {
            span.parent_id()
                .and_then(|pid| index.get(pid).copied())
                .filter(|&p| p != i)
        })
        .collect();

    break_cycles(&kept, &mut parent);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); kept.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    // Stable: equal offsets keep input order
    let by_start = |a: &usize, b: &usize| timing[*a].0.total_cmp(&timing[*b].0);
    roots.sort_by(by_start);
    for list in &mut children {
        list.sort_by(by_start);
    }

    // Pre-order pass assigns depths
    let mut depth = vec![0usize; kept.len()];
    let mut order: Vec<usize> = Vec::with_capacity(kept.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        for &c in children[i].iter().rev() {
            depth[c] = depth[i] + 1;
            stack.push(c);
        }
    }

    // Reverse pre-order builds every subtree before its parent
    let mut built: Vec<Option<TimelineSpan>> = vec![None; kept.len()];
    for &i in order.iter().rev() {
        let node_children = children[i]
            .iter()
            .filter_map(|&c| built[c].take())
            .collect();
        let (start_ms, duration_ms) = timing[i];
        built[i] = Some(TimelineSpan {
            span: kept[i].clone(),
            depth: depth[i],
            start_ms,
            duration_ms,
            children: node_children,
        });
    }

    let total_end = timing
        .iter()
        .map(|(start, duration)| start + duration)
        .fold(0.0_f64, f64::max);

    SpanForest {
        roots: roots.iter().filter_map(|&r| built[r].take()).collect(),
        len: kept.len(),
        max_depth: depth.iter().copied().max().unwrap_or(0),
        total_duration_ms: total_end.max(MIN_TOTAL_DURATION_MS),
    }
}

/// Walk each ancestor chain; the span a chain revisits is demoted to root
fn break_cycles(spans: &[&Span], parent: &mut [Option<usize>]) {
    let mut state = vec![Visit::Fresh; parent.len()];
    let mut chain: Vec<usize> = Vec::new();

    for start in 0..parent.len() {
        if state[start] == Visit::Done {
            continue;
        }
        chain.clear();
        let mut current = start;
        loop {
            match state[current] {
                Visit::Done => break,
                Visit::OnChain => {
                    tracing::debug!(
                        span_id = %spans[current].span_id,
                        trace_id = %spans[current].trace_id,
                        "Parent cycle detected, treating span as root"
                    );
                    parent[current] = None;
                    break;
                }
                Visit::Fresh => {
                    state[current] = Visit::OnChain;
                    chain.push(current);
                    match parent[current] {
                        Some(p) => current = p,
                        None => break,
                    }
                }
            }
        }
        for &i in &chain {
            state[i] = Visit::Done;
        }
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
