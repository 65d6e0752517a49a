//! Trace metrics aggregation
//!
//! Latency statistics come from trace summaries; status, token and model
//! breakdowns come from spans. The two inputs may cover different selections.
//! Everything is recomputed per call and empty input yields the zero baseline.
//!
//! Percentiles use the nearest-rank rule `sorted[floor(p / 100 * n)]`, no
//! interpolation.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::constants::{LATENCY_BUCKET_BOUNDS_MS, UNKNOWN_MODEL};
use crate::data::types::{Span, StatusCode, TraceSummary};
use crate::utils::time::diff_ms;

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsOptions {
    /// Keep only the N most frequent models
    pub top_models: Option<usize>,
    /// Histogram bucket upper bounds in ms, ascending
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            top_models: None,
            latency_buckets: LATENCY_BUCKET_BOUNDS_MS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanNameStats {
    pub name: String,
    pub count: usize,
    pub avg_duration_ms: f64,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    /// Inclusive upper bound; `None` for the overflow bucket
    pub le_ms: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceMetrics {
    pub total_traces: usize,
    pub total_spans: usize,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub error_rate: f64,
    pub success_rate: f64,
    pub error_count: usize,
    pub timeout_count: usize,
    pub throughput_per_hour: f64,
    pub total_tokens: u64,
    pub model_breakdown: Vec<BreakdownEntry>,
    pub status_breakdown: Vec<BreakdownEntry>,
    pub span_name_breakdown: Vec<SpanNameStats>,
    pub latency_histogram: Vec<HistogramBucket>,
}

pub fn compute_metrics(
    traces: &[TraceSummary],
    spans: &[Span],
    options: &MetricsOptions,
) -> TraceMetrics {
    let mut latencies: Vec<f64> = traces.iter().map(TraceSummary::duration_ms).collect();
    latencies.sort_by(f64::total_cmp);

    let error_count = count_status(spans, StatusCode::Error);
    let (error_rate, success_rate) = if spans.is_empty() {
        (0.0, 0.0)
    } else {
        let rate = error_count as f64 / spans.len() as f64 * 100.0;
        (rate, 100.0 - rate)
    };

    let mut model_breakdown = ranked(count_by(spans, |s| {
        s.attributes.model().unwrap_or(UNKNOWN_MODEL).to_string()
    }));
    if let Some(top) = options.top_models {
        model_breakdown.truncate(top);
    }

    TraceMetrics {
        total_traces: traces.len(),
        total_spans: spans.len(),
        avg_latency_ms: mean(&latencies),
        p50_latency_ms: percentile(&latencies, 50.0),
        p95_latency_ms: percentile(&latencies, 95.0),
        p99_latency_ms: percentile(&latencies, 99.0),
        min_latency_ms: latencies.first().copied().unwrap_or(0.0),
        max_latency_ms: latencies.last().copied().unwrap_or(0.0),
        error_rate,
        success_rate,
        error_count,
        timeout_count: count_status(spans, StatusCode::Timeout),
        throughput_per_hour: throughput_per_hour(traces),
        total_tokens: spans
            .iter()
            .filter_map(|s| s.attributes.token_count())
            .map(|t| t.round() as u64)
            .sum(),
        model_breakdown,
        status_breakdown: ranked(count_by(spans, |s| s.status_code.as_str().to_string())),
        span_name_breakdown: span_name_breakdown(spans),
        latency_histogram: histogram_from_sorted(&latencies, &options.latency_buckets),
    }
}

/// Nearest-rank percentile over ascending `sorted`; 0 when empty
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || !p.is_finite() {
        return 0.0;
    }
    let index = (p.max(0.0) / 100.0 * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Trace counts per latency bucket; a trace lands in the first bucket whose
/// bound it does not exceed
pub fn latency_histogram(traces: &[TraceSummary], bucket_bounds: &[f64]) -> Vec<HistogramBucket> {
    let mut latencies: Vec<f64> = traces.iter().map(TraceSummary::duration_ms).collect();
    latencies.sort_by(f64::total_cmp);
    histogram_from_sorted(&latencies, bucket_bounds)
}

fn histogram_from_sorted(sorted: &[f64], bucket_bounds: &[f64]) -> Vec<HistogramBucket> {
    let mut buckets: Vec<HistogramBucket> = bucket_bounds
        .iter()
        .map(|&le| HistogramBucket {
            le_ms: Some(le),
            count: 0,
        })
        .chain(std::iter::once(HistogramBucket {
            le_ms: None,
            count: 0,
        }))
        .collect();

    for &latency in sorted {
        let slot = bucket_bounds
            .iter()
            .position(|&le| latency <= le)
            .unwrap_or(bucket_bounds.len());
        buckets[slot].count += 1;
    }
    buckets
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn count_status(spans: &[Span], status: StatusCode) -> usize {
    spans.iter().filter(|s| s.status_code == status).count()
}

/// Traces per hour over the start-time spread, with at least a one hour window
fn throughput_per_hour(traces: &[TraceSummary]) -> f64 {
    if traces.is_empty() {
        return 0.0;
    }
    let starts = traces.iter().filter_map(|t| t.start_time.get());
    let spread_ms = match (starts.clone().min(), starts.max()) {
        (Some(oldest), Some(newest)) => diff_ms(newest, oldest),
        _ => 0.0,
    };
    let hours = (spread_ms / MS_PER_HOUR).max(1.0);
    traces.len() as f64 / hours
}

fn count_by(spans: &[Span], key: impl Fn(&Span) -> String) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for span in spans {
        *counts.entry(key(span)).or_default() += 1;
    }
    counts
}

/// Count descending, key ascending
fn ranked(counts: HashMap<String, usize>) -> Vec<BreakdownEntry> {
    let mut entries: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(key, count)| BreakdownEntry { key, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    entries
}

fn span_name_breakdown(spans: &[Span]) -> Vec<SpanNameStats> {
    #[derive(Default)]
    struct Acc {
        count: usize,
        duration_sum: f64,
        error_count: usize,
    }

    let mut by_name: HashMap<&str, Acc> = HashMap::new();
    for span in spans {
        let acc = by_name.entry(span.name.as_str()).or_default();
        acc.count += 1;
        acc.duration_sum += span.duration_ms();
        if span.status_code == StatusCode::Error {
            acc.error_count += 1;
        }
    }

    let mut stats: Vec<SpanNameStats> = by_name
        .into_iter()
        .map(|(name, acc)| SpanNameStats {
            name: name.to_string(),
            count: acc.count,
            avg_duration_ms: acc.duration_sum / acc.count as f64,
            error_count: acc.error_count,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Timestamp;

    const HOUR_MS: i64 = 3_600_000;

    fn make_trace(id: &str, start: i64, duration: i64) -> TraceSummary {
        TraceSummary::new(
            id,
            "chat.send_message",
            Timestamp::from_millis(start),
            Timestamp::from_millis(start + duration),
        )
    }

    fn traces_with_durations(durations: &[i64]) -> Vec<TraceSummary> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| make_trace(&format!("t{}", i), i as i64 * 1_000, *d))
            .collect()
    }

    fn make_span(id: &str, status: StatusCode) -> Span {
        Span::new("t", id, "provider.call").with_status(status)
    }

    #[test]
    fn test_empty_input_is_zero_baseline() {
        let metrics = compute_metrics(&[], &[], &MetricsOptions::default());
        assert_eq!(metrics.total_traces, 0);
        assert_eq!(metrics.avg_latency_ms, 0.0);
        assert_eq!(metrics.p95_latency_ms, 0.0);
        assert_eq!(metrics.error_rate, 0.0);
        assert_eq!(metrics.success_rate, 0.0);
        assert_eq!(metrics.throughput_per_hour, 0.0);
        assert!(metrics.model_breakdown.is_empty());
        assert_eq!(metrics.latency_histogram.iter().map(|b| b.count).sum::<usize>(), 0);
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let traces = traces_with_durations(&[300, 100, 500, 200, 400]);
        let metrics = compute_metrics(&traces, &[], &MetricsOptions::default());
        assert_eq!(metrics.p95_latency_ms, 500.0);
        assert_eq!(metrics.p50_latency_ms, 300.0);
        assert_eq!(metrics.avg_latency_ms, 300.0);
        assert_eq!(metrics.min_latency_ms, 100.0);
        assert_eq!(metrics.max_latency_ms, 500.0);
    }

    #[test]
    fn test_percentile_edges() {
        assert_eq!(percentile(&[], 95.0), 0.0);
        assert_eq!(percentile(&[7.0], 99.0), 7.0);
        assert_eq!(percentile(&[1.0, 2.0], 100.0), 2.0);
        assert_eq!(percentile(&[1.0, 2.0], 0.0), 1.0);
    }

    #[test]
    fn test_percentiles_are_monotonic() {
        let mut seed: u64 = 42;
        for n in 1..60 {
            let durations: Vec<i64> = (0..n)
                .map(|_| {
                    seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                    ((seed >> 33) % 10_000) as i64
                })
                .collect();
            let metrics =
                compute_metrics(&traces_with_durations(&durations), &[], &MetricsOptions::default());
            assert!(metrics.p95_latency_ms >= metrics.p50_latency_ms);
            assert!(metrics.p99_latency_ms >= metrics.p95_latency_ms);
        }
    }

    #[test]
    fn test_error_and_success_rate_sum_to_hundred() {
        let spans = vec![
            make_span("a", StatusCode::Ok),
            make_span("b", StatusCode::Error),
            make_span("c", StatusCode::Timeout),
            make_span("d", StatusCode::Unset),
            make_span("e", StatusCode::Error),
            make_span("f", StatusCode::Ok),
            make_span("g", StatusCode::Ok),
        ];
        let metrics = compute_metrics(&[], &spans, &MetricsOptions::default());
        assert_eq!(metrics.error_count, 2);
        assert_eq!(metrics.timeout_count, 1);
        assert!((metrics.error_rate - 200.0 / 7.0).abs() < 1e-9);
        assert!((metrics.error_rate + metrics.success_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_uses_one_hour_floor() {
        let tight = vec![make_trace("a", 0, 10), make_trace("b", 60_000, 10)];
        let metrics = compute_metrics(&tight, &[], &MetricsOptions::default());
        assert_eq!(metrics.throughput_per_hour, 2.0);

        let wide: Vec<TraceSummary> = (0..5)
            .map(|i| make_trace(&format!("t{}", i), i * HOUR_MS, 10))
            .collect();
        let metrics = compute_metrics(&wide, &[], &MetricsOptions::default());
        assert_eq!(metrics.throughput_per_hour, 5.0 / 4.0);
    }

    #[test]
    fn test_total_tokens_skips_non_numeric() {
        let spans = vec![
            make_span("a", StatusCode::Ok).with_attribute("llm.usage.total_tokens", 100),
            make_span("b", StatusCode::Ok)
                .with_attribute("llm.usage.total_tokens", "many")
                .with_attribute("llm.usage.completion_tokens", 7),
            make_span("c", StatusCode::Ok).with_attribute("tokens", "12"),
        ];
        let metrics = compute_metrics(&[], &spans, &MetricsOptions::default());
        assert_eq!(metrics.total_tokens, 107);
    }

    #[test]
    fn test_breakdowns_are_ranked() {
        let spans = vec![
            make_span("a", StatusCode::Ok).with_attribute("model.name", "gpt-4o"),
            make_span("b", StatusCode::Ok).with_attribute("gen_ai.request.model", "claude"),
            make_span("c", StatusCode::Error).with_attribute("model.name", "gpt-4o"),
            make_span("d", StatusCode::Ok),
            make_span("e", StatusCode::Ok).with_attribute("llm.model", "gemini"),
        ];
        let metrics = compute_metrics(&[], &spans, &MetricsOptions::default());

        let models: Vec<(&str, usize)> = metrics
            .model_breakdown
            .iter()
            .map(|e| (e.key.as_str(), e.count))
            .collect();
        assert_eq!(
            models,
            vec![("gpt-4o", 2), ("claude", 1), ("gemini", 1), ("unknown", 1)]
        );

        let statuses: Vec<(&str, usize)> = metrics
            .status_breakdown
            .iter()
            .map(|e| (e.key.as_str(), e.count))
            .collect();
        assert_eq!(statuses, vec![("OK", 4), ("ERROR", 1)]);

        let top = compute_metrics(
            &[],
            &spans,
            &MetricsOptions {
                top_models: Some(2),
                ..MetricsOptions::default()
            },
        );
        assert_eq!(top.model_breakdown.len(), 2);
    }

    #[test]
    fn test_span_name_breakdown() {
        let spans = vec![
            Span::new("t", "a", "provider.call")
                .with_times(Timestamp::from_millis(0), Timestamp::from_millis(100))
                .with_status(StatusCode::Error),
            Span::new("t", "b", "provider.call")
                .with_times(Timestamp::from_millis(0), Timestamp::from_millis(300)),
            Span::new("t", "c", "chat.send_message")
                .with_times(Timestamp::from_millis(0), Timestamp::from_millis(50)),
        ];
        let metrics = compute_metrics(&[], &spans, &MetricsOptions::default());
        let first = &metrics.span_name_breakdown[0];
        assert_eq!(first.name, "provider.call");
        assert_eq!(first.count, 2);
        assert_eq!(first.avg_duration_ms, 200.0);
        assert_eq!(first.error_count, 1);
    }

    #[test]
    fn test_latency_histogram() {
        let traces = traces_with_durations(&[50, 100, 101, 999_999]);
        let buckets = latency_histogram(&traces, &[100.0, 1_000.0]);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(buckets[2].le_ms, None);
    }
}
