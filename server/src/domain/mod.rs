//! Trace analytics engine
//!
//! Pure functions over spans and trace summaries. Nothing here performs I/O.
//!
//! - `tree` - span forest with cycle breaking and timing offsets
//! - `timeline` - collapsible rows, bar geometry and axis ticks
//! - `metrics` - latency percentiles, rates and breakdowns
//! - `filters` - trace list filtering, sorting and span search
//! - `status` - trace-level success / slow / error buckets
//! - `summary` - trace index built from raw spans
//! - `sessions` - trace grouping by session

pub mod filters;
pub mod metrics;
pub mod sessions;
pub mod status;
pub mod summary;
pub mod timeline;
pub mod tree;

pub use filters::{FilterContext, QuickStats, TraceFilter, TraceFilterParams};
pub use metrics::{MetricsOptions, TraceMetrics, compute_metrics};
pub use sessions::{SessionGrouping, TraceSessionSummary, group_by_session};
pub use status::{DurationThresholds, TraceStatus, TraceStatusIndex};
pub use summary::summarize_traces;
pub use timeline::{CollapsedSet, TimelineLayout, TimelineOptions};
pub use tree::{SpanForest, TimelineSpan, build_span_tree};
