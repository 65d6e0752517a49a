//! Trace filtering and sorting
//!
//! Raw, possibly malformed filter input is parsed leniently into a typed
//! [`TraceFilter`]; evaluation is a set of pure predicates followed by a stable
//! sort.

mod apply;
mod types;

pub use apply::{FilterContext, QuickStats, apply, matches, quick_stats, search_spans, sort_traces};
pub use types::{DateRange, SortField, SortOrder, TraceFilter, TraceFilterParams};
