//! Data layer
//!
//! - `types` - span, trace and session records
//! - `upstream` - access to the span producer (HTTP or fixture file)

pub mod types;
pub mod upstream;

pub use upstream::{TraceSource, UpstreamError};
