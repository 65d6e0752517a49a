//! Span, trace and session records exchanged with the span producer

mod attributes;
mod spans;
mod timestamp;
mod traces;

pub use attributes::{Attributes, keys};
pub use spans::{Span, SpanEvent, StatusCode};
pub use timestamp::Timestamp;
pub use traces::{SessionSummary, TraceSummary};
