//! Span producer access
//!
//! `HttpTraceSource` talks to the producer's JSON endpoints; `MemoryTraceSource`
//! serves a span dump from disk. Both sit behind [`TraceSource`].

mod client;
mod error;
mod memory;
mod source;

pub use client::HttpTraceSource;
pub use error::UpstreamError;
pub use memory::MemoryTraceSource;
pub use source::TraceSource;

use std::sync::Arc;

use crate::core::config::UpstreamConfig;

/// Build the configured source: a fixture file when set, the HTTP producer otherwise
pub async fn open_source(config: &UpstreamConfig) -> Result<Arc<dyn TraceSource>, UpstreamError> {
    match &config.fixture_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Serving traces from fixture");
            Ok(Arc::new(MemoryTraceSource::load(path).await?))
        }
        None => Ok(Arc::new(HttpTraceSource::new(config)?)),
    }
}
