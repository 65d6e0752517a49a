use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::error::UpstreamError;
use super::source::TraceSource;
use crate::core::config::UpstreamConfig;
use crate::data::types::{SessionSummary, Span, TraceSummary};
use crate::utils::retry::retry_with_backoff_async;

/// HTTP client for the span producer's JSON endpoints
#[derive(Debug, Clone)]
pub struct HttpTraceSource {
    client: reqwest::Client,
    base_url: Url,
    max_attempts: u32,
    retry_base_delay_ms: u64,
}

impl HttpTraceSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(UpstreamError::Config("upstream base URL is empty".to_string()));
        }
        let base_url = Url::parse(&base_url)
            .map_err(|e| UpstreamError::Config(format!("invalid upstream base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Config(format!(
                "upstream base URL cannot carry a path: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| UpstreamError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            base_url = %base_url,
            timeout_secs = config.timeout_secs,
            max_attempts = config.max_attempts,
            "Upstream client initialized"
        );
        Ok(Self {
            client,
            base_url,
            max_attempts: config.max_attempts,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment
    fn url(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        // `.` and `..` would be dropped by the URL serializer instead of encoded
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(UpstreamError::Request {
                url: self.base_url.to_string(),
                message: format!("path segment {:?} is not addressable", segment),
            });
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UpstreamError::Config(format!("invalid upstream base URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, UpstreamError> {
        let url = self.url(segments)?;
        let url = url.as_str();
        retry_with_backoff_async(
            self.max_attempts,
            self.retry_base_delay_ms,
            UpstreamError::is_transient,
            || self.fetch_once(url),
        )
        .await
        .map_err(|(e, attempts)| {
            tracing::debug!(url, attempts, error = %e, "Upstream request failed");
            e
        })
    }

    async fn fetch_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| UpstreamError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TraceSource for HttpTraceSource {
    async fn list_traces(&self) -> Result<Vec<TraceSummary>, UpstreamError> {
        let traces: Vec<TraceSummary> = self.get_json(&["traces"]).await?;
        tracing::debug!(count = traces.len(), "Fetched trace index");
        Ok(traces)
    }

    async fn get_trace(&self, trace_id: &str) -> Result<Vec<Span>, UpstreamError> {
        let spans: Vec<Span> = self.get_json(&["traces", trace_id]).await?;
        tracing::debug!(trace_id, count = spans.len(), "Fetched trace spans");
        Ok(spans)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, UpstreamError> {
        self.get_json(&["sessions", "summary"]).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
