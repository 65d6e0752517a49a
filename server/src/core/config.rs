use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{DurationThresholds, MetricsOptions, TimelineOptions};
use crate::utils::path::expand_path;
use crate::utils::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_ERROR_THRESHOLD_MS, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_SLOW_THRESHOLD_MS, DEFAULT_TOP_MODELS, DEFAULT_UPSTREAM_TIMEOUT_SECS,
    DEFAULT_UPSTREAM_URL,
};

// =============================================================================
// File Config Structs (JSON, every field optional)
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpstreamFileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub fixture_path: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TimelineFileConfig {
    pub viewport_width: Option<f64>,
    pub label_width: Option<f64>,
    pub min_bar_width: Option<f64>,
    pub row_height: Option<f64>,
    pub indent_per_depth: Option<f64>,
    pub max_ticks: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FiltersFileConfig {
    pub slow_threshold_ms: Option<f64>,
    pub error_threshold_ms: Option<f64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MetricsFileConfig {
    pub top_models: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub upstream: Option<UpstreamFileConfig>,
    pub timeline: Option<TimelineFileConfig>,
    pub filters: Option<FiltersFileConfig>,
    pub metrics: Option<MetricsFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str = map.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(upstream) = other.upstream {
            let current = self.upstream.get_or_insert_with(UpstreamFileConfig::default);
            if upstream.base_url.is_some() {
                tracing::trace!(base_url = ?upstream.base_url, "Merging upstream.base_url");
                current.base_url = upstream.base_url;
            }
            if upstream.timeout_secs.is_some() {
                current.timeout_secs = upstream.timeout_secs;
            }
            if upstream.max_attempts.is_some() {
                current.max_attempts = upstream.max_attempts;
            }
            if upstream.retry_base_delay_ms.is_some() {
                current.retry_base_delay_ms = upstream.retry_base_delay_ms;
            }
            if upstream.fixture_path.is_some() {
                tracing::trace!(fixture = ?upstream.fixture_path, "Merging upstream.fixture_path");
                current.fixture_path = upstream.fixture_path;
            }
        }

        if let Some(timeline) = other.timeline {
            let current = self.timeline.get_or_insert_with(TimelineFileConfig::default);
            if timeline.viewport_width.is_some() {
                current.viewport_width = timeline.viewport_width;
            }
            if timeline.label_width.is_some() {
                current.label_width = timeline.label_width;
            }
            if timeline.min_bar_width.is_some() {
                current.min_bar_width = timeline.min_bar_width;
            }
            if timeline.row_height.is_some() {
                current.row_height = timeline.row_height;
            }
            if timeline.indent_per_depth.is_some() {
                current.indent_per_depth = timeline.indent_per_depth;
            }
            if timeline.max_ticks.is_some() {
                current.max_ticks = timeline.max_ticks;
            }
        }

        if let Some(filters) = other.filters {
            let current = self.filters.get_or_insert_with(FiltersFileConfig::default);
            if filters.slow_threshold_ms.is_some() {
                current.slow_threshold_ms = filters.slow_threshold_ms;
            }
            if filters.error_threshold_ms.is_some() {
                current.error_threshold_ms = filters.error_threshold_ms;
            }
        }

        if let Some(metrics) = other.metrics {
            let current = self.metrics.get_or_insert_with(MetricsFileConfig::default);
            if metrics.top_models.is_some() {
                current.top_models = metrics.top_models;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where spans come from
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Serve spans from this JSON file instead of calling `base_url`
    pub fixture_path: Option<PathBuf>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_BASE_DELAY_MS,
            fixture_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiltersConfig {
    pub slow_threshold_ms: f64,
    pub error_threshold_ms: f64,
}

impl FiltersConfig {
    pub fn thresholds(&self) -> DurationThresholds {
        DurationThresholds {
            slow_ms: self.slow_threshold_ms,
            error_ms: self.error_threshold_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsConfig {
    pub top_models: usize,
}

impl MetricsConfig {
    pub fn options(&self) -> MetricsOptions {
        MetricsOptions {
            top_models: Some(self.top_models),
            ..MetricsOptions::default()
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub timeline: TimelineOptions,
    pub filters: FiltersConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.tracescope/tracescope.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            upstream = %config.upstream.base_url,
            fixture = ?config.upstream.fixture_path,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Defaults, then file values, then CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_upstream = file_config.upstream.unwrap_or_default();
        let file_timeline = file_config.timeline.unwrap_or_default();
        let file_filters = file_config.filters.unwrap_or_default();
        let file_metrics = file_config.metrics.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let upstream_defaults = UpstreamConfig::default();
        let upstream = UpstreamConfig {
            base_url: cli
                .upstream_url
                .clone()
                .or(file_upstream.base_url)
                .unwrap_or(upstream_defaults.base_url),
            timeout_secs: cli
                .upstream_timeout_secs
                .or(file_upstream.timeout_secs)
                .unwrap_or(upstream_defaults.timeout_secs),
            max_attempts: file_upstream
                .max_attempts
                .unwrap_or(upstream_defaults.max_attempts),
            retry_base_delay_ms: file_upstream
                .retry_base_delay_ms
                .unwrap_or(upstream_defaults.retry_base_delay_ms),
            fixture_path: cli
                .fixture
                .as_ref()
                .map(|p| expand_path(&p.to_string_lossy()))
                .or_else(|| file_upstream.fixture_path.as_deref().map(expand_path)),
        };

        let timeline_defaults = TimelineOptions::default();
        let timeline = TimelineOptions {
            viewport_width: file_timeline
                .viewport_width
                .unwrap_or(timeline_defaults.viewport_width),
            label_width: file_timeline
                .label_width
                .unwrap_or(timeline_defaults.label_width),
            min_bar_width: file_timeline
                .min_bar_width
                .unwrap_or(timeline_defaults.min_bar_width),
            row_height: file_timeline
                .row_height
                .unwrap_or(timeline_defaults.row_height),
            indent_per_depth: file_timeline
                .indent_per_depth
                .unwrap_or(timeline_defaults.indent_per_depth),
            max_ticks: file_timeline
                .max_ticks
                .unwrap_or(timeline_defaults.max_ticks),
        };

        let filters = FiltersConfig {
            slow_threshold_ms: file_filters
                .slow_threshold_ms
                .unwrap_or(DEFAULT_SLOW_THRESHOLD_MS),
            error_threshold_ms: file_filters
                .error_threshold_ms
                .unwrap_or(DEFAULT_ERROR_THRESHOLD_MS),
        };

        let metrics = MetricsConfig {
            top_models: file_metrics.top_models.unwrap_or(DEFAULT_TOP_MODELS),
        };

        Self {
            server,
            upstream,
            timeline,
            filters,
            metrics,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.upstream.fixture_path.is_none() && self.upstream.base_url.trim().is_empty() {
            anyhow::bail!("Configuration error: upstream.base_url must not be empty");
        }
        if self.upstream.max_attempts == 0 {
            anyhow::bail!("Configuration error: upstream.max_attempts must be at least 1");
        }

        let t = &self.timeline;
        if !(t.viewport_width.is_finite() && t.viewport_width > 0.0) {
            anyhow::bail!("Configuration error: timeline.viewport_width must be positive");
        }
        if !(t.label_width.is_finite() && t.label_width >= 0.0 && t.label_width < t.viewport_width)
        {
            anyhow::bail!(
                "Configuration error: timeline.label_width must be between 0 and viewport_width"
            );
        }
        if t.max_ticks < 2 {
            anyhow::bail!("Configuration error: timeline.max_ticks must be at least 2");
        }

        let f = &self.filters;
        if !(f.slow_threshold_ms.is_finite() && f.slow_threshold_ms > 0.0) {
            anyhow::bail!("Configuration error: filters.slow_threshold_ms must be positive");
        }
        if !(f.error_threshold_ms.is_finite() && f.error_threshold_ms >= f.slow_threshold_ms) {
            anyhow::bail!(
                "Configuration error: filters.error_threshold_ms ({}) must not be below slow_threshold_ms ({})",
                f.error_threshold_ms,
                f.slow_threshold_ms
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.tracescope/tracescope.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
