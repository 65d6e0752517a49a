// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "TraceScope";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tracescope";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tracescope";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tracescope.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TRACESCOPE_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TRACESCOPE_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TRACESCOPE_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TRACESCOPE_LOG";

/// Default log filter when neither `TRACESCOPE_LOG` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info,tracescope=info";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// API route prefix
pub const API_PREFIX: &str = "/api/v1";

// =============================================================================
// Environment Variables - Upstream
// =============================================================================

/// Environment variable for the span producer's base URL
pub const ENV_UPSTREAM_URL: &str = "TRACESCOPE_UPSTREAM_URL";

/// Environment variable for the upstream request timeout (seconds)
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "TRACESCOPE_UPSTREAM_TIMEOUT_SECS";

/// Environment variable pointing at a span fixture file (bypasses HTTP)
pub const ENV_FIXTURE: &str = "TRACESCOPE_FIXTURE";

// =============================================================================
// Upstream Defaults
// =============================================================================

/// Default span producer base URL
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8000/api";

/// Default per-request timeout
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Timeline Defaults
// =============================================================================

pub const DEFAULT_TIMELINE_VIEWPORT_WIDTH: f64 = 1200.0;
pub const DEFAULT_TIMELINE_LABEL_WIDTH: f64 = 320.0;

/// Instantaneous spans still get this many pixels so they stay selectable
pub const DEFAULT_TIMELINE_MIN_BAR_WIDTH: f64 = 2.0;

pub const DEFAULT_TIMELINE_ROW_HEIGHT: f64 = 28.0;
pub const DEFAULT_TIMELINE_INDENT_PER_DEPTH: f64 = 16.0;
pub const DEFAULT_TIMELINE_MAX_TICKS: usize = 10;

/// Column budget for the text gantt printed by `tracescope timeline`
pub const DEFAULT_TEXT_TIMELINE_WIDTH: usize = 100;

// =============================================================================
// Filter Defaults
// =============================================================================

/// Traces at or above this duration are `slow`
pub const DEFAULT_SLOW_THRESHOLD_MS: f64 = 5_000.0;

/// Traces at or above this duration are `error` when no span status is known
pub const DEFAULT_ERROR_THRESHOLD_MS: f64 = 30_000.0;

// =============================================================================
// Metrics Defaults
// =============================================================================

/// Model breakdown entries kept for ranked display
pub const DEFAULT_TOP_MODELS: usize = 10;

/// Fallback key for spans without a model attribute
pub const UNKNOWN_MODEL: &str = "unknown";

/// Latency histogram bucket upper bounds (ms)
pub const LATENCY_BUCKET_BOUNDS_MS: &[f64] = &[
    100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 30_000.0, 60_000.0,
];

// =============================================================================
// Pagination
// =============================================================================

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 500;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for in-flight requests during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
