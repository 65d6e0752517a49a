use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_FIXTURE, ENV_HOST, ENV_PORT, ENV_UPSTREAM_TIMEOUT_SECS, ENV_UPSTREAM_URL,
};
use crate::domain::TraceFilterParams;

#[derive(Parser)]
#[command(name = "tracescope")]
#[command(version, about = "Trace analytics for LLM agent runs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Base URL of the span producer API
    #[arg(long, global = true, env = ENV_UPSTREAM_URL)]
    pub upstream_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, global = true, env = ENV_UPSTREAM_TIMEOUT_SECS)]
    pub upstream_timeout: Option<u64>,

    /// Read spans from a JSON file instead of the upstream API
    #[arg(long, global = true, env = ENV_FIXTURE)]
    pub fixture: Option<PathBuf>,
}

/// Trace list filters. Values stay raw; unusable ones are ignored downstream.
#[derive(Args, Clone, Debug, Default)]
pub struct TraceFilterArgs {
    /// Case-insensitive match on trace id, root span name or session id
    #[arg(long)]
    pub search: Option<String>,

    /// Minimum trace duration in ms
    #[arg(long)]
    pub min_duration: Option<String>,

    /// Maximum trace duration in ms
    #[arg(long)]
    pub max_duration: Option<String>,

    /// success, slow or error
    #[arg(long)]
    pub status: Option<String>,

    /// Exact session id
    #[arg(long)]
    pub session_id: Option<String>,

    /// 15m, 1h, 6h, 24h, 7d, 30d or all
    #[arg(long)]
    pub date_range: Option<String>,

    /// timestamp, duration or span_count
    #[arg(long)]
    pub sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    pub sort_order: Option<String>,
}

impl From<TraceFilterArgs> for TraceFilterParams {
    fn from(args: TraceFilterArgs) -> Self {
        Self {
            search: args.search,
            min_duration: args.min_duration,
            max_duration: args.max_duration,
            status: args.status,
            session_id: args.session_id,
            date_range: args.date_range,
            sort_by: args.sort_by,
            sort_order: args.sort_order,
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the query API server (default command)
    Serve,
    /// List traces with filters and quick stats
    Traces {
        #[command(flatten)]
        filters: TraceFilterArgs,

        /// Print at most this many traces
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the span tree of a trace
    Tree { trace_id: String },
    /// Render a trace as a text gantt chart
    Timeline {
        trace_id: String,

        /// Total output width in columns
        #[arg(long)]
        width: Option<usize>,

        /// Hide the descendants of this span (repeatable)
        #[arg(long = "collapse", value_name = "SPAN_ID")]
        collapse: Vec<String>,
    },
    /// Aggregate metrics over filtered traces
    Metrics {
        /// Include span-level rates and breakdowns for this trace
        #[arg(long)]
        trace_id: Option<String>,

        #[command(flatten)]
        filters: TraceFilterArgs,
    },
    /// Group traces by session
    Sessions,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub upstream_url: Option<String>,
    pub upstream_timeout_secs: Option<u64>,
    pub fixture: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    split(Cli::parse())
}

fn split(cli: Cli) -> (CliConfig, Option<Commands>) {
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        upstream_url: cli.upstream_url,
        upstream_timeout_secs: cli.upstream_timeout,
        fixture: cli.fixture,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> (CliConfig, Option<Commands>) {
        split(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_no_subcommand() {
        let (config, command) = parse_from(&["tracescope", "--port", "9000"]);
        assert!(command.is_none());
        assert_eq!(config.port, Some(9000));
    }

    #[test]
    fn test_timeline_collapse_is_repeatable() {
        let (_, command) = parse_from(&[
            "tracescope",
            "timeline",
            "trace-1",
            "--width",
            "80",
            "--collapse",
            "a",
            "--collapse",
            "b",
        ]);
        match command {
            Some(Commands::Timeline {
                trace_id,
                width,
                collapse,
            }) => {
                assert_eq!(trace_id, "trace-1");
                assert_eq!(width, Some(80));
                assert_eq!(collapse, vec!["a", "b"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_trace_filters_stay_raw() {
        let (config, command) = parse_from(&[
            "tracescope",
            "traces",
            "--min-duration",
            "abc",
            "--status",
            "slow",
            "--fixture",
            "spans.json",
        ]);
        assert_eq!(config.fixture, Some(PathBuf::from("spans.json")));
        let Some(Commands::Traces { filters, limit }) = command else {
            panic!("expected traces command");
        };
        assert!(limit.is_none());
        let params = TraceFilterParams::from(filters);
        assert_eq!(params.min_duration.as_deref(), Some("abc"));
        assert_eq!(params.parse().min_duration_ms, None);
        assert_eq!(params.status.as_deref(), Some("slow"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let (config, command) = parse_from(&[
            "tracescope",
            "metrics",
            "--trace-id",
            "t1",
            "--upstream-url",
            "http://collector:8000/api",
        ]);
        assert_eq!(config.upstream_url.as_deref(), Some("http://collector:8000/api"));
        assert!(matches!(command, Some(Commands::Metrics { trace_id: Some(_), .. })));
    }
}
