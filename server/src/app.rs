//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, TraceFilterArgs};
use crate::core::config::AppConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, DEFAULT_TEXT_TIMELINE_WIDTH, ENV_LOG};
use crate::core::render::{print_json, render_text_timeline, text_timeline_options};
use crate::core::shutdown::ShutdownService;
use crate::data::TraceSource;
use crate::data::types::Span;
use crate::data::upstream::open_source;
use crate::domain::filters::{self, FilterContext, TraceFilterParams};
use crate::domain::timeline::{self, CollapsedSet};
use crate::domain::{TraceStatusIndex, build_span_tree, compute_metrics, group_by_session};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub source: Arc<dyn TraceSource>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config).await?;
        match command {
            Some(Commands::Serve) | None => Self::start_server(app).await,
            Some(Commands::Traces { filters, limit }) => app.print_traces(filters, limit).await,
            Some(Commands::Tree { trace_id }) => app.print_tree(&trace_id).await,
            Some(Commands::Timeline {
                trace_id,
                width,
                collapse,
            }) => app.print_timeline(&trace_id, width, collapse).await,
            Some(Commands::Metrics { trace_id, filters }) => {
                app.print_metrics(trace_id.as_deref(), filters).await
            }
            Some(Commands::Sessions) => app.print_sessions().await,
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let source = open_source(&config.upstream)
            .await
            .context("Failed to open trace source")?;
        tracing::debug!(source = source.name(), "Trace source ready");

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            source,
        })
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        let source_label = match &app.config.upstream.fixture_path {
            Some(path) => path.display().to_string(),
            None => app.config.upstream.base_url.clone(),
        };
        banner::print_banner(&app.config.server.host, app.config.server.port, &source_label);

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    fn filter_context<'a>(&self) -> FilterContext<'a> {
        FilterContext::new(Utc::now()).with_thresholds(self.config.filters.thresholds())
    }

    async fn trace_spans(&self, trace_id: &str) -> Result<Vec<Span>> {
        let spans = self
            .source
            .get_trace(trace_id)
            .await
            .with_context(|| format!("Failed to fetch trace {}", trace_id))?;
        if spans.is_empty() {
            anyhow::bail!("Trace not found: {}", trace_id);
        }
        Ok(spans)
    }

    async fn print_traces(&self, args: TraceFilterArgs, limit: Option<usize>) -> Result<()> {
        let traces = self
            .source
            .list_traces()
            .await
            .context("Failed to list traces")?;

        let ctx = self.filter_context();
        let mut filtered = filters::apply(&traces, &TraceFilterParams::from(args).parse(), &ctx);
        let quick_stats = filters::quick_stats(&filtered, &ctx);
        if let Some(limit) = limit {
            filtered.truncate(limit);
        }

        print_json(&serde_json::json!({
            "traces": filtered,
            "quick_stats": quick_stats,
        }))
    }

    async fn print_tree(&self, trace_id: &str) -> Result<()> {
        let spans = self.trace_spans(trace_id).await?;
        print_json(&build_span_tree(&spans))
    }

    async fn print_timeline(
        &self,
        trace_id: &str,
        width: Option<usize>,
        collapse: Vec<String>,
    ) -> Result<()> {
        let spans = self.trace_spans(trace_id).await?;
        let forest = build_span_tree(&spans);
        let collapsed: CollapsedSet = collapse.into_iter().collect();
        let options = text_timeline_options(width.unwrap_or(DEFAULT_TEXT_TIMELINE_WIDTH));

        let layout = timeline::layout(&forest, &collapsed, &options);
        print!("{}", render_text_timeline(&layout, &options));
        Ok(())
    }

    async fn print_metrics(&self, trace_id: Option<&str>, args: TraceFilterArgs) -> Result<()> {
        let traces = self
            .source
            .list_traces()
            .await
            .context("Failed to list traces")?;
        let spans = match trace_id {
            Some(id) => self.trace_spans(id).await?,
            None => Vec::new(),
        };

        let statuses = TraceStatusIndex::from_spans(&spans);
        let ctx = self.filter_context().with_statuses(&statuses);
        let filtered = filters::apply(&traces, &TraceFilterParams::from(args).parse(), &ctx);

        print_json(&compute_metrics(
            &filtered,
            &spans,
            &self.config.metrics.options(),
        ))
    }

    async fn print_sessions(&self) -> Result<()> {
        let traces = self
            .source
            .list_traces()
            .await
            .context("Failed to list traces")?;
        let labels = self.source.session_labels().await;
        print_json(&group_by_session(&traces, &labels))
    }
}
