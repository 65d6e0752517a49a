//! API server initialization

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::{self, AnalyticsApiState};
use crate::core::CoreApp;
use crate::core::constants::API_PREFIX;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Serve until shutdown is triggered. The server task is registered with the
    /// shutdown service, so `ShutdownService::shutdown` drains in-flight requests.
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let host = app.config.server.host.clone();
        let port = app.config.server.port;

        let state = AnalyticsApiState {
            source: app.source.clone(),
            thresholds: app.config.filters.thresholds(),
            timeline: app.config.timeline,
            metrics: app.config.metrics.options(),
        };
        let router = build_router(state, &allowed_origins);

        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", host, port))?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, source = app.source.name(), "API server listening");

        let server_shutdown = shutdown.clone();
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(server_shutdown.wait())
                .await
            {
                tracing::error!(error = %e, "API server stopped unexpectedly");
                server_shutdown.trigger();
            }
        });
        shutdown.register(server).await;

        shutdown.wait().await;
        Ok(app)
    }
}

/// Full router with middleware; used by the server and by router tests
pub fn build_router(state: AnalyticsApiState, allowed_origins: &AllowedOrigins) -> Router {
    Router::new()
        .nest(API_PREFIX, routes::routes(state))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
