//! HTTP middleware (CORS, 404 handler)

use axum::extract::Request;
use axum::http::{Method, header};
use axum::response::IntoResponse;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::types::ApiError;

/// Host values that bind every interface
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

/// Browser origins allowed to call the API
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    /// Local dashboards on the API port and the next one up (dev server)
    pub fn new(host: &str, port: u16) -> Self {
        let hosts: Vec<&str> =
            if is_all_interfaces(host) || host == "127.0.0.1" || host == "localhost" {
                vec!["localhost", "127.0.0.1"]
            } else {
                vec![host]
            };

        let mut origins = Vec::new();
        for h in hosts {
            origins.push(format!("http://{}:{}", h, port));
            origins.push(format!("http://{}:{}", h, port.saturating_add(1)));
            origins.push(format!("http://{}", h));
        }
        Self { origins }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }
}

/// Read-only API: GET plus preflight
pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    let allowed = allowed.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().is_ok_and(|o| allowed.is_allowed(o))
        }))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
}

pub async fn handle_404(req: Request) -> impl IntoResponse {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404]");
    ApiError::not_found("ROUTE_NOT_FOUND", format!("No route for {}", req.uri().path()))
}
