//! Shared API types
//!
//! Error envelope and pagination used across all endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use validator::ValidationError;

use crate::core::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::data::UpstreamError;

pub const DEFAULT_PAGE: u32 = 1;
pub const MAX_PAGE: u32 = 10_000;

pub fn validate_page(page: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::new("page_min").with_message("Page must be >= 1".into()));
    }
    if page > MAX_PAGE {
        return Err(ValidationError::new("page_max")
            .with_message(format!("Page must be <= {}", MAX_PAGE).into()));
    }
    Ok(())
}

pub fn validate_limit(limit: u32) -> Result<(), ValidationError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ValidationError::new("limit_range")
            .with_message(format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT).into()));
    }
    Ok(())
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    BadGateway { code: String, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn trace_not_found(trace_id: &str) -> Self {
        Self::not_found("TRACE_NOT_FOUND", format!("Trace not found: {}", trace_id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Upstream failures surface as 502; details stay in the log
    pub fn from_upstream(e: UpstreamError) -> Self {
        tracing::error!(error = %e, "Upstream request failed");
        match e {
            UpstreamError::Config(message) | UpstreamError::Fixture(message) => {
                Self::internal(message)
            }
            _ => Self::BadGateway {
                code: "UPSTREAM_ERROR".to_string(),
                message: "Trace source is unavailable".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::BadGateway { code, message } => {
                (StatusCode::BAD_GATEWAY, "bad_gateway", code, message)
            }
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

pub fn default_page() -> u32 {
    DEFAULT_PAGE
}

pub fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        Self {
            page,
            limit,
            total_items,
            total_pages: total_items.div_ceil(u64::from(limit.max(1))),
        }
    }
}

/// Slice one page out of an already ordered list
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> (Vec<T>, PaginationMeta) {
    let meta = PaginationMeta::new(page, limit, items.len() as u64);
    let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
    let data = items.into_iter().skip(skip).take(limit as usize).collect();
    (data, meta)
}
