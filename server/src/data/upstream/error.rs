use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream connection failed ({url}): {message}")]
    Connect { url: String, message: String },

    #[error("Upstream request timed out ({url})")]
    Timeout { url: String },

    #[error("Upstream returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Upstream payload could not be decoded ({url}): {message}")]
    Decode { url: String, message: String },

    #[error("Upstream request failed ({url}): {message}")]
    Request { url: String, message: String },

    #[error("Upstream configuration error: {0}")]
    Config(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpstreamError {
    /// Classify a reqwest failure for `url`
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        let url = url.to_string();
        if e.is_timeout() {
            Self::Timeout { url }
        } else if e.is_connect() {
            Self::Connect {
                url,
                message: e.to_string(),
            }
        } else if e.is_decode() {
            Self::Decode {
                url,
                message: e.to_string(),
            }
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                url,
            }
        } else {
            Self::Request {
                url,
                message: e.to_string(),
            }
        }
    }

    /// Connect errors, timeouts and 5xx responses are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}
