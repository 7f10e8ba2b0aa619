use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to fetch URL: {url} - {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Fetch timeout for URL: {0}")]
    FetchTimeout(String),

    #[error("Upstream returned HTTP {status} for URL: {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to decode JSON: {0}")]
    Decode(String),

    #[error("Body codec failure: {0}")]
    Codec(String),

    #[error("Failed to resolve redirect for {url}: {reason}")]
    RedirectFailed { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl Error {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::FetchTimeout(_) => "FETCH_TIMEOUT",
            Self::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Decode(_) => "DECODE_FAILED",
            Self::Codec(_) => "CODEC_FAILED",
            Self::RedirectFailed { .. } => "REDIRECT_FAILED",
            Self::Config(_) => "INVALID_CONFIG",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::FetchFailed { .. }
            | Self::UpstreamStatus { .. }
            | Self::Decode(_)
            | Self::RedirectFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Self::Codec(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::FetchTimeout(e.url().map(|u| u.to_string()).unwrap_or_default())
        } else {
            Self::FetchFailed {
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                reason: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
