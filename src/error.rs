use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const SYMBOL_REQUIRED: &str = "Stock symbol is required";
pub const SYMBOL_NOT_FOUND: &str = "Stock symbol not found";
pub const API_KEY_MISSING: &str = "API key not configured";

/// Failure talking to a third-party provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("provider notice: {0}")]
    Notice(String),
}

/// Which provider an [`UpstreamError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    MarketData,
    Llm,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upstream::MarketData => write!(f, "Failed to fetch stock data"),
            Upstream::Llm => write!(f, "Failed to generate response"),
        }
    }
}

/// Errors surfaced at the request boundary. `Display` is the message shown
/// to clients; upstream detail only goes to the log.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MisconfiguredService(String),
    #[error("{upstream}")]
    UpstreamUnavailable {
        upstream: Upstream,
        #[source]
        source: UpstreamError,
    },
}

impl ServiceError {
    pub fn upstream(upstream: Upstream, source: UpstreamError) -> Self {
        ServiceError::UpstreamUnavailable { upstream, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::MisconfiguredService(_) | ServiceError::UpstreamUnavailable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServiceError::UpstreamUnavailable { upstream, source } => {
                log::error!("{}: {}", upstream, source);
            }
            ServiceError::MisconfiguredService(msg) => log::error!("Misconfigured service: {}", msg),
            other => log::debug!("Rejected request ({}): {}", status, other),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
