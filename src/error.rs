//! Per-request error types.
//!
//! Every failure on the request path ends up as a [`ProxyError`], which is the
//! `{status, message}` body clients see. Nothing on the request path panics.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while running the prefilter chain.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("No filter invoker registered for kind {name:?}")]
    UnknownKind { name: String },

    #[error("Error {reason} processing the filter {endpoint}")]
    Transport { endpoint: String, reason: String },

    #[error("Error response while processing the filter {endpoint}")]
    Rejected { status: u16, endpoint: String },
}

/// Failure while forwarding to the resolved destination.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Error creating a reverse proxy for destination {destination}: {reason}")]
    InvalidDestination { destination: String, reason: String },

    #[error("Upstream request failed: {0}")]
    Upstream(String),
}

/// Structured error returned to clients instead of a proxied response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyError {
    /// HTTP status, string-encoded.
    pub status: String,
    pub message: String,
}

impl ProxyError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16().to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<FilterError> for ProxyError {
    fn from(err: FilterError) -> Self {
        match &err {
            FilterError::Rejected { status, .. } => Self {
                status: status.to_string(),
                message: err.to_string(),
            },
            FilterError::UnknownKind { .. } | FilterError::Transport { .. } => {
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<DispatchError> for ProxyError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidDestination { .. } => Self::internal(err.to_string()),
            DispatchError::Upstream(_) => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self
            .status
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
        {
            Some(status) => status,
            None => {
                tracing::error!(status = %self.status, "Error writing error response, invalid status");
                return plain_text(self.message);
            }
        };

        match serde_json::to_vec(&self) {
            Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Error writing error response");
                plain_text(self.message)
            }
        }
    }
}

fn plain_text(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        message,
    )
        .into_response()
}
