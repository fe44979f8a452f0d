//! Failure responses.
//!
//! # Responsibilities
//! - Classify per-request failures that happen before forwarding
//! - Log them under the request's correlation id
//! - Answer with a uniform 500 (internal) or 502 (upstream transport) body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body written for every internal failure.
pub const INTERNAL_ERROR_BODY: &str = "Internal proxy error\n";

/// Body written when the upstream cannot be reached.
pub const UPSTREAM_FAILURE_BODY: &str = "Upstream request failed";

/// Per-request failures recovered by answering 500.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("cannot resolve upstream {url:?}: {reason}")]
    UpstreamResolution { url: String, reason: String },
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),
}

/// Log `err` and build the uniform 500 response.
pub fn error_response(err: &ProxyError) -> Response {
    tracing::error!(error = %err, "Internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

/// Response for upstream transport failures.
pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, UPSTREAM_FAILURE_BODY).into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}
