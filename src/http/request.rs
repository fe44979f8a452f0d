//! Request inspection.
//!
//! # Responsibilities
//! - Assign a correlation id to every request
//! - Derive the cache key
//! - Buffer a body for logging while keeping it forwardable
//! - Cap how much of a body reaches the log
//!
//! # Design Decisions
//! - An inbound `X-Request-Id` is reused so ids survive proxy chains
//! - The cache key is the path alone; query and method never vary it

use std::borrow::Cow;
use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Uri};
use uuid::Uuid;

use crate::http::response::ProxyError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation id attached to every log line of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the inbound `X-Request-Id` when it is usable, otherwise generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header form for propagation upstream.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache key for a request: its path.
pub fn cache_key(uri: &Uri) -> String {
    uri.path().to_string()
}

/// Read the whole body so it can be logged and then forwarded unchanged.
///
/// Only transport failures are errors; there is no size cap.
pub async fn inspect_body(body: Body) -> Result<Bytes, ProxyError> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(ProxyError::BodyRead)
}

/// Printable prefix of `body`, at most `limit` bytes, for the request log.
pub fn log_excerpt(body: &[u8], limit: usize) -> Cow<'_, str> {
    if body.len() <= limit {
        return String::from_utf8_lossy(body);
    }
    let mut excerpt = String::from_utf8_lossy(&body[..limit]).into_owned();
    excerpt.push_str(&format!("... ({} bytes truncated)", body.len() - limit));
    Cow::Owned(excerpt)
}
