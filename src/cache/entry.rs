//! Captured upstream responses.

use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

/// A complete upstream response, immutable once stored.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Build a client response replaying status, every header value and the body.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        response
    }
}

impl fmt::Display for CachedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self.status, &self.headers, &self.body)
    }
}

/// Shared textual form of a response, used for dumps of live and cached responses.
pub(crate) fn render(
    f: &mut fmt::Formatter<'_>,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> fmt::Result {
    write!(
        f,
        "{{Target-response: Status {} - Header {:?} - Body {}}}",
        status.as_u16(),
        headers,
        String::from_utf8_lossy(body)
    )
}
