//! Per-request proxy dispatch.
//!
//! # Request States
//! ```text
//! RECEIVED → CACHE_CHECK ─┬─ hit  → replay cached response          → RESPONDED
//!                         └─ miss → RESOLVE_UPSTREAM ─┬─ error → 500  → RESPONDED
//!                                                     └─ FORWARD → CAPTURE → MAYBE_CACHE → RESPONDED
//! ```
//!
//! # Design Decisions
//! - No request-level locking; concurrent misses on one path all go upstream
//! - Only GET responses with a 2xx status are stored
//! - Upstream transport errors answer 502 and are never retried

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use hyper::body::Body as HttpBody;
use tracing::Instrument;

use crate::http::capture::{CaptureBody, ResponseCapture};
use crate::http::headers::strip_hop_by_hop;
use crate::http::request::{cache_key, inspect_body, log_excerpt, RequestId};
use crate::http::response::{bad_gateway, error_response};
use crate::http::server::AppState;
use crate::http::upstream::UpstreamTarget;
use crate::observability::metrics;

/// Whether a forwarded response may be stored: GET with a 2xx status.
pub fn is_cacheable(method: &Method, status: StatusCode) -> bool {
    *method == Method::GET && status.is_success()
}

/// Entry point for every inbound request.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let span = tracing::info_span!("request", req_id = %request_id);
    dispatch(state, request, request_id).instrument(span).await
}

async fn dispatch(state: AppState, request: Request, request_id: RequestId) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let key = cache_key(request.uri());

    tracing::info!(method = %method, path = %key, "Request received");

    if let Some(cached) = state.cache.lookup(&key) {
        metrics::record_cache_lookup(true);
        metrics::record_request(method.as_str(), cached.status().as_u16(), "cache", start);
        tracing::info!("Return response from cache");
        return cached.to_response();
    }
    metrics::record_cache_lookup(false);
    tracing::debug!("Cache miss");

    let upstream = &state.config.upstream;
    let target = match UpstreamTarget::resolve(upstream.scheme(), &upstream.host) {
        Ok(target) => target,
        Err(e) => {
            metrics::record_request(method.as_str(), 500, "proxy", start);
            return error_response(&e);
        }
    };

    let (parts, body) = request.into_parts();

    let body = if state.config.logging.log_request_body && method != Method::GET {
        match inspect_body(body).await {
            Ok(bytes) => {
                let excerpt = log_excerpt(&bytes, state.config.logging.log_body_limit);
                tracing::info!(body = %excerpt, "Request's body");
                outbound_buffered(bytes)
            }
            Err(e) => {
                metrics::record_request(method.as_str(), 500, "proxy", start);
                return error_response(&e);
            }
        }
    } else {
        outbound_streaming(body)
    };

    let client_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let (url, headers) = target.rewrite(&parts, client_ip, &request_id);

    tracing::info!(upstream = %url, "Making proxy");

    let mut outbound = state.client.request(method.clone(), url).headers(headers);
    if let Some(body) = body {
        outbound = outbound.body(body);
    }

    let upstream_response = match outbound.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Upstream error");
            metrics::record_request(method.as_str(), 502, "upstream", start);
            return bad_gateway();
        }
    };

    let status = upstream_response.status();
    let mut headers = upstream_response.headers().clone();
    strip_hop_by_hop(&mut headers);
    metrics::record_request(method.as_str(), status.as_u16(), "upstream", start);

    let capture = ResponseCapture::new(&method, status, headers.clone());
    let on_complete = capture_handler(&state, method, key);
    let body = CaptureBody::new(
        Body::from_stream(upstream_response.bytes_stream()),
        capture,
        on_complete,
    );

    let mut response = Response::new(Body::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Runs once the client has been handed the whole upstream body.
fn capture_handler(
    state: &AppState,
    method: Method,
    key: String,
) -> impl FnOnce(ResponseCapture) + Send + 'static {
    let cache = state.cache.clone();
    let ttl = state.config.cache.ttl();
    let log_response = state.config.logging.log_target_response;

    move |capture| {
        if log_response {
            tracing::info!("{}", capture);
        }
        if is_cacheable(&method, capture.status()) {
            tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "Storing response in cache");
            cache.store(key, capture.into_cached(), ttl);
        }
    }
}

fn outbound_buffered(bytes: Bytes) -> Option<reqwest::Body> {
    if bytes.is_empty() {
        None
    } else {
        Some(reqwest::Body::from(bytes))
    }
}

fn outbound_streaming(body: Body) -> Option<reqwest::Body> {
    if body.size_hint().exact() == Some(0) {
        None
    } else {
        Some(reqwest::Body::wrap_stream(body.into_data_stream()))
    }
}
