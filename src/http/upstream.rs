//! Upstream target resolution and request rewriting.
//!
//! # Responsibilities
//! - Build the upstream base URL from scheme and configured host
//! - Map an inbound URI onto the upstream (path prefix join, query merge)
//! - Prepare outbound headers (Host, X-Forwarded-*, request id)

use std::fmt;
use std::net::IpAddr;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, HOST};
use axum::http::request::Parts;
use axum::http::Uri;
use url::Url;

use crate::http::headers::strip_hop_by_hop;
use crate::http::request::{RequestId, X_REQUEST_ID};
use crate::http::response::ProxyError;

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// The single backend requests are forwarded to. Resolved per request.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base: Url,
    authority: HeaderValue,
}

impl UpstreamTarget {
    /// Parse `scheme://host` into a target.
    pub fn resolve(scheme: &str, host: &str) -> Result<Self, ProxyError> {
        let raw = format!("{}://{}", scheme, host);
        let failed = |reason: String| ProxyError::UpstreamResolution {
            url: raw.clone(),
            reason,
        };

        let base = Url::parse(&raw).map_err(|e| failed(e.to_string()))?;
        let host_str = match base.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(failed("missing host".to_string())),
        };
        let authority = match base.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_string(),
        };
        let authority = HeaderValue::from_str(&authority).map_err(|e| failed(e.to_string()))?;

        Ok(Self { base, authority })
    }

    /// `host[:port]` as sent in the outbound `Host` header.
    pub fn authority(&self) -> &HeaderValue {
        &self.authority
    }

    /// Upstream URL for an inbound request URI.
    pub fn url_for(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        url.set_path(&join_paths(self.base.path(), uri.path()));

        let query = match (non_empty(self.base.query()), non_empty(uri.query())) {
            (Some(base), Some(req)) => Some(format!("{}&{}", base, req)),
            (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
            (None, None) => None,
        };
        url.set_query(query.as_deref());
        url
    }

    /// Outbound URL and headers for an inbound request.
    pub fn rewrite(
        &self,
        parts: &Parts,
        client_ip: Option<IpAddr>,
        request_id: &RequestId,
    ) -> (Url, HeaderMap) {
        let original_host = parts.headers.get(HOST).cloned().or_else(|| {
            parts
                .uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });

        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);

        match original_host {
            Some(host) => {
                headers.insert(X_FORWARDED_HOST, host);
            }
            None => {
                headers.remove(X_FORWARDED_HOST);
            }
        }
        headers.insert(HOST, self.authority.clone());

        if let Some(ip) = client_ip {
            let prior: Vec<&str> = headers
                .get_all(X_FORWARDED_FOR)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            let chain = if prior.is_empty() {
                ip.to_string()
            } else {
                format!("{}, {}", prior.join(", "), ip)
            };
            if let Ok(value) = HeaderValue::from_str(&chain) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        if let Some(value) = request_id.header_value() {
            headers.insert(X_REQUEST_ID, value);
        }

        (self.url_for(&parts.uri), headers)
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Join two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
