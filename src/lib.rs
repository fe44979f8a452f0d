//! Single-target reverse proxy with a short-lived response cache.

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use cache::{CacheStore, CachedResponse};
pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
