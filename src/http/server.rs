//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing)
//! - Build the upstream client
//! - Bind server to listener and stop on shutdown signal

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::any, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::cache::CacheStore;
use crate::config::ProxyConfig;
use crate::http::dispatcher::proxy_handler;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub cache: CacheStore,
    pub client: reqwest::Client,
}

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    cache: CacheStore,
}

impl HttpServer {
    /// Create a new HTTP server with its own empty cache.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        Self::with_cache(config, CacheStore::new())
    }

    /// Create a new HTTP server sharing `cache`.
    pub fn with_cache(config: ProxyConfig, cache: CacheStore) -> Result<Self, ServerError> {
        // Redirects are relayed to the client, never followed.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        let config = Arc::new(config);
        let state = AppState {
            config: Arc::clone(&config),
            cache: cache.clone(),
            client,
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
            cache,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving it on a custom transport.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The cache shared by every request handler.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.host,
            scheme = self.config.upstream.scheme(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
