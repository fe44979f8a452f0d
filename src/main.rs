//! Caching reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request     ┌──────────┐   hit    ┌─────────────┐
//!     ──────────────────▶│dispatcher│─────────▶│ cache store │──▶ replay
//!                        └────┬─────┘          └──────▲──────┘
//!                             │ miss                  │ store (GET + 2xx)
//!                             ▼                       │
//!                        ┌──────────┐   body   ┌──────┴──────┐
//!                        │ upstream │─────────▶│   capture   │──▶ Client Response
//!                        │ (reqwest)│          │    body     │
//!                        └──────────┘          └─────────────┘
//! ```

use clap::{CommandFactory, Parser};

use caching_proxy::config::{load_config, Cli};
use caching_proxy::lifecycle::startup;
use caching_proxy::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            let _ = Cli::command().print_help();
            std::process::exit(2);
        }
    };

    init_logging(config.logging.format)?;

    tracing::info!(
        upstream = %config.upstream.host,
        scheme = config.upstream.scheme(),
        port = config.listener.port,
        cache_timeout_minutes = config.cache.timeout_minutes,
        log_request_body = config.logging.log_request_body,
        log_target_response = config.logging.log_target_response,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
