//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{LogFormat, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "caching-proxy")]
#[command(about = "Single-target reverse proxy with a short-lived response cache", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Target host (with optional port and path prefix)
    #[arg(long, value_name = "HOST")]
    pub target: Option<String>,

    /// Bind port
    #[arg(long)]
    pub port: Option<u16>,

    /// Talk to the target over https
    #[arg(long = "use-ssl", alias = "use-tls")]
    pub use_ssl: bool,

    /// Log the body of non-GET origin requests
    #[arg(long)]
    pub log_origin_request: bool,

    /// Log every target response
    #[arg(long)]
    pub log_target_response: bool,

    /// Cache timeout in minutes
    #[arg(long, value_name = "MINUTES")]
    pub cache_timeout: Option<u64>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Expose Prometheus metrics on this address
    #[arg(long, value_name = "ADDR")]
    pub metrics_address: Option<String>,

    /// TOML configuration file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Overlay the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(target) = &self.target {
            config.upstream.host = target.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if self.use_ssl {
            config.upstream.use_tls = true;
        }
        if self.log_origin_request {
            config.logging.log_request_body = true;
        }
        if self.log_target_response {
            config.logging.log_target_response = true;
        }
        if let Some(minutes) = self.cache_timeout {
            config.cache.timeout_minutes = minutes;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(addr) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr.clone();
        }
    }
}
