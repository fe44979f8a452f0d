//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and clap handle syntactic)
//! - Validate value ranges (port >= 1, cache timeout >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - The upstream host is only checked for presence; it is parsed per request

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing target host")]
    MissingTarget,
    #[error("Invalid port {0}")]
    InvalidPort(u16),
    #[error("Invalid cache-timeout {0}")]
    InvalidCacheTimeout(u64),
    #[error("Invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
}

/// Check a configuration before it is accepted into the system.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::MissingTarget);
    }
    if config.listener.port < 1 {
        errors.push(ValidationError::InvalidPort(config.listener.port));
    }
    if config.cache.timeout_minutes < 1 {
        errors.push(ValidationError::InvalidCacheTimeout(config.cache.timeout_minutes));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
