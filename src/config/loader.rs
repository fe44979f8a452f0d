//! Configuration loading from disk and flags.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::cli::Cli;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: file (if any), then flags, then validation.
pub fn load_config(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => ProxyConfig::default(),
    };
    cli.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_only() {
        let cli = Cli::parse_from(["caching-proxy", "--target", "example.com", "--port", "8080"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.upstream.host, "example.com");
        assert_eq!(config.cache.timeout_minutes, 5);
    }

    #[test]
    fn invalid_flags_report_validation_errors() {
        let cli = Cli::parse_from(["caching-proxy", "--target", "example.com", "--cache-timeout", "0"]);
        let err = load_config(&cli).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Invalid port 0, Invalid cache-timeout 0"
        );
    }

    #[test]
    fn file_then_flags() {
        let path = std::env::temp_dir().join(format!("caching-proxy-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[upstream]\nhost = \"file-host\"\n[listener]\nport = 7070\n[cache]\ntimeout_minutes = 9\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "caching-proxy",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "7171",
        ]);
        let config = load_config(&cli).unwrap();
        std::fs::remove_file(&path).unwrap_or_default();

        assert_eq!(config.upstream.host, "file-host");
        assert_eq!(config.listener.port, 7171);
        assert_eq!(config.cache.timeout_minutes, 9);
    }

    #[test]
    fn missing_file_is_io_error() {
        let cli = Cli::parse_from(["caching-proxy", "--config", "/definitely/not/here.toml"]);
        assert!(matches!(load_config(&cli), Err(ConfigError::Io(_))));
    }
}
