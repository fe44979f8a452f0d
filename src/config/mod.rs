//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs) + optional TOML file
//!     → loader.rs (parse, overlay flags)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc with every request handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no runtime reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde/clap) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, ConfigError};
pub use schema::{CacheConfig, ListenerConfig, LogFormat, LoggingConfig, ProxyConfig, UpstreamConfig};
