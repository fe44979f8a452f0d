//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher, cache, capture produce:
//!     → logging.rs (structured log events inside a per-request span)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every request runs in a `request` span carrying its `req_id`
//! - Metrics go through the `metrics` facade; without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
