//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher (miss) → capture completes → store(key, response, ttl)
//!                                             → spawned timer → delete(key)
//! dispatcher (next request) → lookup(key) → replay CachedResponse
//! ```
//!
//! # Design Decisions
//! - One entry per request path; last writer wins
//! - Entries are shared as `Arc<CachedResponse>`, so readers never see a partial value
//! - Eviction is fire-and-forget and cannot be cancelled

pub mod entry;
pub mod store;

pub use entry::CachedResponse;
pub use store::CacheStore;
