//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → dispatcher.rs (cache lookup, miss handling)
//!         → request.rs (request id, cache key, body inspection)
//!         → upstream.rs (resolve target, rewrite request)
//!         → capture.rs (tee upstream body into a capture)
//!         → response.rs (uniform failure responses)
//!     → Send to client
//! ```

pub mod capture;
pub mod dispatcher;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::{RequestId, X_REQUEST_ID};
pub use response::{ProxyError, INTERNAL_ERROR_BODY};
pub use server::{AppState, HttpServer, ServerError};
