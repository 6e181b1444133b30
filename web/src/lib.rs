//! HTTP API for the attendance confirmation service.
//!
//! This crate is the imperative shell over [`asistencia_registry`] and
//! [`asistencia_auth`]: Axum handlers parse the request, call one
//! service or provider method, and shape the JSON the event terminals
//! expect. Wire messages are Spanish because the terminals display the
//! `detail` strings verbatim; code and logs stay in English.
//!
//! # Request Flow
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extractors** pull out the bearer token and resolve the
//!    operator against the session store
//! 3. **One provider call** does the actual work (search, confirm,
//!    import, operator CRUD)
//! 4. **Errors** map to `{ "detail": ... }` with the right status
//!
//! The router is generic over the storage backends, so the same
//! handlers serve the in-memory mocks (tests, demo mode) and the
//! PostgreSQL stores (`postgres` feature).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId, CurrentOperator};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
