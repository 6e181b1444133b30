//! Storage implementations for operators and sessions.
//!
//! - **PostgreSQL** (`postgres` feature) - Persistent accounts and
//!   sessions; expired sessions are dropped on read and swept at login

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresSessionStore, PostgresUsuarioRepository};
