//! Storage implementations for the guest registry.
//!
//! - **PostgreSQL** (`postgres` feature) - Persistent registry with
//!   per-guest row locking for confirmations

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresGuestRegistry;
