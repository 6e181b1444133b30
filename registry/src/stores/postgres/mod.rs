//! PostgreSQL storage implementation.

pub mod registry;

pub use registry::PostgresGuestRegistry;
