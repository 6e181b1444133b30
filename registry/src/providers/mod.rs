//! Registry providers.
//!
//! Traits for the storage the registry runs on. Handlers depend on
//! these traits, never on a concrete backend, so the same routes serve
//! the in-memory registry in tests and PostgreSQL in production.

pub mod registry;

pub use registry::GuestRegistry;
