//! Mock registry implementation.
//!
//! An in-memory `GuestRegistry` used by unit and integration tests,
//! and wired in as the server's backend when no database is
//! configured.

pub mod registry;

pub use registry::MockGuestRegistry;
