//! In-memory provider implementations.
//!
//! Test fixtures, and the backend the server falls back to when no
//! database is configured. State lives behind `Arc<Mutex<_>>`, so
//! clones observe the same data.

mod session;
mod usuario;

pub use session::MockSessionStore;
pub use usuario::MockUsuarioRepository;
