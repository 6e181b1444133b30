//! Provider contracts for authentication storage.
//!
//! Each trait describes one capability the service needs. Production
//! code wires the Postgres stores; tests wire the in-memory mocks.

mod session;
mod usuario;

pub use session::SessionStore;
pub use usuario::UsuarioRepository;
