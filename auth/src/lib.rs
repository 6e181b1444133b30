//! Operator accounts and sessions for the attendance service.
//!
//! Staff log in with username and password; a successful login mints
//! an opaque bearer token whose SHA-256 hash is stored server-side
//! with an expiry. Tokens are revocable (logout deletes the session)
//! and every protected route re-validates against the session store,
//! so removing an operator locks them out immediately.
//!
//! The crate provides:
//!
//! - [`AuthService`], the orchestration layer handlers talk to
//! - [`providers::UsuarioRepository`] and [`providers::SessionStore`],
//!   the storage traits
//! - [`mocks`], in-memory implementations for tests and database-less
//!   deployments
//! - [`stores::postgres`], PostgreSQL implementations (behind the
//!   `postgres` feature)
//! - [`password`] and [`token`], the PBKDF2 hashing and token minting
//!   primitives

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod mocks;
pub mod password;
pub mod providers;
pub mod service;
pub mod state;
pub mod stores;
pub mod token;

pub use error::{AuthError, Result};
pub use providers::{SessionStore, UsuarioRepository};
pub use service::AuthService;
pub use state::{NuevoUsuario, Session, Usuario, UsuarioCambios, UsuarioId};
