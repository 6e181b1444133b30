//! Error types for operator accounts and sessions.
//!
//! As in the registry crate, display strings are the Spanish messages
//! the terminal shows verbatim; variant names stay in English. Two
//! variants may share a display string while mapping to different
//! HTTP statuses through the category helpers.

use thiserror::Error;

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for operator accounts and sessions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown username or wrong password. One message for both, so
    /// login probes cannot tell which usernames exist.
    #[error("Username o contraseña incorrectos")]
    InvalidCredentials,

    /// Bearer token unknown, expired or revoked.
    #[error("Token inválido")]
    InvalidToken,

    /// The session is live but its operator was deleted.
    #[error("Usuario no encontrado")]
    SessionUserGone,

    // ═══════════════════════════════════════════════════════════
    // Operator Account Errors
    // ═══════════════════════════════════════════════════════════

    /// Operator id does not exist.
    #[error("Usuario no encontrado")]
    UsuarioNotFound,

    /// Login name already registered.
    #[error("El nombre de usuario ya existe")]
    UsernameTaken,

    /// Login name blank.
    #[error("El nombre de usuario es obligatorio")]
    UsernameRequired,

    /// Login name over the storage limit.
    #[error("El nombre de usuario supera los 50 caracteres")]
    UsernameTooLong,

    /// Password blank on account creation.
    #[error("La contraseña es obligatoria")]
    PasswordRequired,

    /// Display name blank.
    #[error("El nombre completo es obligatorio")]
    NombreCompletoRequired,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AuthError {
    /// Returns `true` if this error maps to a 401 response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use asistencia_auth::AuthError;
    /// assert!(AuthError::InvalidToken.is_unauthorized());
    /// assert!(!AuthError::UsuarioNotFound.is_unauthorized());
    /// ```
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::InvalidToken | Self::SessionUserGone
        )
    }

    /// Returns `true` if this error maps to a 404 response.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UsuarioNotFound)
    }

    /// Returns `true` if this error is a uniqueness conflict.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::UsernameTaken)
    }

    /// Returns `true` if this error is due to invalid caller input.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UsernameRequired
                | Self::UsernameTooLong
                | Self::PasswordRequired
                | Self::NombreCompletoRequired
        )
    }
}
