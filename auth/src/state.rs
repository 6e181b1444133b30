//! Operator and session state types.

use chrono::{DateTime, Utc};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for an operator account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UsuarioId(pub i64);

// ═══════════════════════════════════════════════════════════════════════
// Core State Types
// ═══════════════════════════════════════════════════════════════════════

/// An operator account.
///
/// `hashed_password` is the PBKDF2 record produced by
/// [`crate::password::hash_password`]; the clear password never leaves
/// the login request. This type is deliberately not serializable, the
/// web layer shapes its own responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Usuario {
    /// Unique identifier.
    pub id: UsuarioId,

    /// Login name, unique.
    pub username: String,

    /// Display name.
    pub nombre_completo: String,

    /// PBKDF2 password record.
    pub hashed_password: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A server-side session backing one bearer token.
///
/// Only the SHA-256 hash of the token is stored; the token itself is
/// handed to the client once at login and never kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// SHA-256 of the bearer token, base64 encoded.
    pub token_hash: String,

    /// Operator the session belongs to.
    pub usuario_id: UsuarioId,

    /// Login name, cached for log lines.
    pub username: String,

    /// Issue timestamp.
    pub created_at: DateTime<Utc>,

    /// Hard expiry; the session is unusable after this instant.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Drafts
// ═══════════════════════════════════════════════════════════════════════

/// Data for an operator about to be created. The password is already
/// hashed by the time a repository sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NuevoUsuario {
    /// Login name.
    pub username: String,
    /// Display name.
    pub nombre_completo: String,
    /// PBKDF2 password record.
    pub hashed_password: String,
}

/// Replacement data for an operator update.
#[derive(Debug, Clone, PartialEq)]
pub struct UsuarioCambios {
    /// New login name.
    pub username: String,
    /// New display name.
    pub nombre_completo: String,
    /// New PBKDF2 record, or `None` to keep the current password.
    pub hashed_password: Option<String>,
}
