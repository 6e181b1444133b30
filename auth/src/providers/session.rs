//! Session persistence contract.

use crate::error::Result;
use crate::state::Session;

/// Storage for server-side sessions, keyed by token digest.
///
/// Only digests cross this boundary. The raw bearer token lives in the
/// client and is hashed by the service before any lookup.
pub trait SessionStore: Send + Sync {
    /// Stores a freshly issued session.
    fn put_session(&self, session: &Session) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Looks up a live session by token digest.
    ///
    /// Expired rows count as absent; implementations may drop them on
    /// the way out.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`](crate::AuthError::InvalidToken)
    /// when the digest is unknown, revoked, or expired.
    fn get_session(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Session>> + Send;

    /// Revokes one session. Unknown digests are a no-op, so logout is
    /// idempotent.
    fn revoke_session(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Removes every expired session, returning how many were dropped.
    fn purge_expired(&self) -> impl std::future::Future<Output = Result<u64>> + Send;
}
