//! Operator account persistence contract.

use crate::error::Result;
use crate::state::{NuevoUsuario, Usuario, UsuarioCambios, UsuarioId};

/// Storage for operator accounts.
///
/// Implementations return [`Usuario`] rows with the password hash
/// included. Callers that shape API responses drop the hash themselves.
pub trait UsuarioRepository: Send + Sync {
    /// Lists every operator, oldest first.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Usuario>>> + Send;

    /// Fetches one operator by id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`](crate::AuthError::UsuarioNotFound)
    /// when no operator has that id.
    fn get(&self, id: UsuarioId) -> impl std::future::Future<Output = Result<Usuario>> + Send;

    /// Fetches one operator by username.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`](crate::AuthError::UsuarioNotFound)
    /// when no operator has that username.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Usuario>> + Send;

    /// Inserts a new operator and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`](crate::AuthError::UsernameTaken)
    /// when the username already exists.
    fn create(
        &self,
        nuevo: &NuevoUsuario,
    ) -> impl std::future::Future<Output = Result<Usuario>> + Send;

    /// Applies changes to one operator and returns the updated row.
    ///
    /// A `None` password in `cambios` keeps the stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`](crate::AuthError::UsuarioNotFound)
    /// when the operator does not exist, and
    /// [`AuthError::UsernameTaken`](crate::AuthError::UsernameTaken) when the
    /// new username belongs to someone else.
    fn update(
        &self,
        id: UsuarioId,
        cambios: &UsuarioCambios,
    ) -> impl std::future::Future<Output = Result<Usuario>> + Send;

    /// Removes one operator.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`](crate::AuthError::UsuarioNotFound)
    /// when the operator does not exist.
    fn delete(&self, id: UsuarioId) -> impl std::future::Future<Output = Result<()>> + Send;
}
