//! Authentication and operator management service.
//!
//! [`AuthService`] is the only surface the web layer talks to. It owns
//! the credential rules (PBKDF2 verification, token minting, session
//! expiry) and delegates storage to the provider traits, so the same
//! service runs against the mocks or PostgreSQL unchanged.

use chrono::{Duration, Utc};

use crate::error::{AuthError, Result};
use crate::password;
use crate::providers::{SessionStore, UsuarioRepository};
use crate::state::{NuevoUsuario, Session, Usuario, UsuarioCambios, UsuarioId};
use crate::token;

const MAX_USERNAME: usize = 50;

/// Orchestrates login, session validation and operator CRUD.
#[derive(Debug, Clone)]
pub struct AuthService<U, S> {
    usuarios: U,
    sessions: S,
    session_ttl: Duration,
}

impl<U, S> AuthService<U, S>
where
    U: UsuarioRepository,
    S: SessionStore,
{
    /// Builds a service over the given stores. Sessions issued by
    /// [`login`](Self::login) expire `session_ttl` after they are minted.
    #[must_use]
    pub const fn new(usuarios: U, sessions: S, session_ttl: Duration) -> Self {
        Self {
            usuarios,
            sessions,
            session_ttl,
        }
    }

    /// Checks credentials and mints a bearer token.
    ///
    /// Unknown usernames and wrong passwords collapse into the same
    /// error, so a login probe cannot enumerate accounts. Each login
    /// also sweeps expired sessions out of the store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the username does
    /// not exist or the password does not match.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let usuario = match self.usuarios.get_by_username(username).await {
            Ok(usuario) => usuario,
            Err(err) if err.is_not_found() => return Err(AuthError::InvalidCredentials),
            Err(err) => return Err(err),
        };
        if !password::verify_password(password, &usuario.hashed_password) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = token::generate();
        let now = Utc::now();
        let session = Session {
            token_hash: token::hash(&token),
            usuario_id: usuario.id,
            username: usuario.username.clone(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.sessions.put_session(&session).await?;
        tracing::info!(username = %usuario.username, "operator logged in");

        let dropped = self.sessions.purge_expired().await?;
        if dropped > 0 {
            tracing::debug!(dropped, "swept expired sessions");
        }

        Ok(token)
    }

    /// Resolves a bearer token to its live session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the token is unknown,
    /// revoked, or expired.
    pub async fn authenticate(&self, token: &str) -> Result<Session> {
        self.sessions.get_session(&token::hash(token)).await
    }

    /// Resolves a bearer token to the operator behind it.
    ///
    /// The operator row is re-fetched on every call, so deleting an
    /// account locks its sessions out immediately.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for a dead token and
    /// [`AuthError::SessionUserGone`] when the session is live but the
    /// operator no longer exists.
    pub async fn current_user(&self, token: &str) -> Result<Usuario> {
        let session = self.authenticate(token).await?;
        match self.usuarios.get(session.usuario_id).await {
            Ok(usuario) => Ok(usuario),
            Err(err) if err.is_not_found() => Err(AuthError::SessionUserGone),
            Err(err) => Err(err),
        }
    }

    /// Revokes the session behind a token. Unknown tokens are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DatabaseError`] when the store fails.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.revoke_session(&token::hash(token)).await
    }

    /// Creates an operator account from clear credentials.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a field is empty or the username
    /// is longer than 50 characters, and
    /// [`AuthError::UsernameTaken`] when the username exists.
    pub async fn create_usuario(
        &self,
        username: &str,
        nombre_completo: &str,
        password: &str,
    ) -> Result<Usuario> {
        validate_username(username)?;
        validate_nombre(nombre_completo)?;
        if password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }
        self.ensure_username_free(username, None).await?;

        let nuevo = NuevoUsuario {
            username: username.to_string(),
            nombre_completo: nombre_completo.to_string(),
            hashed_password: password::hash_password(password),
        };
        let usuario = self.usuarios.create(&nuevo).await?;
        tracing::info!(username = %usuario.username, id = usuario.id.0, "operator created");
        Ok(usuario)
    }

    /// Replaces an operator's username and display name, and the
    /// password when one is given. An empty or absent password keeps
    /// the stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`] when the operator does
    /// not exist, a validation error for empty fields, and
    /// [`AuthError::UsernameTaken`] when the new username belongs to
    /// someone else.
    pub async fn update_usuario(
        &self,
        id: UsuarioId,
        username: &str,
        nombre_completo: &str,
        password: Option<&str>,
    ) -> Result<Usuario> {
        validate_username(username)?;
        validate_nombre(nombre_completo)?;

        let existing = self.usuarios.get(id).await?;
        if username != existing.username {
            self.ensure_username_free(username, Some(id)).await?;
        }

        let cambios = UsuarioCambios {
            username: username.to_string(),
            nombre_completo: nombre_completo.to_string(),
            hashed_password: password
                .filter(|p| !p.is_empty())
                .map(password::hash_password),
        };
        self.usuarios.update(id, &cambios).await
    }

    /// Lists every operator.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DatabaseError`] when the store fails.
    pub async fn list_usuarios(&self) -> Result<Vec<Usuario>> {
        self.usuarios.list().await
    }

    /// Fetches one operator by id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`] when no operator has
    /// that id.
    pub async fn get_usuario(&self, id: UsuarioId) -> Result<Usuario> {
        self.usuarios.get(id).await
    }

    /// Removes one operator. Their sessions lose access on the next
    /// request, when the row re-fetch comes back empty.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsuarioNotFound`] when no operator has
    /// that id.
    pub async fn delete_usuario(&self, id: UsuarioId) -> Result<()> {
        self.usuarios.delete(id).await?;
        tracing::info!(id = id.0, "operator deleted");
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str, own_id: Option<UsuarioId>) -> Result<()> {
        match self.usuarios.get_by_username(username).await {
            Ok(owner) if Some(owner.id) != own_id => Err(AuthError::UsernameTaken),
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AuthError::UsernameRequired);
    }
    if username.chars().count() > MAX_USERNAME {
        return Err(AuthError::UsernameTooLong);
    }
    Ok(())
}

fn validate_nombre(nombre_completo: &str) -> Result<()> {
    if nombre_completo.trim().is_empty() {
        return Err(AuthError::NombreCompletoRequired);
    }
    Ok(())
}
