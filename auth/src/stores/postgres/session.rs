//! PostgreSQL session store implementation.
//!
//! Expired rows are deleted the first time a lookup touches them;
//! whatever lingers is swept by `purge_expired` at login time.

use super::db_error;
use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{Session, UsuarioId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL session store.
#[derive(Clone)]
pub struct PostgresSessionStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token_hash: String,
    usuario_id: i64,
    username: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            token_hash: row.token_hash,
            usuario_id: UsuarioId(row.usuario_id),
            username: row.username,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

impl PostgresSessionStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SessionStore for PostgresSessionStore {
    async fn put_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sesiones (token_hash, usuario_id, username, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&session.token_hash)
        .bind(session.usuario_id.0)
        .bind(&session.username)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("insert session"))?;
        Ok(())
    }

    async fn get_session(&self, token_hash: &str) -> Result<Session> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT token_hash, usuario_id, username, created_at, expires_at \
             FROM sesiones WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch session"))?;

        let Some(row) = row else {
            return Err(AuthError::InvalidToken);
        };
        let session = Session::from(row);
        if session.is_expired(Utc::now()) {
            sqlx::query("DELETE FROM sesiones WHERE token_hash = $1")
                .bind(token_hash)
                .execute(&self.pool)
                .await
                .map_err(db_error("delete expired session"))?;
            return Err(AuthError::InvalidToken);
        }
        Ok(session)
    }

    async fn revoke_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sesiones WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(db_error("revoke session"))?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sesiones WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(db_error("purge sessions"))?;
        Ok(result.rows_affected())
    }
}
