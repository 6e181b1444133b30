//! PostgreSQL operator repository implementation.

use super::db_error;
use crate::error::{AuthError, Result};
use crate::providers::UsuarioRepository;
use crate::state::{NuevoUsuario, Usuario, UsuarioCambios, UsuarioId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const SELECT_USUARIO: &str =
    "SELECT id, username, nombre_completo, hashed_password, created_at, updated_at FROM usuarios";

/// PostgreSQL operator repository.
#[derive(Clone)]
pub struct PostgresUsuarioRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UsuarioRow {
    id: i64,
    username: String,
    nombre_completo: String,
    hashed_password: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UsuarioRow> for Usuario {
    fn from(row: UsuarioRow) -> Self {
        Self {
            id: UsuarioId(row.id),
            username: row.username,
            nombre_completo: row.nombre_completo,
            hashed_password: row.hashed_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn write_error(e: sqlx::Error, context: &str) -> AuthError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AuthError::UsernameTaken;
        }
    }
    AuthError::DatabaseError(format!("Failed to {context}: {e}"))
}

impl PostgresUsuarioRepository {
    /// Create a new repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UsuarioRepository for PostgresUsuarioRepository {
    async fn list(&self) -> Result<Vec<Usuario>> {
        let rows = sqlx::query_as::<_, UsuarioRow>(&format!("{SELECT_USUARIO} ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list usuarios"))?;
        Ok(rows.into_iter().map(Usuario::from).collect())
    }

    async fn get(&self, id: UsuarioId) -> Result<Usuario> {
        let row = sqlx::query_as::<_, UsuarioRow>(&format!("{SELECT_USUARIO} WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch usuario"))?;
        row.map(Usuario::from).ok_or(AuthError::UsuarioNotFound)
    }

    async fn get_by_username(&self, username: &str) -> Result<Usuario> {
        let row = sqlx::query_as::<_, UsuarioRow>(&format!("{SELECT_USUARIO} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch usuario by username"))?;
        row.map(Usuario::from).ok_or(AuthError::UsuarioNotFound)
    }

    async fn create(&self, nuevo: &NuevoUsuario) -> Result<Usuario> {
        let row = sqlx::query_as::<_, UsuarioRow>(
            "INSERT INTO usuarios (username, nombre_completo, hashed_password) \
             VALUES ($1, $2, $3) \
             RETURNING id, username, nombre_completo, hashed_password, created_at, updated_at",
        )
        .bind(&nuevo.username)
        .bind(&nuevo.nombre_completo)
        .bind(&nuevo.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "insert usuario"))?;
        Ok(row.into())
    }

    async fn update(&self, id: UsuarioId, cambios: &UsuarioCambios) -> Result<Usuario> {
        let query = if cambios.hashed_password.is_some() {
            "UPDATE usuarios \
             SET username = $2, nombre_completo = $3, hashed_password = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, username, nombre_completo, hashed_password, created_at, updated_at"
        } else {
            "UPDATE usuarios \
             SET username = $2, nombre_completo = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, username, nombre_completo, hashed_password, created_at, updated_at"
        };

        let mut update = sqlx::query_as::<_, UsuarioRow>(query)
            .bind(id.0)
            .bind(&cambios.username)
            .bind(&cambios.nombre_completo);
        if let Some(hash) = &cambios.hashed_password {
            update = update.bind(hash);
        }

        let row = update
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, "update usuario"))?;
        row.map(Usuario::from).ok_or(AuthError::UsuarioNotFound)
    }

    async fn delete(&self, id: UsuarioId) -> Result<()> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete usuario"))?;
        if result.rows_affected() == 0 {
            return Err(AuthError::UsuarioNotFound);
        }
        Ok(())
    }
}
