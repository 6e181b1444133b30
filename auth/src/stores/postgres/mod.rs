//! PostgreSQL storage implementation.
//!
//! Both stores share one pool and one migration set.
//!
//! # Example
//!
//! ```no_run
//! use asistencia_auth::stores::postgres::{self, PostgresSessionStore, PostgresUsuarioRepository};
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/asistencia").await?;
//! postgres::migrate(&pool).await?;
//! let usuarios = PostgresUsuarioRepository::new(pool.clone());
//! let sessions = PostgresSessionStore::new(pool);
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod usuario;

pub use session::PostgresSessionStore;
pub use usuario::PostgresUsuarioRepository;

use crate::error::{AuthError, Result};
use sqlx::PgPool;

/// Run database migrations for the usuarios and sesiones tables.
///
/// # Errors
///
/// Returns error if migrations fail.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Migration failed: {e}")))?;
    Ok(())
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> AuthError + '_ {
    move |e| AuthError::DatabaseError(format!("Failed to {context}: {e}"))
}
