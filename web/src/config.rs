//! Server configuration from environment variables.
//!
//! Every knob has a default that works for a laptop demo: bind on
//! `0.0.0.0:8000`, in-memory stores, the original frontend dev hosts
//! allowed through CORS, 8 hour sessions.

use anyhow::{Context, bail, ensure};
use axum::http::HeaderValue;
use chrono::Duration;
use tower_http::cors::AllowOrigin;

/// Origins the frontend dev servers run on, allowed by default.
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173,\
     http://127.0.0.1:3000,http://127.0.0.1:5173,\
     https://localhost:3000,https://localhost:5173";

/// Runtime configuration for the server binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket address the listener binds to.
    pub bind_addr: std::net::SocketAddr,

    /// PostgreSQL connection string. `None` runs on the in-memory
    /// stores, which lose everything on restart.
    pub database_url: Option<String>,

    /// Origins allowed by the CORS layer.
    pub cors_origins: CorsOrigins,

    /// How long a login session stays valid.
    pub session_ttl: Duration,

    /// Operator seeded at startup when the table is empty.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// CORS origin policy.
#[derive(Debug, Clone)]
pub enum CorsOrigins {
    /// Mirror any origin. Selected with `ASISTENCIA_CORS_ORIGINS=*`.
    Any,
    /// Exact origin list.
    List(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// The policy as a `tower-http` allow-origin value.
    #[must_use]
    pub fn as_allow_origin(&self) -> AllowOrigin {
        match self {
            Self::Any => AllowOrigin::any(),
            Self::List(origins) => AllowOrigin::list(origins.iter().cloned()),
        }
    }
}

/// Credentials for the operator seeded at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    /// Login name.
    pub username: String,
    /// Clear password, hashed before it is stored.
    pub password: String,
    /// Display name.
    pub nombre_completo: String,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// Recognized variables: `ASISTENCIA_BIND_ADDR`, `DATABASE_URL`,
    /// `ASISTENCIA_CORS_ORIGINS` (comma list or `*`),
    /// `ASISTENCIA_SESSION_TTL_HOURS`, `ASISTENCIA_BOOTSTRAP_ADMIN`
    /// (`username:password:nombre completo`).
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but unparseable.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("ASISTENCIA_BIND_ADDR", "0.0.0.0:8000")
            .parse()
            .context("invalid ASISTENCIA_BIND_ADDR")?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.is_empty());

        let cors_origins = parse_origins(&env_or("ASISTENCIA_CORS_ORIGINS", DEFAULT_CORS_ORIGINS))?;

        let ttl_hours: i64 = env_or("ASISTENCIA_SESSION_TTL_HOURS", "8")
            .parse()
            .context("invalid ASISTENCIA_SESSION_TTL_HOURS")?;
        ensure!(ttl_hours > 0, "ASISTENCIA_SESSION_TTL_HOURS must be positive");

        let bootstrap_admin = std::env::var("ASISTENCIA_BOOTSTRAP_ADMIN")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| parse_bootstrap_admin(&v))
            .transpose()?;

        Ok(Self {
            bind_addr,
            database_url,
            cors_origins,
            session_ttl: Duration::hours(ttl_hours),
            bootstrap_admin,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            tracing::debug!(key, default, "environment variable not set, using default");
            default.to_string()
        }
    }
}

fn parse_origins(raw: &str) -> anyhow::Result<CorsOrigins> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if entries.iter().any(|s| *s == "*") {
        return Ok(CorsOrigins::Any);
    }

    let origins = entries
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid CORS origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    ensure!(!origins.is_empty(), "ASISTENCIA_CORS_ORIGINS is empty");

    Ok(CorsOrigins::List(origins))
}

fn parse_bootstrap_admin(raw: &str) -> anyhow::Result<BootstrapAdmin> {
    let mut parts = raw.splitn(3, ':');
    let (Some(username), Some(password), Some(nombre_completo)) =
        (parts.next(), parts.next(), parts.next())
    else {
        bail!("ASISTENCIA_BOOTSTRAP_ADMIN must be username:password:nombre completo");
    };
    ensure!(
        !username.is_empty() && !password.is_empty() && !nombre_completo.is_empty(),
        "ASISTENCIA_BOOTSTRAP_ADMIN fields must be non-empty"
    );

    Ok(BootstrapAdmin {
        username: username.to_string(),
        password: password.to_string(),
        nombre_completo: nombre_completo.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_origin_list_parses() {
        let origins = parse_origins(DEFAULT_CORS_ORIGINS).unwrap();
        match origins {
            CorsOrigins::List(list) => assert_eq!(list.len(), 6),
            CorsOrigins::Any => panic!("default origins are an explicit list"),
        }
    }

    #[test]
    fn star_means_any_origin() {
        assert!(matches!(parse_origins("*").unwrap(), CorsOrigins::Any));
        assert!(matches!(
            parse_origins("http://localhost:3000, *").unwrap(),
            CorsOrigins::Any
        ));
    }

    #[test]
    fn blank_origin_list_is_rejected() {
        assert!(parse_origins("").is_err());
        assert!(parse_origins(" , ,").is_err());
    }

    #[test]
    fn bootstrap_admin_splits_on_the_first_two_colons() {
        let admin = parse_bootstrap_admin("admin:s3cret:Administrador del Evento").unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.password, "s3cret");
        assert_eq!(admin.nombre_completo, "Administrador del Evento");

        // Colons in the display name are kept.
        let admin = parse_bootstrap_admin("a:b:c:d").unwrap();
        assert_eq!(admin.nombre_completo, "c:d");
    }

    #[test]
    fn malformed_bootstrap_admin_is_rejected() {
        assert!(parse_bootstrap_admin("admin").is_err());
        assert!(parse_bootstrap_admin("admin:clave").is_err());
        assert!(parse_bootstrap_admin("admin::Nombre").is_err());
    }
}
