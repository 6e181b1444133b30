//! Binary entry point for the attendance API server.
//!
//! Wiring order: tracing, configuration, storage backend, bootstrap
//! operator, then `axum::serve` with graceful shutdown. Without the
//! `postgres` feature (or without `DATABASE_URL`) the server runs on
//! the in-memory stores, which is enough for demos and development.

use anyhow::Context;
use asistencia_auth::mocks::{MockSessionStore, MockUsuarioRepository};
use asistencia_auth::{AuthService, SessionStore, UsuarioRepository};
use asistencia_registry::mocks::MockGuestRegistry;
use asistencia_web::config::{BootstrapAdmin, CorsOrigins};
use asistencia_web::{AppState, Config, router};
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("load configuration")?;

    #[cfg(feature = "postgres")]
    {
        if let Some(database_url) = config.database_url.clone() {
            return run_postgres(config, &database_url).await;
        }
        tracing::warn!("DATABASE_URL not set; falling back to in-memory stores");
    }

    #[cfg(not(feature = "postgres"))]
    if config.database_url.is_some() {
        tracing::warn!(
            "DATABASE_URL is set but this build lacks the postgres feature; using in-memory stores"
        );
    }

    run_memory(config).await
}

/// Serve from the in-memory stores. Every restart starts empty.
async fn run_memory(config: Config) -> anyhow::Result<()> {
    tracing::info!("starting with in-memory stores; data is lost on shutdown");

    let state = AppState::new(
        MockGuestRegistry::new(),
        AuthService::new(
            MockUsuarioRepository::default(),
            MockSessionStore::default(),
            config.session_ttl,
        ),
    );
    seed_bootstrap_admin(&state.auth, config.bootstrap_admin.as_ref()).await?;

    serve(router(state), &config).await
}

/// Serve from PostgreSQL, running migrations first.
#[cfg(feature = "postgres")]
async fn run_postgres(config: Config, database_url: &str) -> anyhow::Result<()> {
    use asistencia_auth::stores::{PostgresSessionStore, PostgresUsuarioRepository};
    use asistencia_registry::stores::PostgresGuestRegistry;
    use sqlx::postgres::PgPoolOptions;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to PostgreSQL")?;
    tracing::info!("connected to PostgreSQL");

    let registry = PostgresGuestRegistry::new(pool.clone());
    registry.migrate().await.context("run registry migrations")?;
    asistencia_auth::stores::postgres::migrate(&pool)
        .await
        .context("run auth migrations")?;

    let state = AppState::new(
        registry,
        AuthService::new(
            PostgresUsuarioRepository::new(pool.clone()),
            PostgresSessionStore::new(pool),
            config.session_ttl,
        ),
    );
    seed_bootstrap_admin(&state.auth, config.bootstrap_admin.as_ref()).await?;

    serve(router(state), &config).await
}

/// Create the configured bootstrap operator if it does not exist yet.
async fn seed_bootstrap_admin<U, S>(
    auth: &AuthService<U, S>,
    admin: Option<&BootstrapAdmin>,
) -> anyhow::Result<()>
where
    U: UsuarioRepository,
    S: SessionStore,
{
    let Some(admin) = admin else {
        return Ok(());
    };

    match auth
        .create_usuario(&admin.username, &admin.nombre_completo, &admin.password)
        .await
    {
        Ok(usuario) => {
            tracing::info!(username = %usuario.username, "bootstrap operator created");
        }
        Err(err) if err.is_conflict() => {
            tracing::debug!(username = %admin.username, "bootstrap operator already exists");
        }
        Err(err) => {
            return Err(err).context("create bootstrap operator");
        }
    }
    Ok(())
}

async fn serve(app: Router, config: &Config) -> anyhow::Result<()> {
    let app = app.layer(cors_layer(&config.cors_origins));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins.as_allow_origin())
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
        .max_age(Duration::from_secs(3600))
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
