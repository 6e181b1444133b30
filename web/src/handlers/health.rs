//! Service banner and health endpoints.
//!
//! These endpoints are used by load balancers, monitoring systems and
//! the check-in terminals to verify the service is reachable. Neither
//! requires a bearer token.

use axum::Json;
use serde_json::{Value, json};

/// Service banner.
///
/// # Endpoint
///
/// ```text
/// GET /
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Sistema de Confirmación de Asistencia API",
///   "status": "running",
///   "version": "0.1.0"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Sistema de Confirmación de Asistencia API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running. This endpoint
/// does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
