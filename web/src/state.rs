//! Application state for Axum handlers.

use asistencia_auth::AuthService;

/// Application state shared across all HTTP handlers.
///
/// Generic over the storage backends so the same router serves the
/// in-memory mocks and the PostgreSQL stores. Handlers take
/// `State(state): State<AppState<R, U, S>>` and constrain the
/// parameters with the provider traits.
#[derive(Debug, Clone)]
pub struct AppState<R, U, S> {
    /// Guest registry backend.
    pub registry: R,
    /// Authentication and operator management service.
    pub auth: AuthService<U, S>,
}

impl<R, U, S> AppState<R, U, S> {
    /// Create a new application state.
    #[must_use]
    pub const fn new(registry: R, auth: AuthService<U, S>) -> Self {
        Self { registry, auth }
    }
}
