//! Route table for the attendance API.

use crate::handlers::{asistencia, auth, health, importacion, usuarios};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use asistencia_auth::{SessionStore, UsuarioRepository};
use asistencia_registry::GuestRegistry;
use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

/// Builds the full route table over the given state.
///
/// The same table serves the in-memory mocks and the PostgreSQL
/// stores. CORS is not applied here; the binary layers it on from its
/// environment so tests and demo setups skip it entirely.
pub fn router<R, U, S>(state: AppState<R, U, S>) -> Router
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/v1/search", get(asistencia::search::<R, U, S>))
        .route(
            "/api/v1/confirmar_asistencia",
            post(asistencia::confirmar_asistencia::<R, U, S>),
        )
        .route("/api/v1/stats", get(asistencia::stats::<R, U, S>))
        .route("/api/v1/invitados", get(asistencia::list_invitados::<R, U, S>))
        .route(
            "/api/v1/invitados/eliminar-todos/",
            delete(asistencia::eliminar_todos::<R, U, S>),
        )
        .route(
            "/api/v1/agregar-invitado-rapido",
            post(asistencia::agregar_invitado_rapido::<R, U, S>),
        )
        .route(
            "/api/v1/agregar-acompanante-extra",
            post(asistencia::agregar_acompanante_extra::<R, U, S>),
        )
        .route("/import/import-excel", post(importacion::import_excel::<R, U, S>))
        .route(
            "/import/export-template",
            get(importacion::export_template::<R, U, S>),
        )
        .route("/api/v1/auth/login", post(auth::login::<R, U, S>))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/verify", post(auth::verify))
        .route("/api/v1/auth/logout", post(auth::logout::<R, U, S>))
        .route(
            "/api/v1/usuarios/",
            get(usuarios::list::<R, U, S>).post(usuarios::create::<R, U, S>),
        )
        .route(
            "/api/v1/usuarios/:id",
            get(usuarios::get::<R, U, S>)
                .put(usuarios::update::<R, U, S>)
                .delete(usuarios::delete::<R, U, S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use asistencia_auth::AuthService;
    use asistencia_auth::mocks::{MockSessionStore, MockUsuarioRepository};
    use asistencia_registry::mocks::MockGuestRegistry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(
            MockGuestRegistry::new(),
            AuthService::new(
                MockUsuarioRepository::default(),
                MockSessionStore::default(),
                chrono::Duration::hours(8),
            ),
        ))
    }

    #[tokio::test]
    async fn test_banner_and_health_are_public() {
        for path in ["/", "/health"] {
            let response = app()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
    }

    #[tokio::test]
    async fn test_protected_route_without_token_is_401() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/stats").body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "Not authenticated");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app()
            .oneshot(Request::get("/api/v2/nada").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
