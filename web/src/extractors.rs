//! Custom Axum extractors.
//!
//! - [`BearerToken`]: the raw token from the `Authorization` header
//! - [`CurrentOperator`]: the operator behind the token, re-validated
//!   against the session store on every request
//! - [`CorrelationId`]: per-request id for tracing
//!
//! Protected handlers simply take a `CurrentOperator` parameter; the
//! rejection is already the 401 the terminals expect.

use crate::error::AppError;
use crate::state::AppState;
use asistencia_auth::{SessionStore, Usuario, UsuarioRepository};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Detail for requests missing a usable `Authorization` header.
const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Raw bearer token from the `Authorization` header.
///
/// Rejects with 401 when the header is absent or not of the form
/// `Bearer <token>`. The scheme check is case-insensitive.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized(NOT_AUTHENTICATED))?;

        let (scheme, token) = header
            .split_once(' ')
            .ok_or_else(|| AppError::unauthorized(NOT_AUTHENTICATED))?;
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return Err(AppError::unauthorized(NOT_AUTHENTICATED));
        }

        Ok(Self(token.to_string()))
    }
}

/// The operator behind the request's bearer token.
///
/// Resolving goes through the session store and re-fetches the
/// operator row, so revoked tokens and deleted accounts reject with
/// 401 immediately.
#[derive(Debug, Clone)]
pub struct CurrentOperator(pub Usuario);

#[async_trait]
impl<R, U, S> FromRequestParts<AppState<R, U, S>> for CurrentOperator
where
    R: Send + Sync,
    U: UsuarioRepository,
    S: SessionStore,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<R, U, S>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let usuario = state.auth.current_user(&token).await?;
        Ok(Self(usuario))
    }
}

/// Correlation ID for request tracing.
///
/// Extracts the id from the `X-Correlation-ID` header, or generates a
/// new UUID v4 if not present.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get(crate::middleware::CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use asistencia_auth::AuthService;
    use asistencia_auth::mocks::{MockSessionStore, MockUsuarioRepository};
    use asistencia_registry::mocks::MockGuestRegistry;
    use axum::http::Request;
    use axum::http::StatusCode;
    use chrono::Duration;

    fn state() -> AppState<MockGuestRegistry, MockUsuarioRepository, MockSessionStore> {
        AppState::new(
            MockGuestRegistry::default(),
            AuthService::new(
                MockUsuarioRepository::default(),
                MockSessionStore::default(),
                Duration::hours(8),
            ),
        )
    }

    #[tokio::test]
    async fn bearer_token_is_extracted() {
        let req = Request::builder()
            .header("Authorization", "Bearer abc123")
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();

        let BearerToken(token) = BearerToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(token, "abc123");
    }

    #[tokio::test]
    async fn bearer_scheme_is_case_insensitive() {
        let req = Request::builder()
            .header("Authorization", "bearer abc123")
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();

        assert!(
            BearerToken::from_request_parts(&mut parts, &())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn missing_and_malformed_headers_reject() {
        let req = Request::builder().body(()).unwrap();
        let (mut parts, ()) = req.into_parts();
        let err = BearerToken::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("Not authenticated"));

        for header in ["Basic abc123", "Bearer", "Bearer "] {
            let req = Request::builder()
                .header("Authorization", header)
                .body(())
                .unwrap();
            let (mut parts, ()) = req.into_parts();
            let err = BearerToken::from_request_parts(&mut parts, &())
                .await
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "accepted: {header}");
        }
    }

    #[tokio::test]
    async fn current_operator_resolves_a_live_session() {
        let state = state();
        state
            .auth
            .create_usuario("maria", "María Pérez", "clave123")
            .await
            .unwrap();
        let token = state.auth.login("maria", "clave123").await.unwrap();

        let req = Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();

        let CurrentOperator(usuario) = CurrentOperator::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(usuario.username, "maria");
    }

    #[tokio::test]
    async fn current_operator_rejects_a_dead_token() {
        let state = state();
        let req = Request::builder()
            .header("Authorization", "Bearer token-inventado")
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();

        let err = CurrentOperator::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("Token inválido"));
    }

    #[tokio::test]
    async fn correlation_id_round_trips_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Correlation-ID", uuid.to_string())
            .body(())
            .unwrap();
        let (mut parts, ()) = req.into_parts();

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn correlation_id_generated_when_absent() {
        let req = Request::builder().body(()).unwrap();
        let (mut parts, ()) = req.into_parts();

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_ne!(correlation_id.0, Uuid::nil());
    }
}
