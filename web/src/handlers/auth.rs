//! Login, session introspection and logout endpoints.

use crate::WebResult;
use crate::extractors::{BearerToken, CurrentOperator};
use crate::handlers::usuarios::UsuarioResponse;
use crate::state::AppState;
use asistencia_auth::{SessionStore, UsuarioRepository};
use asistencia_registry::GuestRegistry;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Operator login name.
    pub username: String,
    /// Operator password, plain text over TLS.
    pub password: String,
}

/// A freshly minted bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Opaque token the terminal sends back on every call.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
}

/// Result of a token check.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Always `true` when the token resolved.
    pub valid: bool,
    /// Operator the token belongs to.
    pub user: OperadorResumen,
}

/// Short identity block returned by `verify`.
#[derive(Debug, Serialize)]
pub struct OperadorResumen {
    /// Operator id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    pub nombre_completo: String,
}

/// Result of a logout.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Always `true`; logging out an already dead token still succeeds.
    pub success: bool,
    /// Operator-facing summary, in Spanish.
    pub message: String,
}

/// Exchange operator credentials for a bearer token.
///
/// Wrong username and wrong password are indistinguishable on the
/// wire: both come back `401` with `Username o contraseña
/// incorrectos`.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "kF3k...",
///   "token_type": "bearer"
/// }
/// ```
pub async fn login<R, U, S>(
    State(state): State<AppState<R, U, S>>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<TokenResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let access_token = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// The operator behind the presented token.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/auth/me
/// ```
#[allow(clippy::unused_async)]
pub async fn me(CurrentOperator(operator): CurrentOperator) -> Json<UsuarioResponse> {
    Json(UsuarioResponse::from(operator))
}

/// Check a token without side effects.
///
/// Terminals call this on boot to decide whether a stored token is
/// still good.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/verify
/// ```
#[allow(clippy::unused_async)]
pub async fn verify(CurrentOperator(operator): CurrentOperator) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: OperadorResumen {
            id: operator.id.0,
            username: operator.username,
            nombre_completo: operator.nombre_completo,
        },
    })
}

/// Revoke the presented token.
///
/// Revoking is idempotent. A token that never existed, or was already
/// revoked, still gets a success response.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/logout
/// ```
pub async fn logout<R, U, S>(
    BearerToken(token): BearerToken,
    State(state): State<AppState<R, U, S>>,
) -> WebResult<Json<LogoutResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    state.auth.logout(&token).await?;
    Ok(Json(LogoutResponse {
        success: true,
        message: "Sesión cerrada exitosamente".to_string(),
    }))
}
