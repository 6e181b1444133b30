//! Operator account management endpoints.
//!
//! Any authenticated operator can manage accounts; there is no role
//! tier. Password hashes never leave the service.

use crate::WebResult;
use crate::extractors::CurrentOperator;
use crate::state::AppState;
use asistencia_auth::{SessionStore, Usuario, UsuarioId, UsuarioRepository};
use asistencia_registry::GuestRegistry;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An operator account as shown on the wire. No password material.
#[derive(Debug, Serialize)]
pub struct UsuarioResponse {
    /// Account id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    pub nombre_completo: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Usuario> for UsuarioResponse {
    fn from(usuario: Usuario) -> Self {
        Self {
            id: usuario.id.0,
            username: usuario.username,
            nombre_completo: usuario.nombre_completo,
            created_at: usuario.created_at,
            updated_at: usuario.updated_at,
        }
    }
}

/// Body for `POST /api/v1/usuarios/`.
#[derive(Debug, Deserialize)]
pub struct UsuarioCreateRequest {
    /// Login name, unique, at most 50 characters.
    pub username: String,
    /// Display name.
    pub nombre_completo: String,
    /// Initial password.
    pub password: String,
}

/// Body for `PUT /api/v1/usuarios/{id}`.
#[derive(Debug, Deserialize)]
pub struct UsuarioUpdateRequest {
    /// Login name, unique, at most 50 characters.
    pub username: String,
    /// Display name.
    pub nombre_completo: String,
    /// New password. Absent or empty keeps the current one.
    pub password: Option<String>,
}

/// Every operator account, oldest first.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/usuarios/
/// ```
pub async fn list<R, U, S>(
    _operator: CurrentOperator,
    State(state): State<AppState<R, U, S>>,
) -> WebResult<Json<Vec<UsuarioResponse>>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let usuarios = state.auth.list_usuarios().await?;
    Ok(Json(usuarios.into_iter().map(UsuarioResponse::from).collect()))
}

/// One operator account by id.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/usuarios/{id}
/// ```
///
/// # Errors
///
/// `404` with `Usuario no encontrado` when the id is unknown.
pub async fn get<R, U, S>(
    _operator: CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Path(id): Path<i64>,
) -> WebResult<Json<UsuarioResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let usuario = state.auth.get_usuario(UsuarioId(id)).await?;
    Ok(Json(usuario.into()))
}

/// Create an operator account.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/usuarios/
/// ```
///
/// # Errors
///
/// `409` with `El nombre de usuario ya existe` on a taken login name,
/// `422` on blank or over-long fields.
pub async fn create<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Json(request): Json<UsuarioCreateRequest>,
) -> WebResult<(StatusCode, Json<UsuarioResponse>)>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let usuario = state
        .auth
        .create_usuario(&request.username, &request.nombre_completo, &request.password)
        .await?;

    tracing::info!(
        operator = %operator.username,
        created = %usuario.username,
        "operator account created"
    );

    Ok((StatusCode::CREATED, Json(usuario.into())))
}

/// Update an operator account.
///
/// Username and display name are always replaced. The password only
/// changes when the body carries a non-empty one.
///
/// # Endpoint
///
/// ```text
/// PUT /api/v1/usuarios/{id}
/// ```
pub async fn update<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Path(id): Path<i64>,
    Json(request): Json<UsuarioUpdateRequest>,
) -> WebResult<Json<UsuarioResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let usuario = state
        .auth
        .update_usuario(
            UsuarioId(id),
            &request.username,
            &request.nombre_completo,
            request.password.as_deref(),
        )
        .await?;

    tracing::info!(
        operator = %operator.username,
        updated = %usuario.username,
        "operator account updated"
    );

    Ok(Json(usuario.into()))
}

/// Delete an operator account.
///
/// Sessions belonging to the account die with it.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/v1/usuarios/{id}
/// ```
pub async fn delete<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Path(id): Path<i64>,
) -> WebResult<StatusCode>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    state.auth.delete_usuario(UsuarioId(id)).await?;

    tracing::info!(operator = %operator.username, deleted_id = id, "operator account deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use asistencia_auth::AuthService;
    use asistencia_auth::mocks::{MockSessionStore, MockUsuarioRepository};
    use asistencia_registry::mocks::MockGuestRegistry;

    type MockState = AppState<MockGuestRegistry, MockUsuarioRepository, MockSessionStore>;

    fn state() -> MockState {
        AppState::new(
            MockGuestRegistry::new(),
            AuthService::new(
                MockUsuarioRepository::default(),
                MockSessionStore::default(),
                chrono::Duration::hours(8),
            ),
        )
    }

    fn operator() -> CurrentOperator {
        let now = Utc::now();
        CurrentOperator(Usuario {
            id: UsuarioId(1),
            username: "admin".to_string(),
            nombre_completo: "Administradora".to_string(),
            hashed_password: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    #[tokio::test]
    async fn test_create_returns_201_without_password_material() {
        let (status, Json(created)) = create(
            operator(),
            State(state()),
            Json(UsuarioCreateRequest {
                username: "nueva".to_string(),
                nombre_completo: "Nueva Operadora".to_string(),
                password: "secreta123".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.username, "nueva");
        let body = serde_json::to_value(&created).unwrap();
        assert!(body.get("hashed_password").is_none());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_404() {
        let err = get(operator(), State(state()), Path(42))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "[404 Not Found] Usuario no encontrado");
    }

    #[tokio::test]
    async fn test_update_with_empty_password_keeps_the_old_one() {
        let state = state();
        let (_, Json(created)) = create(
            operator(),
            State(state.clone()),
            Json(UsuarioCreateRequest {
                username: "cambiame".to_string(),
                nombre_completo: "Antes".to_string(),
                password: "laclave".to_string(),
            }),
        )
        .await
        .unwrap();

        let Json(updated) = update(
            operator(),
            State(state.clone()),
            Path(created.id),
            Json(UsuarioUpdateRequest {
                username: "cambiame".to_string(),
                nombre_completo: "Después".to_string(),
                password: Some(String::new()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.nombre_completo, "Después");

        // The original password still logs in.
        state.auth.login("cambiame", "laclave").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_returns_204_and_removes_the_account() {
        let state = state();
        let (_, Json(created)) = create(
            operator(),
            State(state.clone()),
            Json(UsuarioCreateRequest {
                username: "temporal".to_string(),
                nombre_completo: "Temporal".to_string(),
                password: "secreta123".to_string(),
            }),
        )
        .await
        .unwrap();

        let status = delete(operator(), State(state.clone()), Path(created.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(remaining) = list(operator(), State(state)).await.unwrap();
        assert!(remaining.iter().all(|u| u.username != "temporal"));
    }
}
