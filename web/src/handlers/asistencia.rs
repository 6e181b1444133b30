//! Guest lookup, confirmation and registry maintenance endpoints.
//!
//! Everything here sits behind bearer auth and speaks the wire shapes
//! the check-in terminals expect, Spanish messages included.

use crate::WebResult;
use crate::extractors::CurrentOperator;
use crate::state::AppState;
use asistencia_auth::{SessionStore, UsuarioRepository};
use asistencia_registry::{
    AcompananteId, ConfirmSelection, DeleteAllReport, GuestRegistry, Invitado, InvitadoId,
    NuevoAcompanante, NuevoInvitado, SearchResult, Stats,
};
use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

/// Query string for `GET /api/v1/search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Exact cedula or partial name to look up.
    pub query: String,
}

/// Body for `POST /api/v1/confirmar_asistencia`.
#[derive(Debug, Deserialize)]
pub struct ConfirmarAsistenciaRequest {
    /// Guest to confirm. Zero or negative means companions only.
    pub invitado_id: i64,

    /// Companions confirmed alongside the guest.
    #[serde(default)]
    pub acompanantes_ids: Vec<i64>,
}

/// Result of a confirmation.
#[derive(Debug, Serialize)]
pub struct ConfirmarAsistenciaResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Operator-facing summary, in Spanish.
    pub message: String,
    /// Confirmed people across the whole group after the update.
    pub personas_confirmadas: u64,
}

/// Query string for `POST /api/v1/agregar-invitado-rapido`.
#[derive(Debug, Deserialize)]
pub struct QuickAddParams {
    /// Full name of the walk-in guest.
    pub nombre: String,
    /// National id of the walk-in guest.
    pub cedula: String,
}

/// Result of registering a walk-in guest.
#[derive(Debug, Serialize)]
pub struct QuickAddResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Operator-facing summary, in Spanish.
    pub message: String,
    /// Identity of the freshly registered guest.
    pub invitado: InvitadoResumen,
}

/// Identity echo for a freshly registered guest.
#[derive(Debug, Serialize)]
pub struct InvitadoResumen {
    /// Assigned identifier.
    pub id: InvitadoId,
    /// Full name as registered.
    pub nombre: String,
    /// National id as registered.
    pub cedula: String,
}

/// Query string for `POST /api/v1/agregar-acompanante-extra`.
#[derive(Debug, Deserialize)]
pub struct AddCompanionParams {
    /// Guest the companion arrives with.
    pub invitado_id: i64,
    /// Companion full name.
    pub nombre_acompanante: String,
    /// Companion national id.
    pub cedula_acompanante: String,
    /// Age, when the terminal captures it.
    pub edad: Option<i32>,
    /// Relationship to the guest.
    pub parentesco: Option<String>,
    /// Health provider.
    pub eps: Option<String>,
}

/// Result of registering an extra companion.
#[derive(Debug, Serialize)]
pub struct AddCompanionResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Operator-facing summary, in Spanish.
    pub message: String,
    /// Identity of the freshly registered companion.
    pub acompanante: AcompananteResumen,
}

/// Identity echo for a freshly registered companion.
#[derive(Debug, Serialize)]
pub struct AcompananteResumen {
    /// Assigned identifier.
    pub id: AcompananteId,
    /// Full name as registered.
    pub nombre: String,
    /// Guest the companion belongs to.
    pub invitado_id: InvitadoId,
}

/// Result of a registry wipe.
#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    /// Always `true` on the success path.
    pub success: bool,
    /// Operator-facing summary, in Spanish.
    pub message: String,
    /// Row counts removed per table.
    pub deleted: DeleteAllReport,
}

/// Look up one guest by exact cedula or partial name.
///
/// Exact cedula matches win over name matches. The response carries
/// the guest with companions, the group size and whether the whole
/// group is already confirmed.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/search?query=12345678
/// ```
///
/// # Errors
///
/// `404` with `No se encontró ningún invitado con los criterios
/// especificados` when nothing matches, `422` on a blank query.
pub async fn search<R, U, S>(
    _operator: CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Query(params): Query<SearchParams>,
) -> WebResult<Json<SearchResult>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let result = state.registry.search(&params.query).await?;
    Ok(Json(result))
}

/// Confirm attendance for a guest and any selected companions.
///
/// The whole selection lands atomically. Re-confirming someone is a
/// no-op, and the count reported back covers the whole group after
/// the update, not just the people flipped by this call.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/confirmar_asistencia
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Asistencia confirmada para 3 persona(s)",
///   "personas_confirmadas": 3
/// }
/// ```
pub async fn confirmar_asistencia<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Json(request): Json<ConfirmarAsistenciaRequest>,
) -> WebResult<Json<ConfirmarAsistenciaResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let selection = ConfirmSelection::from_raw(request.invitado_id, &request.acompanantes_ids)?;
    let outcome = state.registry.confirm_attendance(&selection).await?;

    tracing::info!(
        operator = %operator.username,
        confirmed = outcome.personas_confirmadas,
        newly = outcome.nuevas_confirmaciones,
        "attendance confirmed"
    );

    Ok(Json(ConfirmarAsistenciaResponse {
        success: true,
        message: format!(
            "Asistencia confirmada para {} persona(s)",
            outcome.personas_confirmadas
        ),
        personas_confirmadas: outcome.personas_confirmadas,
    }))
}

/// Register a walk-in guest, already confirmed.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/agregar-invitado-rapido?nombre=Ana&cedula=12345678
/// ```
///
/// # Errors
///
/// `409` with `Ya existe un invitado con esta cédula` when the cedula
/// is already registered, `422` on blank fields.
pub async fn agregar_invitado_rapido<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Query(params): Query<QuickAddParams>,
) -> WebResult<Json<QuickAddResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let nuevo = NuevoInvitado {
        nombre: params.nombre,
        cedula: params.cedula,
        campana_area: None,
        eps: None,
        sede: None,
    };
    let invitado = state.registry.quick_add_invitado(&nuevo).await?;

    tracing::info!(
        operator = %operator.username,
        invitado_id = invitado.id.0,
        "walk-in guest registered"
    );

    Ok(Json(QuickAddResponse {
        success: true,
        message: format!(
            "Invitado {} agregado y confirmado exitosamente",
            invitado.nombre
        ),
        invitado: InvitadoResumen {
            id: invitado.id,
            nombre: invitado.nombre,
            cedula: invitado.cedula,
        },
    }))
}

/// Register an unplanned companion under an existing guest, already
/// confirmed.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/agregar-acompanante-extra?invitado_id=7&nombre_acompanante=Luis&cedula_acompanante=87654321
/// ```
///
/// # Errors
///
/// `404` with `Invitado no encontrado` when the guest id is unknown,
/// `409` with `Ya existe un acompañante con esta cédula` on a
/// duplicate cedula, `422` on blank fields or an age out of range.
pub async fn agregar_acompanante_extra<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    Query(params): Query<AddCompanionParams>,
) -> WebResult<Json<AddCompanionResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let nuevo = NuevoAcompanante {
        nombre: params.nombre_acompanante,
        cedula: params.cedula_acompanante,
        edad: params.edad,
        parentesco: params.parentesco,
        eps: params.eps,
    };
    let acompanante = state
        .registry
        .add_acompanante(InvitadoId(params.invitado_id), &nuevo)
        .await?;

    tracing::info!(
        operator = %operator.username,
        invitado_id = params.invitado_id,
        acompanante_id = acompanante.id.0,
        "extra companion registered"
    );

    Ok(Json(AddCompanionResponse {
        success: true,
        message: format!(
            "Acompañante {} agregado y confirmado exitosamente",
            acompanante.nombre
        ),
        acompanante: AcompananteResumen {
            id: acompanante.id,
            nombre: acompanante.nombre,
            invitado_id: acompanante.invitado_id,
        },
    }))
}

/// Registry-wide attendance counters for the dashboard.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/stats
/// ```
pub async fn stats<R, U, S>(
    _operator: CurrentOperator,
    State(state): State<AppState<R, U, S>>,
) -> WebResult<Json<Stats>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    Ok(Json(state.registry.compute_stats().await?))
}

/// Full guest list, companions included, ordered by id.
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/invitados
/// ```
pub async fn list_invitados<R, U, S>(
    _operator: CurrentOperator,
    State(state): State<AppState<R, U, S>>,
) -> WebResult<Json<Vec<Invitado>>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    Ok(Json(state.registry.list_invitados().await?))
}

/// Wipe every guest, companion and audit row.
///
/// Meant for resetting the registry between events.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/v1/invitados/eliminar-todos/
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Eliminados exitosamente: 2 invitados, 3 acompañantes, 5 logs",
///   "deleted": { "invitados": 2, "acompanantes": 3, "logs": 5 }
/// }
/// ```
pub async fn eliminar_todos<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
) -> WebResult<Json<DeleteAllResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let deleted = state.registry.delete_all().await?;

    tracing::warn!(
        operator = %operator.username,
        invitados = deleted.invitados,
        acompanantes = deleted.acompanantes,
        logs = deleted.logs,
        "registry wiped"
    );

    Ok(Json(DeleteAllResponse {
        success: true,
        message: format!(
            "Eliminados exitosamente: {} invitados, {} acompañantes, {} logs",
            deleted.invitados, deleted.acompanantes, deleted.logs
        ),
        deleted,
    }))
}
