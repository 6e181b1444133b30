//! Excel import and template download endpoints.

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::CurrentOperator;
use crate::state::AppState;
use asistencia_auth::{SessionStore, UsuarioRepository};
use asistencia_registry::import::{EXCEL_CONTENT_TYPE, TEMPLATE_FILENAME};
use asistencia_registry::{GuestRegistry, build_template, parse_workbook};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;

/// Result of a spreadsheet import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// Operator-facing summary, in Spanish.
    pub message: String,
    /// Guests created by this import.
    pub invitados_creados: u64,
    /// Companions created by this import.
    pub acompanantes_creados: u64,
}

/// Import guests and companions from an uploaded workbook.
///
/// Expects a multipart form with the workbook under a `file` field.
/// Imported rows land already confirmed. Cedulas already registered,
/// or repeated within the file, are skipped rather than rejected.
///
/// # Endpoint
///
/// ```text
/// POST /import/import-excel
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Importación completada exitosamente",
///   "invitados_creados": 25,
///   "acompanantes_creados": 10
/// }
/// ```
///
/// # Errors
///
/// `422` when the form has no `file` field, the filename is not
/// `.xlsx`/`.xls`, the workbook cannot be read or the `Invitados`
/// sheet is missing required columns.
pub async fn import_excel<R, U, S>(
    CurrentOperator(operator): CurrentOperator,
    State(state): State<AppState<R, U, S>>,
    mut multipart: Multipart,
) -> WebResult<Json<ImportResponse>>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let Some((filename, bytes)) = read_file_field(&mut multipart).await? else {
        return Err(AppError::validation(
            "Debe adjuntar un archivo en el campo 'file'",
        ));
    };

    let batch = parse_workbook(&filename, &bytes)?;
    let report = state.registry.import_batch(&batch).await?;

    tracing::info!(
        operator = %operator.username,
        invitados = report.invitados_creados,
        acompanantes = report.acompanantes_creados,
        "spreadsheet imported"
    );

    Ok(Json(ImportResponse {
        message: "Importación completada exitosamente".to_string(),
        invitados_creados: report.invitados_creados,
        acompanantes_creados: report.acompanantes_creados,
    }))
}

/// Download the empty two-sheet workbook operators fill out offline.
///
/// # Endpoint
///
/// ```text
/// GET /import/export-template
/// ```
pub async fn export_template<R, U, S>(
    _operator: CurrentOperator,
) -> WebResult<impl IntoResponse>
where
    R: GuestRegistry + Clone + 'static,
    U: UsuarioRepository + Clone + 'static,
    S: SessionStore + Clone + 'static,
{
    let bytes = build_template()?;
    Ok((
        [
            (header::CONTENT_TYPE, EXCEL_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={TEMPLATE_FILENAME}"),
            ),
        ],
        bytes,
    ))
}

/// Pulls the `file` field out of the multipart form, if present.
///
/// A field without a filename keeps an empty name so the extension
/// check downstream rejects it.
async fn read_file_field(multipart: &mut Multipart) -> WebResult<Option<(String, Bytes)>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::validation(format!("Formulario inválido: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::validation(format!("Archivo inválido: {err}")))?;
        return Ok(Some((filename, bytes)));
    }
    Ok(None)
}
