//! Excel workbook import and template export.
//!
//! The registry is seeded from a workbook with an `Invitados` sheet
//! and an optional `Acompanantes` sheet. Parsing is lenient the way
//! bulk upload needs to be: rows with no usable cedula or name are
//! skipped, duplicated cedulas within the file keep the first row, and
//! unparseable ages degrade to "no age". Structural problems (wrong
//! extension, missing sheet, missing columns) reject the whole file.
//!
//! Parsing produces an [`ImportBatch`]; applying it against existing
//! data is the registry backend's job, under one transaction.

use crate::error::{RegistryError, Result};
use crate::types::{MAX_EDAD, NuevoAcompanante, NuevoInvitado};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

/// Sheet holding guest rows. Required.
pub const SHEET_INVITADOS: &str = "Invitados";

/// Sheet holding companion rows. Optional.
pub const SHEET_ACOMPANANTES: &str = "Acompanantes";

/// Download name for the generated template.
pub const TEMPLATE_FILENAME: &str = "plantilla_invitados.xlsx";

/// MIME type for `.xlsx` downloads.
pub const EXCEL_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const INVITADO_COLUMNS: [&str; 5] = ["cedula", "nombre", "campana_area", "eps", "sede"];

const ACOMPANANTE_COLUMNS: [&str; 6] = [
    "cedula",
    "nombre",
    "edad",
    "parentesco",
    "eps_acompanante",
    "cedula_invitado_principal",
];

/// Rows extracted from one uploaded workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportBatch {
    /// Guest rows, file order, deduplicated by cedula.
    pub invitados: Vec<NuevoInvitado>,
    /// Companion rows, file order, deduplicated by cedula.
    pub acompanantes: Vec<ImportedAcompanante>,
}

/// A companion row together with the cedula that names its guest.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedAcompanante {
    /// The companion's own data.
    pub acompanante: NuevoAcompanante,
    /// Cedula of the guest this companion belongs to. Resolved against
    /// the registry (file rows included) when the batch is applied.
    pub cedula_invitado_principal: String,
}

/// Row counts created by applying an [`ImportBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ImportReport {
    /// Guests inserted.
    pub invitados_creados: u64,
    /// Companions inserted.
    pub acompanantes_creados: u64,
}

/// Parses an uploaded workbook into an [`ImportBatch`].
///
/// # Errors
///
/// Returns [`RegistryError::NotAnExcelFile`] for a bad extension,
/// [`RegistryError::UnreadableWorkbook`] when the bytes are not a
/// readable workbook or a sheet has no header row,
/// [`RegistryError::MissingSheet`] when the `Invitados` sheet is
/// absent and [`RegistryError::MissingColumns`] when a sheet lacks
/// required headers.
pub fn parse_workbook(filename: &str, bytes: &[u8]) -> Result<ImportBatch> {
    if !has_excel_extension(filename) {
        return Err(RegistryError::NotAnExcelFile);
    }

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|_| RegistryError::UnreadableWorkbook)?;

    if !workbook.sheet_names().iter().any(|s| s == SHEET_INVITADOS) {
        return Err(RegistryError::MissingSheet(SHEET_INVITADOS));
    }
    let range = workbook
        .worksheet_range(SHEET_INVITADOS)
        .map_err(|_| RegistryError::UnreadableWorkbook)?;
    let invitados = parse_invitados(&range)?;

    let acompanantes = if workbook.sheet_names().iter().any(|s| s == SHEET_ACOMPANANTES) {
        let range = workbook
            .worksheet_range(SHEET_ACOMPANANTES)
            .map_err(|_| RegistryError::UnreadableWorkbook)?;
        parse_acompanantes(&range)?
    } else {
        Vec::new()
    };

    tracing::debug!(
        invitados = invitados.len(),
        acompanantes = acompanantes.len(),
        "workbook parsed"
    );

    Ok(ImportBatch {
        invitados,
        acompanantes,
    })
}

/// Builds the empty import template: both sheets, header rows only.
///
/// # Errors
///
/// Returns [`RegistryError::SpreadsheetError`] when workbook
/// serialization fails.
pub fn build_template() -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_INVITADOS).map_err(sheet_error)?;
    for (col, name) in (0u16..).zip(INVITADO_COLUMNS) {
        sheet.write_string(0, col, name).map_err(sheet_error)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_ACOMPANANTES).map_err(sheet_error)?;
    for (col, name) in (0u16..).zip(ACOMPANANTE_COLUMNS) {
        sheet.write_string(0, col, name).map_err(sheet_error)?;
    }

    workbook.save_to_buffer().map_err(sheet_error)
}

fn sheet_error(error: XlsxError) -> RegistryError {
    RegistryError::SpreadsheetError(error.to_string())
}

fn has_excel_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".xls")
}

fn parse_invitados(range: &Range<Data>) -> Result<Vec<NuevoInvitado>> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(RegistryError::UnreadableWorkbook)?;
    let columns = header_map(header);
    require_columns(&columns, SHEET_INVITADOS, &INVITADO_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut invitados = Vec::new();
    for (index, row) in rows.enumerate() {
        let fila = index + 2;
        let Some(cedula) = text_at(row, &columns, "cedula") else {
            tracing::debug!(sheet = SHEET_INVITADOS, fila, "row skipped: no cedula");
            continue;
        };
        let Some(nombre) = text_at(row, &columns, "nombre") else {
            tracing::debug!(sheet = SHEET_INVITADOS, fila, "row skipped: no name");
            continue;
        };
        let draft = NuevoInvitado {
            nombre,
            cedula,
            campana_area: text_at(row, &columns, "campana_area"),
            eps: text_at(row, &columns, "eps"),
            sede: text_at(row, &columns, "sede"),
        };
        if let Err(error) = draft.validate() {
            tracing::debug!(sheet = SHEET_INVITADOS, fila, %error, "row skipped");
            continue;
        }
        if !seen.insert(draft.cedula.clone()) {
            tracing::debug!(sheet = SHEET_INVITADOS, fila, "row skipped: duplicate cedula");
            continue;
        }
        invitados.push(draft);
    }
    Ok(invitados)
}

fn parse_acompanantes(range: &Range<Data>) -> Result<Vec<ImportedAcompanante>> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(RegistryError::UnreadableWorkbook)?;
    let columns = header_map(header);
    require_columns(&columns, SHEET_ACOMPANANTES, &ACOMPANANTE_COLUMNS)?;

    let mut seen = HashSet::new();
    let mut acompanantes = Vec::new();
    for (index, row) in rows.enumerate() {
        let fila = index + 2;
        let Some(cedula) = text_at(row, &columns, "cedula") else {
            tracing::debug!(sheet = SHEET_ACOMPANANTES, fila, "row skipped: no cedula");
            continue;
        };
        let Some(nombre) = text_at(row, &columns, "nombre") else {
            tracing::debug!(sheet = SHEET_ACOMPANANTES, fila, "row skipped: no name");
            continue;
        };
        let Some(cedula_invitado_principal) = text_at(row, &columns, "cedula_invitado_principal")
        else {
            tracing::debug!(sheet = SHEET_ACOMPANANTES, fila, "row skipped: no guest cedula");
            continue;
        };
        let draft = NuevoAcompanante {
            nombre,
            cedula,
            edad: age_at(row, &columns),
            parentesco: text_at(row, &columns, "parentesco"),
            eps: text_at(row, &columns, "eps_acompanante"),
        };
        if let Err(error) = draft.validate() {
            tracing::debug!(sheet = SHEET_ACOMPANANTES, fila, %error, "row skipped");
            continue;
        }
        if !seen.insert(draft.cedula.clone()) {
            tracing::debug!(sheet = SHEET_ACOMPANANTES, fila, "row skipped: duplicate cedula");
            continue;
        }
        acompanantes.push(ImportedAcompanante {
            acompanante: draft,
            cedula_invitado_principal,
        });
    }
    Ok(acompanantes)
}

fn header_map(header: &[Data]) -> HashMap<String, usize> {
    header
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| cell_text(cell).map(|name| (name, index)))
        .collect()
}

fn require_columns(
    columns: &HashMap<String, usize>,
    sheet: &'static str,
    required: &[&str],
) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| (*name).to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::MissingColumns {
            sheet,
            columns: missing,
        })
    }
}

fn text_at(row: &[Data], columns: &HashMap<String, usize>, name: &str) -> Option<String> {
    columns.get(name).and_then(|&index| row.get(index)).and_then(cell_text)
}

fn age_at(row: &[Data], columns: &HashMap<String, usize>) -> Option<i32> {
    let edad = match columns.get("edad").and_then(|&index| row.get(index))? {
        Data::Int(i) => i32::try_from(*i).ok()?,
        // Excel hands integers back as floats; non-integral values
        // fail the parse and degrade to "no age".
        Data::Float(f) => f.to_string().parse().ok()?,
        Data::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (0..=MAX_EDAD).contains(&edad).then_some(edad)
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Whole floats print without a fractional part, which is what
        // a numeric cedula column needs.
        Data::Float(f) if f.is_finite() => f.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
