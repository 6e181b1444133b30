//! Error types for registry operations.
//!
//! Display strings are the exact Spanish messages served to the
//! confirmation terminal, which renders the `detail` field verbatim.
//! Variant names and documentation stay in English.

use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error taxonomy for the guest registry.
///
/// Variants are grouped by category; the `is_*` helpers drive the
/// HTTP status mapping at the web layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    // ═══════════════════════════════════════════════════════════
    // Not Found
    // ═══════════════════════════════════════════════════════════

    /// No guest or companion matched the search criteria.
    #[error("No se encontró ningún invitado con los criterios especificados")]
    NoMatches,

    /// Guest id does not exist.
    #[error("Invitado no encontrado")]
    InvitadoNotFound,

    /// Companion id does not exist, or belongs to another guest.
    #[error("Acompañante no encontrado")]
    AcompananteNotFound,

    // ═══════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════

    /// Search was called with an empty or whitespace-only query.
    #[error("Debe indicar una cédula o un nombre para buscar")]
    EmptyQuery,

    /// Confirmation was requested with no guest and no companions.
    #[error("Debe seleccionar al menos una persona para confirmar")]
    EmptySelection,

    /// A required field (name or cedula) was blank.
    #[error("El nombre y la cédula son obligatorios")]
    MissingRequiredField,

    /// A field exceeds its storage limit.
    #[error("El campo '{field}' supera el máximo de {max} caracteres")]
    FieldTooLong {
        /// Offending field.
        field: &'static str,
        /// Maximum accepted length, in characters.
        max: usize,
    },

    /// Companion age outside the accepted range.
    #[error("La edad debe estar entre 0 y 120")]
    InvalidEdad,

    /// Uploaded file does not carry an Excel extension.
    #[error("El archivo debe ser un Excel (.xlsx o .xls)")]
    NotAnExcelFile,

    /// Workbook bytes could not be parsed, or the sheet has no header row.
    #[error("El archivo Excel está vacío o no es válido")]
    UnreadableWorkbook,

    /// The workbook lacks a required sheet.
    #[error("El archivo Excel debe contener una hoja llamada '{0}'")]
    MissingSheet(&'static str),

    /// A sheet is present but misses required columns.
    #[error("Faltan columnas en la hoja '{sheet}': {columns:?}")]
    MissingColumns {
        /// Sheet the columns were expected in.
        sheet: &'static str,
        /// Column headers that were not found.
        columns: Vec<String>,
    },

    // ═══════════════════════════════════════════════════════════
    // Conflicts
    // ═══════════════════════════════════════════════════════════

    /// A guest with this cedula is already registered.
    #[error("Ya existe un invitado con esta cédula")]
    DuplicateCedula,

    /// A companion with this cedula is already registered.
    #[error("Ya existe un acompañante con esta cédula")]
    DuplicateAcompananteCedula,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Spreadsheet generation failed.
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),
}

impl RegistryError {
    /// Returns `true` if this error maps to a 404 response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use asistencia_registry::RegistryError;
    /// assert!(RegistryError::NoMatches.is_not_found());
    /// assert!(!RegistryError::EmptySelection.is_not_found());
    /// ```
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoMatches | Self::InvitadoNotFound | Self::AcompananteNotFound
        )
    }

    /// Returns `true` if this error is due to invalid caller input.
    ///
    /// # Examples
    ///
    /// ```
    /// # use asistencia_registry::RegistryError;
    /// assert!(RegistryError::EmptySelection.is_validation());
    /// assert!(!RegistryError::DuplicateCedula.is_validation());
    /// ```
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyQuery
                | Self::EmptySelection
                | Self::MissingRequiredField
                | Self::FieldTooLong { .. }
                | Self::InvalidEdad
                | Self::NotAnExcelFile
                | Self::UnreadableWorkbook
                | Self::MissingSheet(_)
                | Self::MissingColumns { .. }
        )
    }

    /// Returns `true` if this error is a uniqueness conflict.
    ///
    /// # Examples
    ///
    /// ```
    /// # use asistencia_registry::RegistryError;
    /// assert!(RegistryError::DuplicateCedula.is_conflict());
    /// assert!(!RegistryError::InvitadoNotFound.is_conflict());
    /// ```
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCedula | Self::DuplicateAcompananteCedula
        )
    }
}
