//! Guest registry trait.

use crate::confirmation::{ConfirmOutcome, ConfirmSelection};
use crate::error::Result;
use crate::import::{ImportBatch, ImportReport};
use crate::types::{
    Acompanante, DeleteAllReport, Invitado, InvitadoId, NuevoAcompanante, NuevoInvitado,
    SearchResult, Stats,
};

/// Guest registry storage.
///
/// This trait abstracts over registry storage (PostgreSQL in
/// production, in-memory for tests and database-less deployments).
///
/// Methods return `impl Future + Send` so handlers generic over the
/// registry can be spawned on a multi-threaded runtime.
pub trait GuestRegistry: Send + Sync {
    /// Find one guest by cedula or name.
    ///
    /// Match order: exact guest cedula, then case-insensitive guest
    /// name substring, then the same two passes over companions. A
    /// companion match resolves to its owning guest. Ties break to the
    /// lowest id.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query is empty or whitespace → `RegistryError::EmptyQuery`
    /// - Nothing matched → `RegistryError::NoMatches`
    fn search(&self, query: &str) -> impl std::future::Future<Output = Result<SearchResult>> + Send;

    /// List every guest with companions, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn list_invitados(&self) -> impl std::future::Future<Output = Result<Vec<Invitado>>> + Send;

    /// Register a walk-in guest, already confirmed, and log it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Draft fails validation
    /// - Cedula already registered → `RegistryError::DuplicateCedula`
    fn quick_add_invitado(
        &self,
        nuevo: &NuevoInvitado,
    ) -> impl std::future::Future<Output = Result<Invitado>> + Send;

    /// Register an unplanned companion under a guest, already
    /// confirmed, and log it.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Draft fails validation
    /// - Guest id unknown → `RegistryError::InvitadoNotFound`
    /// - Cedula already registered → `RegistryError::DuplicateAcompananteCedula`
    fn add_acompanante(
        &self,
        invitado_id: InvitadoId,
        nuevo: &NuevoAcompanante,
    ) -> impl std::future::Future<Output = Result<Acompanante>> + Send;

    /// Confirm attendance for a selection within one guest group.
    ///
    /// With no guest in the selection, the group is resolved through
    /// the first selected companion. The whole selection is applied
    /// atomically and an audit row is appended per newly confirmed
    /// person. Re-confirming is a no-op, not an error. Confirmations
    /// for the same guest never interleave.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Guest id unknown → `RegistryError::InvitadoNotFound`
    /// - A companion id is unknown, or registered under a different
    ///   guest → `RegistryError::AcompananteNotFound`
    fn confirm_attendance(
        &self,
        selection: &ConfirmSelection,
    ) -> impl std::future::Future<Output = Result<ConfirmOutcome>> + Send;

    /// Compute registry-wide attendance counters.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn compute_stats(&self) -> impl std::future::Future<Output = Result<Stats>> + Send;

    /// Apply a parsed workbook in one transaction.
    ///
    /// Rows whose cedula already exists are skipped, companions whose
    /// guest cedula resolves to nothing are skipped, and everything
    /// inserted lands already confirmed. Counts report what was
    /// actually created.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails; skipped rows are not errors.
    fn import_batch(
        &self,
        batch: &ImportBatch,
    ) -> impl std::future::Future<Output = Result<ImportReport>> + Send;

    /// Remove every guest, companion and audit row.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails.
    fn delete_all(&self) -> impl std::future::Future<Output = Result<DeleteAllReport>> + Send;
}
