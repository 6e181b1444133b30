//! Mock guest registry.

use crate::confirmation::{ConfirmOutcome, ConfirmSelection, plan_confirmation};
use crate::error::{RegistryError, Result};
use crate::import::{ImportBatch, ImportReport};
use crate::providers::GuestRegistry;
use crate::types::{
    Acompanante, AcompananteId, AsistenciaLog, DeleteAllReport, Invitado, InvitadoId,
    NuevoAcompanante, NuevoInvitado, PersonaTipo, SearchResult, Stats,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock guest registry.
///
/// Keeps the whole registry behind one mutex, so every write is
/// serialized exactly like the row-locked PostgreSQL store, just with
/// a coarser grain. Guests and companions live in id-ordered maps;
/// stored guests carry an empty companion list and are assembled on
/// the way out.
#[derive(Debug, Clone, Default)]
pub struct MockGuestRegistry {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    invitados: BTreeMap<i64, Invitado>,
    acompanantes: BTreeMap<i64, Acompanante>,
    logs: Vec<AsistenciaLog>,
    next_invitado_id: i64,
    next_acompanante_id: i64,
    next_log_id: i64,
}

impl Inner {
    fn assemble(&self, id: i64) -> Option<Invitado> {
        let mut invitado = self.invitados.get(&id)?.clone();
        invitado.acompanantes = self
            .acompanantes
            .values()
            .filter(|a| a.invitado_id.0 == id)
            .cloned()
            .collect();
        Some(invitado)
    }

    fn push_log(&mut self, persona_id: i64, tipo: PersonaTipo) {
        self.next_log_id += 1;
        self.logs.push(AsistenciaLog {
            id: self.next_log_id,
            persona_id,
            tipo,
            timestamp: Utc::now(),
        });
    }

    fn insert_invitado(&mut self, nuevo: &NuevoInvitado, confirmed: bool) -> Invitado {
        self.next_invitado_id += 1;
        let now = Utc::now();
        let invitado = Invitado {
            id: InvitadoId(self.next_invitado_id),
            nombre: nuevo.nombre.clone(),
            cedula: nuevo.cedula.clone(),
            campana_area: nuevo.campana_area.clone(),
            eps: nuevo.eps.clone(),
            sede: nuevo.sede.clone(),
            estado_asistencia: confirmed,
            created_at: now,
            updated_at: now,
            acompanantes: Vec::new(),
        };
        self.invitados.insert(invitado.id.0, invitado.clone());
        invitado
    }

    fn insert_acompanante(
        &mut self,
        invitado_id: InvitadoId,
        nuevo: &NuevoAcompanante,
        confirmed: bool,
    ) -> Acompanante {
        self.next_acompanante_id += 1;
        let now = Utc::now();
        let acompanante = Acompanante {
            id: AcompananteId(self.next_acompanante_id),
            invitado_id,
            nombre: nuevo.nombre.clone(),
            cedula: nuevo.cedula.clone(),
            edad: nuevo.edad,
            parentesco: nuevo.parentesco.clone(),
            eps: nuevo.eps.clone(),
            estado_asistencia: confirmed,
            created_at: now,
            updated_at: now,
        };
        self.acompanantes.insert(acompanante.id.0, acompanante.clone());
        acompanante
    }

    fn invitado_cedula_taken(&self, cedula: &str) -> bool {
        self.invitados.values().any(|i| i.cedula == cedula)
    }

    fn acompanante_cedula_taken(&self, cedula: &str) -> bool {
        self.acompanantes.values().any(|a| a.cedula == cedula)
    }
}

fn lock(inner: &Mutex<Inner>) -> Result<MutexGuard<'_, Inner>> {
    inner
        .lock()
        .map_err(|_| RegistryError::DatabaseError("registry lock poisoned".to_string()))
}

impl MockGuestRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a guest directly, the way pre-event registration does.
    ///
    /// Seeded rows start pending unless `confirmed` is set and no
    /// audit row is written; only door-time operations log.
    ///
    /// # Errors
    ///
    /// Returns error if the draft fails validation or the cedula is
    /// already registered.
    pub fn seed_invitado(&self, nuevo: &NuevoInvitado, confirmed: bool) -> Result<Invitado> {
        nuevo.validate()?;
        let mut inner = lock(&self.inner)?;
        if inner.invitado_cedula_taken(&nuevo.cedula) {
            return Err(RegistryError::DuplicateCedula);
        }
        Ok(inner.insert_invitado(nuevo, confirmed))
    }

    /// Seed a companion under an existing guest. Same rules as
    /// [`MockGuestRegistry::seed_invitado`].
    ///
    /// # Errors
    ///
    /// Returns error if the draft fails validation, the guest does not
    /// exist or the cedula is already registered.
    pub fn seed_acompanante(
        &self,
        invitado_id: InvitadoId,
        nuevo: &NuevoAcompanante,
        confirmed: bool,
    ) -> Result<Acompanante> {
        nuevo.validate()?;
        let mut inner = lock(&self.inner)?;
        if !inner.invitados.contains_key(&invitado_id.0) {
            return Err(RegistryError::InvitadoNotFound);
        }
        if inner.acompanante_cedula_taken(&nuevo.cedula) {
            return Err(RegistryError::DuplicateAcompananteCedula);
        }
        Ok(inner.insert_acompanante(invitado_id, nuevo, confirmed))
    }

    /// Count of audit rows (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn log_count(&self) -> Result<usize> {
        Ok(lock(&self.inner)?.logs.len())
    }
}

impl GuestRegistry for MockGuestRegistry {
    fn search(&self, query: &str) -> impl Future<Output = Result<SearchResult>> + Send {
        let inner = Arc::clone(&self.inner);
        let query = query.trim().to_string();

        async move {
            if query.is_empty() {
                return Err(RegistryError::EmptyQuery);
            }
            let inner = lock(&inner)?;
            let lowered = query.to_lowercase();

            let guest_id = inner
                .invitados
                .values()
                .find(|i| i.cedula == query)
                .or_else(|| {
                    inner
                        .invitados
                        .values()
                        .find(|i| i.nombre.to_lowercase().contains(&lowered))
                })
                .map(|i| i.id.0)
                .or_else(|| {
                    inner
                        .acompanantes
                        .values()
                        .find(|a| a.cedula == query)
                        .or_else(|| {
                            inner
                                .acompanantes
                                .values()
                                .find(|a| a.nombre.to_lowercase().contains(&lowered))
                        })
                        .map(|a| a.invitado_id.0)
                });

            let id = guest_id.ok_or(RegistryError::NoMatches)?;
            let invitado = inner
                .assemble(id)
                .ok_or_else(|| RegistryError::DatabaseError("companion without guest".to_string()))?;
            Ok(SearchResult::from_invitado(invitado))
        }
    }

    fn list_invitados(&self) -> impl Future<Output = Result<Vec<Invitado>>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let inner = lock(&inner)?;
            let ids: Vec<i64> = inner.invitados.keys().copied().collect();
            Ok(ids.iter().filter_map(|id| inner.assemble(*id)).collect())
        }
    }

    fn quick_add_invitado(
        &self,
        nuevo: &NuevoInvitado,
    ) -> impl Future<Output = Result<Invitado>> + Send {
        let inner = Arc::clone(&self.inner);
        let nuevo = nuevo.clone();

        async move {
            nuevo.validate()?;
            let mut inner = lock(&inner)?;
            if inner.invitado_cedula_taken(&nuevo.cedula) {
                return Err(RegistryError::DuplicateCedula);
            }
            let invitado = inner.insert_invitado(&nuevo, true);
            inner.push_log(invitado.id.0, PersonaTipo::Principal);
            tracing::debug!(invitado_id = invitado.id.0, "walk-in guest registered");
            Ok(invitado)
        }
    }

    fn add_acompanante(
        &self,
        invitado_id: InvitadoId,
        nuevo: &NuevoAcompanante,
    ) -> impl Future<Output = Result<Acompanante>> + Send {
        let inner = Arc::clone(&self.inner);
        let nuevo = nuevo.clone();

        async move {
            nuevo.validate()?;
            let mut inner = lock(&inner)?;
            if !inner.invitados.contains_key(&invitado_id.0) {
                return Err(RegistryError::InvitadoNotFound);
            }
            if inner.acompanante_cedula_taken(&nuevo.cedula) {
                return Err(RegistryError::DuplicateAcompananteCedula);
            }
            let acompanante = inner.insert_acompanante(invitado_id, &nuevo, true);
            inner.push_log(acompanante.id.0, PersonaTipo::Acompanante);
            tracing::debug!(
                invitado_id = invitado_id.0,
                acompanante_id = acompanante.id.0,
                "extra companion registered"
            );
            Ok(acompanante)
        }
    }

    fn confirm_attendance(
        &self,
        selection: &ConfirmSelection,
    ) -> impl Future<Output = Result<ConfirmOutcome>> + Send {
        let inner = Arc::clone(&self.inner);
        let selection = selection.clone();

        async move {
            let mut inner = lock(&inner)?;

            let guest_id = match selection.invitado_id {
                Some(id) => {
                    if !inner.invitados.contains_key(&id.0) {
                        return Err(RegistryError::InvitadoNotFound);
                    }
                    id.0
                }
                None => {
                    let first = selection
                        .acompanantes
                        .first()
                        .ok_or(RegistryError::EmptySelection)?;
                    inner
                        .acompanantes
                        .get(&first.0)
                        .map(|a| a.invitado_id.0)
                        .ok_or(RegistryError::AcompananteNotFound)?
                }
            };

            let invitado = inner
                .assemble(guest_id)
                .ok_or(RegistryError::InvitadoNotFound)?;
            let plan = plan_confirmation(&selection, &invitado)?;

            let now = Utc::now();
            if plan.confirm_invitado {
                if let Some(guest) = inner.invitados.get_mut(&guest_id) {
                    guest.estado_asistencia = true;
                    guest.updated_at = now;
                }
                inner.push_log(guest_id, PersonaTipo::Principal);
            }
            for id in &plan.confirm_acompanantes {
                if let Some(acompanante) = inner.acompanantes.get_mut(&id.0) {
                    acompanante.estado_asistencia = true;
                    acompanante.updated_at = now;
                }
                inner.push_log(id.0, PersonaTipo::Acompanante);
            }

            tracing::debug!(
                invitado_id = guest_id,
                nuevas = plan.outcome.nuevas_confirmaciones,
                "attendance confirmed"
            );
            Ok(plan.outcome)
        }
    }

    fn compute_stats(&self) -> impl Future<Output = Result<Stats>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let inner = lock(&inner)?;
            Ok(Stats::from_counts(
                inner.invitados.len() as u64,
                inner
                    .invitados
                    .values()
                    .filter(|i| i.estado_asistencia)
                    .count() as u64,
                inner.acompanantes.len() as u64,
                inner
                    .acompanantes
                    .values()
                    .filter(|a| a.estado_asistencia)
                    .count() as u64,
            ))
        }
    }

    fn import_batch(
        &self,
        batch: &ImportBatch,
    ) -> impl Future<Output = Result<ImportReport>> + Send {
        let inner = Arc::clone(&self.inner);
        let batch = batch.clone();

        async move {
            let mut inner = lock(&inner)?;
            let mut report = ImportReport::default();

            for draft in &batch.invitados {
                if inner.invitado_cedula_taken(&draft.cedula) {
                    tracing::debug!(cedula = %draft.cedula, "import: guest already registered, skipped");
                    continue;
                }
                inner.insert_invitado(draft, true);
                report.invitados_creados += 1;
            }

            for row in &batch.acompanantes {
                let Some(owner) = inner
                    .invitados
                    .values()
                    .find(|i| i.cedula == row.cedula_invitado_principal)
                    .map(|i| i.id)
                else {
                    tracing::debug!(
                        cedula = %row.acompanante.cedula,
                        invitado_cedula = %row.cedula_invitado_principal,
                        "import: companion without matching guest, skipped"
                    );
                    continue;
                };
                if inner.acompanante_cedula_taken(&row.acompanante.cedula) {
                    tracing::debug!(cedula = %row.acompanante.cedula, "import: companion already registered, skipped");
                    continue;
                }
                inner.insert_acompanante(owner, &row.acompanante, true);
                report.acompanantes_creados += 1;
            }

            tracing::debug!(
                invitados = report.invitados_creados,
                acompanantes = report.acompanantes_creados,
                "import batch applied"
            );
            Ok(report)
        }
    }

    fn delete_all(&self) -> impl Future<Output = Result<DeleteAllReport>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let mut inner = lock(&inner)?;
            let report = DeleteAllReport {
                invitados: inner.invitados.len() as u64,
                acompanantes: inner.acompanantes.len() as u64,
                logs: inner.logs.len() as u64,
            };
            inner.invitados.clear();
            inner.acompanantes.clear();
            inner.logs.clear();
            // Id counters keep running, like database sequences do.
            tracing::debug!(
                invitados = report.invitados,
                acompanantes = report.acompanantes,
                "registry wiped"
            );
            Ok(report)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn nuevo_invitado(nombre: &str, cedula: &str) -> NuevoInvitado {
        NuevoInvitado {
            nombre: nombre.to_string(),
            cedula: cedula.to_string(),
            campana_area: None,
            eps: None,
            sede: None,
        }
    }

    fn nuevo_acompanante(nombre: &str, cedula: &str) -> NuevoAcompanante {
        NuevoAcompanante {
            nombre: nombre.to_string(),
            cedula: cedula.to_string(),
            edad: None,
            parentesco: None,
            eps: None,
        }
    }

    /// A pending guest with two pending companions, freshly seeded.
    fn pending_group(registry: &MockGuestRegistry) -> (Invitado, Acompanante, Acompanante) {
        let invitado = registry
            .seed_invitado(&nuevo_invitado("Ana Pérez", "100"), false)
            .unwrap();
        let primero = registry
            .seed_acompanante(invitado.id, &nuevo_acompanante("Luis Pérez", "101"), false)
            .unwrap();
        let segundo = registry
            .seed_acompanante(invitado.id, &nuevo_acompanante("Marta Pérez", "102"), false)
            .unwrap();
        (invitado, primero, segundo)
    }

    #[tokio::test]
    async fn search_finds_guest_by_exact_cedula() {
        let registry = MockGuestRegistry::new();
        let (invitado, ..) = pending_group(&registry);

        let result = registry.search("100").await.unwrap();
        assert_eq!(result.invitado.id, invitado.id);
        assert_eq!(result.total_personas, 3);
        assert!(!result.asistencia_confirmada);
        assert_eq!(result.invitado.acompanantes.len(), 2);
    }

    #[tokio::test]
    async fn search_prefers_cedula_over_name_match() {
        let registry = MockGuestRegistry::new();
        registry
            .seed_invitado(&nuevo_invitado("Guest 200", "999"), false)
            .unwrap();
        let by_cedula = registry
            .seed_invitado(&nuevo_invitado("Otro Nombre", "200"), false)
            .unwrap();

        let result = registry.search("200").await.unwrap();
        assert_eq!(result.invitado.id, by_cedula.id);
    }

    #[tokio::test]
    async fn search_matches_name_case_insensitively() {
        let registry = MockGuestRegistry::new();
        let (invitado, ..) = pending_group(&registry);

        let result = registry.search("ana pé").await.unwrap();
        assert_eq!(result.invitado.id, invitado.id);
    }

    #[tokio::test]
    async fn search_falls_back_to_companions_and_returns_owner() {
        let registry = MockGuestRegistry::new();
        let (invitado, primero, _) = pending_group(&registry);

        let result = registry.search(&primero.cedula).await.unwrap();
        assert_eq!(result.invitado.id, invitado.id);

        let result = registry.search("marta").await.unwrap();
        assert_eq!(result.invitado.id, invitado.id);
    }

    #[tokio::test]
    async fn search_rejects_blank_and_reports_no_matches() {
        let registry = MockGuestRegistry::new();
        pending_group(&registry);

        assert_eq!(registry.search("   ").await, Err(RegistryError::EmptyQuery));
        assert_eq!(
            registry.search("nadie").await,
            Err(RegistryError::NoMatches)
        );
    }

    #[tokio::test]
    async fn quick_add_starts_confirmed_and_logs() {
        let registry = MockGuestRegistry::new();
        let invitado = registry
            .quick_add_invitado(&nuevo_invitado("Walk In", "300"))
            .await
            .unwrap();

        assert!(invitado.estado_asistencia);
        assert_eq!(registry.log_count().unwrap(), 1);

        let result = registry.search("300").await.unwrap();
        assert!(result.asistencia_confirmada);
    }

    #[tokio::test]
    async fn quick_add_rejects_duplicate_cedula() {
        let registry = MockGuestRegistry::new();
        pending_group(&registry);

        assert_eq!(
            registry
                .quick_add_invitado(&nuevo_invitado("Repetido", "100"))
                .await,
            Err(RegistryError::DuplicateCedula)
        );
    }

    #[tokio::test]
    async fn add_acompanante_requires_existing_guest() {
        let registry = MockGuestRegistry::new();
        assert_eq!(
            registry
                .add_acompanante(InvitadoId(7), &nuevo_acompanante("Sin Dueño", "400"))
                .await,
            Err(RegistryError::InvitadoNotFound)
        );
    }

    #[tokio::test]
    async fn confirm_subset_leaves_rest_pending() {
        let registry = MockGuestRegistry::new();
        let (invitado, primero, segundo) = pending_group(&registry);

        let selection = ConfirmSelection::from_raw(invitado.id.0, &[primero.id.0]).unwrap();
        let outcome = registry.confirm_attendance(&selection).await.unwrap();
        assert_eq!(outcome.personas_confirmadas, 2);
        assert_eq!(outcome.nuevas_confirmaciones, 2);

        let result = registry.search(&invitado.cedula).await.unwrap();
        assert!(result.invitado.estado_asistencia);
        assert!(!result.asistencia_confirmada);
        let pendiente = result
            .invitado
            .acompanantes
            .iter()
            .find(|a| a.id == segundo.id)
            .unwrap();
        assert!(!pendiente.estado_asistencia);
    }

    #[tokio::test]
    async fn confirm_companions_only_keeps_guest_pending() {
        let registry = MockGuestRegistry::new();
        let (invitado, primero, _) = pending_group(&registry);

        let selection = ConfirmSelection::from_raw(0, &[primero.id.0]).unwrap();
        let outcome = assert_ok!(registry.confirm_attendance(&selection).await);
        assert_eq!(outcome.personas_confirmadas, 1);

        let result = registry.search(&invitado.cedula).await.unwrap();
        assert!(!result.invitado.estado_asistencia);
    }

    #[tokio::test]
    async fn confirm_is_idempotent_and_does_not_relog() {
        let registry = MockGuestRegistry::new();
        let (invitado, ..) = pending_group(&registry);

        let selection = ConfirmSelection::from_raw(invitado.id.0, &[]).unwrap();
        let first = registry.confirm_attendance(&selection).await.unwrap();
        assert_eq!(first.nuevas_confirmaciones, 1);
        assert_eq!(registry.log_count().unwrap(), 1);

        let second = registry.confirm_attendance(&selection).await.unwrap();
        assert_eq!(second.personas_confirmadas, first.personas_confirmadas);
        assert_eq!(second.nuevas_confirmaciones, 0);
        assert_eq!(registry.log_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn confirm_rejects_foreign_companion_and_changes_nothing() {
        let registry = MockGuestRegistry::new();
        let (invitado, primero, _) = pending_group(&registry);
        let otro = registry
            .seed_invitado(&nuevo_invitado("Otro Invitado", "500"), false)
            .unwrap();
        let ajeno = registry
            .seed_acompanante(otro.id, &nuevo_acompanante("Ajeno", "501"), false)
            .unwrap();

        let selection =
            ConfirmSelection::from_raw(invitado.id.0, &[primero.id.0, ajeno.id.0]).unwrap();
        assert_eq!(
            registry.confirm_attendance(&selection).await,
            Err(RegistryError::AcompananteNotFound)
        );

        let result = registry.search(&invitado.cedula).await.unwrap();
        assert!(!result.invitado.estado_asistencia);
        assert!(result.invitado.acompanantes.iter().all(|a| !a.estado_asistencia));
        assert_eq!(registry.log_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn confirm_resolves_group_through_first_companion() {
        let registry = MockGuestRegistry::new();
        let (_, primero, segundo) = pending_group(&registry);

        let selection = ConfirmSelection::from_raw(0, &[primero.id.0, segundo.id.0]).unwrap();
        let outcome = registry.confirm_attendance(&selection).await.unwrap();
        assert_eq!(outcome.personas_confirmadas, 2);
    }

    #[tokio::test]
    async fn import_skips_existing_and_orphans() {
        let registry = MockGuestRegistry::new();
        registry
            .seed_invitado(&nuevo_invitado("Ya Existe", "100"), false)
            .unwrap();

        let batch = ImportBatch {
            invitados: vec![
                nuevo_invitado("Ya Existe", "100"),
                nuevo_invitado("Nuevo", "600"),
            ],
            acompanantes: vec![
                crate::import::ImportedAcompanante {
                    acompanante: nuevo_acompanante("Con Dueño", "601"),
                    cedula_invitado_principal: "600".to_string(),
                },
                crate::import::ImportedAcompanante {
                    acompanante: nuevo_acompanante("Huérfano", "602"),
                    cedula_invitado_principal: "doesnotexist".to_string(),
                },
            ],
        };

        let report = registry.import_batch(&batch).await.unwrap();
        assert_eq!(report.invitados_creados, 1);
        assert_eq!(report.acompanantes_creados, 1);

        let result = registry.search("600").await.unwrap();
        assert!(result.asistencia_confirmada);
        assert_eq!(result.total_personas, 2);
    }

    #[tokio::test]
    async fn stats_track_confirmations() {
        let registry = MockGuestRegistry::new();
        let (invitado, primero, _) = pending_group(&registry);
        registry
            .quick_add_invitado(&nuevo_invitado("Walk In", "700"))
            .await
            .unwrap();

        let selection = ConfirmSelection::from_raw(invitado.id.0, &[primero.id.0]).unwrap();
        registry.confirm_attendance(&selection).await.unwrap();

        let stats = registry.compute_stats().await.unwrap();
        assert_eq!(stats.total_invitados, 2);
        assert_eq!(stats.invitados_confirmados, 2);
        assert_eq!(stats.total_acompanantes, 2);
        assert_eq!(stats.acompanantes_confirmados, 1);
        assert_eq!(stats.total_personas, 4);
        assert_eq!(stats.personas_confirmadas, 3);
    }

    #[tokio::test]
    async fn delete_all_reports_counts_and_wipes() {
        let registry = MockGuestRegistry::new();
        let (invitado, ..) = pending_group(&registry);
        let selection = ConfirmSelection::from_raw(invitado.id.0, &[]).unwrap();
        registry.confirm_attendance(&selection).await.unwrap();

        let report = registry.delete_all().await.unwrap();
        assert_eq!(report.invitados, 1);
        assert_eq!(report.acompanantes, 2);
        assert_eq!(report.logs, 1);

        let stats = registry.compute_stats().await.unwrap();
        assert_eq!(stats.total_personas, 0);
        assert_eq!(registry.search("100").await, Err(RegistryError::NoMatches));
    }
}
