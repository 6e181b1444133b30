//! Attendance confirmation planning.
//!
//! Confirmation is split in two: this module decides *what* flips to
//! confirmed for a given selection, and the registry backends apply
//! the plan under their own concurrency control (a store-wide lock for
//! the in-memory registry, a row lock on the guest for PostgreSQL).
//! Keeping the decision pure means both backends share one set of
//! rules and the rules are testable without storage.

use crate::error::{RegistryError, Result};
use crate::types::{AcompananteId, Invitado, InvitadoId};

/// Who the operator ticked on the confirmation card.
///
/// The wire contract sends the guest id as a plain integer where `0`
/// (or any non-positive value) means "the guest stays pending, only
/// companions confirm". [`ConfirmSelection::from_raw`] normalizes that
/// sentinel into an `Option`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmSelection {
    /// Guest to confirm, when the guest checkbox was ticked.
    pub invitado_id: Option<InvitadoId>,

    /// Companions to confirm, deduplicated, in request order.
    pub acompanantes: Vec<AcompananteId>,
}

impl ConfirmSelection {
    /// Normalizes the raw wire fields into a selection.
    ///
    /// Non-positive guest ids mean no guest was selected. Duplicate
    /// companion ids are collapsed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptySelection`] when neither the guest
    /// nor any companion was selected.
    pub fn from_raw(invitado_id: i64, acompanantes_ids: &[i64]) -> Result<Self> {
        let invitado_id = (invitado_id > 0).then_some(InvitadoId(invitado_id));

        let mut acompanantes = Vec::with_capacity(acompanantes_ids.len());
        for &id in acompanantes_ids {
            let id = AcompananteId(id);
            if !acompanantes.contains(&id) {
                acompanantes.push(id);
            }
        }

        if invitado_id.is_none() && acompanantes.is_empty() {
            return Err(RegistryError::EmptySelection);
        }

        Ok(Self {
            invitado_id,
            acompanantes,
        })
    }
}

/// What a confirmation changed, as reported back to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfirmOutcome {
    /// Confirmed people across the whole group after the update, the
    /// guest and every companion included whether or not they were
    /// part of this selection.
    pub personas_confirmadas: u64,

    /// People flipped from pending to confirmed by this call.
    pub nuevas_confirmaciones: u64,
}

/// The writes a backend must apply for one confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPlan {
    /// Flip the guest to confirmed.
    pub confirm_invitado: bool,

    /// Companions to flip to confirmed. Already-confirmed companions
    /// in the selection are absent; re-confirming them is a no-op.
    pub confirm_acompanantes: Vec<AcompananteId>,

    /// Totals to report once the writes land.
    pub outcome: ConfirmOutcome,
}

/// Decides the writes for a selection against a loaded guest group.
///
/// The caller resolves which guest owns the selection and loads it with
/// all companions; this function only checks membership and computes
/// the flips. The whole selection is validated before anything is
/// planned, so one unknown companion id rejects the entire call.
///
/// # Errors
///
/// Returns [`RegistryError::InvitadoNotFound`] when the selection names
/// a different guest than the loaded one, and
/// [`RegistryError::AcompananteNotFound`] when a selected companion is
/// not registered under this guest.
pub fn plan_confirmation(selection: &ConfirmSelection, invitado: &Invitado) -> Result<ConfirmPlan> {
    if let Some(id) = selection.invitado_id {
        if id != invitado.id {
            return Err(RegistryError::InvitadoNotFound);
        }
    }

    let mut confirm_acompanantes = Vec::new();
    for id in &selection.acompanantes {
        let acompanante = invitado
            .acompanantes
            .iter()
            .find(|a| a.id == *id)
            .ok_or(RegistryError::AcompananteNotFound)?;
        if !acompanante.estado_asistencia {
            confirm_acompanantes.push(*id);
        }
    }

    let confirm_invitado = selection.invitado_id.is_some() && !invitado.estado_asistencia;

    let invitado_confirmado = invitado.estado_asistencia || confirm_invitado;
    let acompanantes_confirmados = invitado
        .acompanantes
        .iter()
        .filter(|a| a.estado_asistencia || confirm_acompanantes.contains(&a.id))
        .count() as u64;

    let outcome = ConfirmOutcome {
        personas_confirmadas: u64::from(invitado_confirmado) + acompanantes_confirmados,
        nuevas_confirmaciones: u64::from(confirm_invitado) + confirm_acompanantes.len() as u64,
    };

    Ok(ConfirmPlan {
        confirm_invitado,
        confirm_acompanantes,
        outcome,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::Acompanante;
    use chrono::Utc;

    fn group(estado: bool, companion_estados: &[bool]) -> Invitado {
        let now = Utc::now();
        let acompanantes = companion_estados
            .iter()
            .enumerate()
            .map(|(i, confirmed)| Acompanante {
                id: AcompananteId(i as i64 + 10),
                invitado_id: InvitadoId(1),
                nombre: format!("Acompañante {i}"),
                cedula: format!("80{i}"),
                edad: None,
                parentesco: None,
                eps: None,
                estado_asistencia: *confirmed,
                created_at: now,
                updated_at: now,
            })
            .collect();
        Invitado {
            id: InvitadoId(1),
            nombre: "Carlos Ruiz".to_string(),
            cedula: "555".to_string(),
            campana_area: None,
            eps: None,
            sede: None,
            estado_asistencia: estado,
            created_at: now,
            updated_at: now,
            acompanantes,
        }
    }

    #[test]
    fn from_raw_treats_zero_as_no_guest() {
        let selection = ConfirmSelection::from_raw(0, &[3]).unwrap();
        assert_eq!(selection.invitado_id, None);
        assert_eq!(selection.acompanantes, vec![AcompananteId(3)]);

        let selection = ConfirmSelection::from_raw(-7, &[3]).unwrap();
        assert_eq!(selection.invitado_id, None);
    }

    #[test]
    fn from_raw_rejects_empty_selection() {
        assert_eq!(
            ConfirmSelection::from_raw(0, &[]),
            Err(RegistryError::EmptySelection)
        );
    }

    #[test]
    fn from_raw_deduplicates_companions() {
        let selection = ConfirmSelection::from_raw(1, &[5, 5, 6, 5]).unwrap();
        assert_eq!(
            selection.acompanantes,
            vec![AcompananteId(5), AcompananteId(6)]
        );
    }

    #[test]
    fn full_group_confirms_everyone() {
        let invitado = group(false, &[false, false]);
        let selection = ConfirmSelection::from_raw(1, &[10, 11]).unwrap();
        let plan = plan_confirmation(&selection, &invitado).unwrap();

        assert!(plan.confirm_invitado);
        assert_eq!(
            plan.confirm_acompanantes,
            vec![AcompananteId(10), AcompananteId(11)]
        );
        assert_eq!(plan.outcome.personas_confirmadas, 3);
        assert_eq!(plan.outcome.nuevas_confirmaciones, 3);
    }

    #[test]
    fn subset_leaves_unselected_companion_pending() {
        let invitado = group(false, &[false, false]);
        let selection = ConfirmSelection::from_raw(1, &[10]).unwrap();
        let plan = plan_confirmation(&selection, &invitado).unwrap();

        assert!(plan.confirm_invitado);
        assert_eq!(plan.confirm_acompanantes, vec![AcompananteId(10)]);
        assert_eq!(plan.outcome.personas_confirmadas, 2);
    }

    #[test]
    fn companions_only_leaves_guest_pending() {
        let invitado = group(false, &[false]);
        let selection = ConfirmSelection::from_raw(0, &[10]).unwrap();
        let plan = plan_confirmation(&selection, &invitado).unwrap();

        assert!(!plan.confirm_invitado);
        assert_eq!(plan.outcome.personas_confirmadas, 1);
        assert_eq!(plan.outcome.nuevas_confirmaciones, 1);
    }

    #[test]
    fn reconfirming_is_a_no_op() {
        let invitado = group(true, &[true]);
        let selection = ConfirmSelection::from_raw(1, &[10]).unwrap();
        let plan = plan_confirmation(&selection, &invitado).unwrap();

        assert!(!plan.confirm_invitado);
        assert!(plan.confirm_acompanantes.is_empty());
        assert_eq!(plan.outcome.personas_confirmadas, 2);
        assert_eq!(plan.outcome.nuevas_confirmaciones, 0);
    }

    #[test]
    fn totals_count_previously_confirmed_people() {
        // One companion confirmed earlier; confirming just the guest
        // reports both of them.
        let invitado = group(false, &[true, false]);
        let selection = ConfirmSelection::from_raw(1, &[]).unwrap();
        let plan = plan_confirmation(&selection, &invitado).unwrap();

        assert_eq!(plan.outcome.personas_confirmadas, 2);
        assert_eq!(plan.outcome.nuevas_confirmaciones, 1);
    }

    #[test]
    fn unknown_companion_rejects_whole_call() {
        let invitado = group(false, &[false]);
        let selection = ConfirmSelection::from_raw(1, &[10, 99]).unwrap();
        assert_eq!(
            plan_confirmation(&selection, &invitado),
            Err(RegistryError::AcompananteNotFound)
        );
    }

    #[test]
    fn selection_for_other_guest_is_rejected() {
        let invitado = group(false, &[]);
        let selection = ConfirmSelection::from_raw(2, &[]).unwrap();
        assert_eq!(
            plan_confirmation(&selection, &invitado),
            Err(RegistryError::InvitadoNotFound)
        );
    }
}
