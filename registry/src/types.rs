//! Registry state types.
//!
//! This module defines the people tracked by the registry and the
//! derived read models (search results, stats, reports). All types are
//! `Clone` and serialize with the Spanish field names the terminal
//! expects on the wire.

use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// Field Limits
// ═══════════════════════════════════════════════════════════════════════

/// Maximum length for names and free-text descriptors.
pub const MAX_NOMBRE: usize = 255;

/// Maximum length for a cedula (national id).
pub const MAX_CEDULA: usize = 20;

/// Maximum length for the companion relationship field.
pub const MAX_PARENTESCO: usize = 100;

/// Inclusive upper bound for a companion's age.
pub const MAX_EDAD: i32 = 120;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for an invited guest.
///
/// Ids are sequence-assigned integers. The wire contract reserves `0`
/// (and negatives) as "no guest selected" in confirmation requests, so
/// real ids always start at `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvitadoId(pub i64);

/// Unique identifier for a registered companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AcompananteId(pub i64);

// ═══════════════════════════════════════════════════════════════════════
// People
// ═══════════════════════════════════════════════════════════════════════

/// Kind of person referenced by an audit log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaTipo {
    /// An invited guest.
    Principal,
    /// A registered companion.
    Acompanante,
}

impl PersonaTipo {
    /// Storage representation, as persisted in the audit table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::Acompanante => "acompanante",
        }
    }
}

/// An invited guest.
///
/// Carries the guest's registered companions so a single search hit
/// hands the terminal everything it renders on the confirmation card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitado {
    /// Unique identifier.
    pub id: InvitadoId,

    /// Full name.
    pub nombre: String,

    /// National id, unique across guests.
    pub cedula: String,

    /// Campaign or business area the guest belongs to.
    pub campana_area: Option<String>,

    /// Health provider.
    pub eps: Option<String>,

    /// Office or site.
    pub sede: Option<String>,

    /// Whether attendance has been confirmed.
    pub estado_asistencia: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,

    /// Registered companions, ordered by id.
    pub acompanantes: Vec<Acompanante>,
}

/// A companion registered under a guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acompanante {
    /// Unique identifier.
    pub id: AcompananteId,

    /// Owning guest.
    pub invitado_id: InvitadoId,

    /// Full name.
    pub nombre: String,

    /// National id, unique across companions.
    pub cedula: String,

    /// Age, when registered.
    pub edad: Option<i32>,

    /// Relationship to the guest.
    pub parentesco: Option<String>,

    /// Health provider.
    pub eps: Option<String>,

    /// Whether attendance has been confirmed.
    pub estado_asistencia: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════
// Audit Trail
// ═══════════════════════════════════════════════════════════════════════

/// One row of the confirmation audit trail.
///
/// A row is appended for every person that flips to confirmed, and for
/// every person registered at the door. `persona_id` points into the
/// guest table or the companion table depending on `tipo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsistenciaLog {
    /// Unique identifier.
    pub id: i64,

    /// Id of the person, in the table selected by `tipo`.
    pub persona_id: i64,

    /// Which table `persona_id` points into.
    pub tipo: PersonaTipo,

    /// When the event happened.
    pub timestamp: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════
// Drafts
// ═══════════════════════════════════════════════════════════════════════

/// Data for a guest about to be registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuevoInvitado {
    /// Full name.
    pub nombre: String,
    /// National id.
    pub cedula: String,
    /// Campaign or business area.
    pub campana_area: Option<String>,
    /// Health provider.
    pub eps: Option<String>,
    /// Office or site.
    pub sede: Option<String>,
}

impl NuevoInvitado {
    /// Checks required fields and length caps.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingRequiredField`] when the name or
    /// cedula is blank, and [`RegistryError::FieldTooLong`] when any
    /// field exceeds its storage limit.
    pub fn validate(&self) -> Result<()> {
        require_text("nombre", &self.nombre, MAX_NOMBRE)?;
        require_text("cedula", &self.cedula, MAX_CEDULA)?;
        optional_text("campana_area", self.campana_area.as_deref(), MAX_NOMBRE)?;
        optional_text("eps", self.eps.as_deref(), MAX_NOMBRE)?;
        optional_text("sede", self.sede.as_deref(), MAX_NOMBRE)?;
        Ok(())
    }
}

/// Data for a companion about to be registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuevoAcompanante {
    /// Full name.
    pub nombre: String,
    /// National id.
    pub cedula: String,
    /// Age.
    pub edad: Option<i32>,
    /// Relationship to the guest.
    pub parentesco: Option<String>,
    /// Health provider.
    pub eps: Option<String>,
}

impl NuevoAcompanante {
    /// Checks required fields, length caps and the age range.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingRequiredField`],
    /// [`RegistryError::FieldTooLong`] or [`RegistryError::InvalidEdad`]
    /// when a field is out of contract.
    pub fn validate(&self) -> Result<()> {
        require_text("nombre", &self.nombre, MAX_NOMBRE)?;
        require_text("cedula", &self.cedula, MAX_CEDULA)?;
        if let Some(edad) = self.edad {
            if !(0..=MAX_EDAD).contains(&edad) {
                return Err(RegistryError::InvalidEdad);
            }
        }
        optional_text("parentesco", self.parentesco.as_deref(), MAX_PARENTESCO)?;
        optional_text("eps", self.eps.as_deref(), MAX_NOMBRE)?;
        Ok(())
    }
}

fn require_text(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistryError::MissingRequiredField);
    }
    if value.chars().count() > max {
        return Err(RegistryError::FieldTooLong { field, max });
    }
    Ok(())
}

fn optional_text(field: &'static str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(RegistryError::FieldTooLong { field, max }),
        _ => Ok(()),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Search
// ═══════════════════════════════════════════════════════════════════════

/// What the terminal renders after a successful search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched guest, companions included.
    pub invitado: Invitado,

    /// Group size: the guest plus every registered companion.
    pub total_personas: u64,

    /// `true` only when the guest and all companions are confirmed.
    pub asistencia_confirmada: bool,
}

impl SearchResult {
    /// Derives the group totals from a loaded guest.
    #[must_use]
    pub fn from_invitado(invitado: Invitado) -> Self {
        let total_personas = 1 + invitado.acompanantes.len() as u64;
        let asistencia_confirmada = invitado.estado_asistencia
            && invitado.acompanantes.iter().all(|a| a.estado_asistencia);
        Self {
            invitado,
            total_personas,
            asistencia_confirmada,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Stats & Reports
// ═══════════════════════════════════════════════════════════════════════

/// Registry-wide attendance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Guests registered.
    pub total_invitados: u64,
    /// Guests confirmed.
    pub invitados_confirmados: u64,
    /// Companions registered.
    pub total_acompanantes: u64,
    /// Companions confirmed.
    pub acompanantes_confirmados: u64,
    /// Guests plus companions.
    pub total_personas: u64,
    /// Confirmed guests plus confirmed companions.
    pub personas_confirmadas: u64,
}

impl Stats {
    /// Builds the full counter set from the four base counts.
    ///
    /// The two aggregate fields are derived here so they can never
    /// disagree with the base counts.
    #[must_use]
    pub const fn from_counts(
        total_invitados: u64,
        invitados_confirmados: u64,
        total_acompanantes: u64,
        acompanantes_confirmados: u64,
    ) -> Self {
        Self {
            total_invitados,
            invitados_confirmados,
            total_acompanantes,
            acompanantes_confirmados,
            total_personas: total_invitados + total_acompanantes,
            personas_confirmadas: invitados_confirmados + acompanantes_confirmados,
        }
    }
}

/// Row counts removed by a registry wipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteAllReport {
    /// Guests removed.
    pub invitados: u64,
    /// Companions removed.
    pub acompanantes: u64,
    /// Audit rows removed.
    pub logs: u64,
}
