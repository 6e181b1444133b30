//! Guest registry for event attendance confirmation.
//!
//! This crate owns the domain model of the registry: invited guests
//! (`Invitado`), their registered companions (`Acompanante`) and the
//! audit trail of confirmations (`AsistenciaLog`). On top of the model
//! it provides:
//!
//! - [`providers::GuestRegistry`], the storage-agnostic registry trait
//! - [`mocks::MockGuestRegistry`], an in-memory implementation used in
//!   tests and as the default backend when no database is configured
//! - [`stores::postgres`], a PostgreSQL implementation (behind the
//!   `postgres` feature)
//! - [`confirmation`], the pure planning logic that decides which
//!   people flip to confirmed for a given selection
//! - [`import`], the Excel workbook parser and template builder
//!
//! All registry operations speak Spanish on the error surface because
//! the confirmation terminal renders error messages verbatim.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod confirmation;
pub mod error;
pub mod import;
pub mod mocks;
pub mod providers;
pub mod stores;
pub mod types;

pub use confirmation::{ConfirmOutcome, ConfirmPlan, ConfirmSelection, plan_confirmation};
pub use error::{RegistryError, Result};
pub use import::{ImportBatch, ImportReport, ImportedAcompanante, build_template, parse_workbook};
pub use providers::GuestRegistry;
pub use types::{
    Acompanante, AcompananteId, AsistenciaLog, DeleteAllReport, Invitado, InvitadoId,
    NuevoAcompanante, NuevoInvitado, PersonaTipo, SearchResult, Stats,
};
