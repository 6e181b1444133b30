//! PostgreSQL guest registry implementation.
//!
//! Queries are built at runtime with `query_as`, so the crate compiles
//! without a database on hand. Confirmations run inside a transaction
//! that locks the guest row (`SELECT ... FOR UPDATE`); two operators
//! confirming the same guest are applied one after the other and
//! neither selection is dropped.
//!
//! # Example
//!
//! ```no_run
//! use asistencia_registry::stores::postgres::PostgresGuestRegistry;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/asistencia").await?;
//! let registry = PostgresGuestRegistry::new(pool);
//! registry.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::confirmation::{ConfirmOutcome, ConfirmSelection, plan_confirmation};
use crate::error::{RegistryError, Result};
use crate::import::{ImportBatch, ImportReport};
use crate::providers::GuestRegistry;
use crate::types::{
    Acompanante, AcompananteId, DeleteAllReport, Invitado, InvitadoId, NuevoAcompanante,
    NuevoInvitado, PersonaTipo, SearchResult, Stats,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

/// PostgreSQL guest registry.
#[derive(Clone)]
pub struct PostgresGuestRegistry {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct InvitadoRow {
    id: i64,
    nombre: String,
    cedula: String,
    campana_area: Option<String>,
    eps: Option<String>,
    sede: Option<String>,
    estado_asistencia: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvitadoRow {
    fn into_invitado(self, acompanantes: Vec<Acompanante>) -> Invitado {
        Invitado {
            id: InvitadoId(self.id),
            nombre: self.nombre,
            cedula: self.cedula,
            campana_area: self.campana_area,
            eps: self.eps,
            sede: self.sede,
            estado_asistencia: self.estado_asistencia,
            created_at: self.created_at,
            updated_at: self.updated_at,
            acompanantes,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AcompananteRow {
    id: i64,
    invitado_id: i64,
    nombre: String,
    cedula: String,
    edad: Option<i32>,
    parentesco: Option<String>,
    eps: Option<String>,
    estado_asistencia: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AcompananteRow> for Acompanante {
    fn from(row: AcompananteRow) -> Self {
        Self {
            id: AcompananteId(row.id),
            invitado_id: InvitadoId(row.invitado_id),
            nombre: row.nombre,
            cedula: row.cedula,
            edad: row.edad,
            parentesco: row.parentesco,
            eps: row.eps,
            estado_asistencia: row.estado_asistencia,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_INVITADO: &str = r"
    SELECT id, nombre, cedula, campana_area, eps, sede,
           estado_asistencia, created_at, updated_at
    FROM invitados
";

const SELECT_ACOMPANANTE: &str = r"
    SELECT id, invitado_id, nombre, cedula, edad, parentesco, eps,
           estado_asistencia, created_at, updated_at
    FROM acompanantes
";

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> RegistryError + '_ {
    move |e| RegistryError::DatabaseError(format!("Failed to {context}: {e}"))
}

fn insert_error(e: sqlx::Error, conflict: RegistryError) -> RegistryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return conflict;
        }
    }
    RegistryError::DatabaseError(format!("Failed to insert: {e}"))
}

fn count_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

async fn fetch_acompanantes<'e, E>(executor: E, invitado_id: i64) -> Result<Vec<Acompanante>>
where
    E: sqlx::PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, AcompananteRow>(&format!(
        "{SELECT_ACOMPANANTE} WHERE invitado_id = $1 ORDER BY id"
    ))
    .bind(invitado_id)
    .fetch_all(executor)
    .await
    .map_err(db_error("load companions"))?;
    Ok(rows.into_iter().map(Acompanante::from).collect())
}

impl PostgresGuestRegistry {
    /// Create a new PostgreSQL guest registry.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RegistryError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    async fn load_invitado(&self, id: i64) -> Result<Option<Invitado>> {
        let row = sqlx::query_as::<_, InvitadoRow>(&format!("{SELECT_INVITADO} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load guest"))?;
        match row {
            Some(row) => {
                let acompanantes = fetch_acompanantes(&self.pool, id).await?;
                Ok(Some(row.into_invitado(acompanantes)))
            }
            None => Ok(None),
        }
    }

    async fn find_guest_id(&self, query: &str, pattern: &str) -> Result<Option<i64>> {
        let mut guest_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM invitados WHERE cedula = $1 ORDER BY id LIMIT 1")
                .bind(query)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("search guests"))?;

        if guest_id.is_none() {
            guest_id = sqlx::query_scalar(
                "SELECT id FROM invitados WHERE nombre ILIKE $1 ORDER BY id LIMIT 1",
            )
            .bind(pattern)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("search guests"))?;
        }

        if guest_id.is_none() {
            guest_id = sqlx::query_scalar(
                "SELECT invitado_id FROM acompanantes WHERE cedula = $1 ORDER BY id LIMIT 1",
            )
            .bind(query)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("search companions"))?;
        }

        if guest_id.is_none() {
            guest_id = sqlx::query_scalar(
                "SELECT invitado_id FROM acompanantes WHERE nombre ILIKE $1 ORDER BY id LIMIT 1",
            )
            .bind(pattern)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("search companions"))?;
        }

        Ok(guest_id)
    }
}

impl GuestRegistry for PostgresGuestRegistry {
    async fn search(&self, query: &str) -> Result<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RegistryError::EmptyQuery);
        }
        let pattern = format!("%{query}%");

        let guest_id = self
            .find_guest_id(query, &pattern)
            .await?
            .ok_or(RegistryError::NoMatches)?;
        let invitado = self
            .load_invitado(guest_id)
            .await?
            .ok_or(RegistryError::NoMatches)?;
        Ok(SearchResult::from_invitado(invitado))
    }

    async fn list_invitados(&self) -> Result<Vec<Invitado>> {
        let rows =
            sqlx::query_as::<_, InvitadoRow>(&format!("{SELECT_INVITADO} ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("list guests"))?;
        let companion_rows =
            sqlx::query_as::<_, AcompananteRow>(&format!("{SELECT_ACOMPANANTE} ORDER BY id"))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("list companions"))?;

        let mut by_guest: HashMap<i64, Vec<Acompanante>> = HashMap::new();
        for row in companion_rows {
            by_guest
                .entry(row.invitado_id)
                .or_default()
                .push(Acompanante::from(row));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let acompanantes = by_guest.remove(&row.id).unwrap_or_default();
                row.into_invitado(acompanantes)
            })
            .collect())
    }

    async fn quick_add_invitado(&self, nuevo: &NuevoInvitado) -> Result<Invitado> {
        nuevo.validate()?;
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let row = sqlx::query_as::<_, InvitadoRow>(
            r"
            INSERT INTO invitados (nombre, cedula, campana_area, eps, sede, estado_asistencia)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, nombre, cedula, campana_area, eps, sede,
                      estado_asistencia, created_at, updated_at
            ",
        )
        .bind(&nuevo.nombre)
        .bind(&nuevo.cedula)
        .bind(&nuevo.campana_area)
        .bind(&nuevo.eps)
        .bind(&nuevo.sede)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| insert_error(e, RegistryError::DuplicateCedula))?;

        sqlx::query("INSERT INTO asistencias_log (persona_id, tipo) VALUES ($1, $2)")
            .bind(row.id)
            .bind(PersonaTipo::Principal.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("log registration"))?;

        tx.commit().await.map_err(db_error("commit"))?;

        tracing::debug!(invitado_id = row.id, "walk-in guest registered");
        Ok(row.into_invitado(Vec::new()))
    }

    async fn add_acompanante(
        &self,
        invitado_id: InvitadoId,
        nuevo: &NuevoAcompanante,
    ) -> Result<Acompanante> {
        nuevo.validate()?;
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let _: i64 = sqlx::query_scalar("SELECT id FROM invitados WHERE id = $1")
            .bind(invitado_id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("load guest"))?
            .ok_or(RegistryError::InvitadoNotFound)?;

        let row = sqlx::query_as::<_, AcompananteRow>(
            r"
            INSERT INTO acompanantes
                (invitado_id, nombre, cedula, edad, parentesco, eps, estado_asistencia)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, invitado_id, nombre, cedula, edad, parentesco, eps,
                      estado_asistencia, created_at, updated_at
            ",
        )
        .bind(invitado_id.0)
        .bind(&nuevo.nombre)
        .bind(&nuevo.cedula)
        .bind(nuevo.edad)
        .bind(&nuevo.parentesco)
        .bind(&nuevo.eps)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| insert_error(e, RegistryError::DuplicateAcompananteCedula))?;

        sqlx::query("INSERT INTO asistencias_log (persona_id, tipo) VALUES ($1, $2)")
            .bind(row.id)
            .bind(PersonaTipo::Acompanante.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("log registration"))?;

        tx.commit().await.map_err(db_error("commit"))?;

        tracing::debug!(
            invitado_id = invitado_id.0,
            acompanante_id = row.id,
            "extra companion registered"
        );
        Ok(Acompanante::from(row))
    }

    async fn confirm_attendance(&self, selection: &ConfirmSelection) -> Result<ConfirmOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let guest_id = match selection.invitado_id {
            Some(id) => id.0,
            None => {
                let first = selection
                    .acompanantes
                    .first()
                    .ok_or(RegistryError::EmptySelection)?;
                sqlx::query_scalar::<_, i64>(
                    "SELECT invitado_id FROM acompanantes WHERE id = $1",
                )
                .bind(first.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("resolve companion"))?
                .ok_or(RegistryError::AcompananteNotFound)?
            }
        };

        // Lock the guest row so concurrent confirmations of the same
        // group apply one at a time.
        let row = sqlx::query_as::<_, InvitadoRow>(&format!(
            "{SELECT_INVITADO} WHERE id = $1 FOR UPDATE"
        ))
        .bind(guest_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("lock guest"))?
        .ok_or(RegistryError::InvitadoNotFound)?;

        let acompanantes = fetch_acompanantes(&mut *tx, guest_id).await?;
        let invitado = row.into_invitado(acompanantes);
        let plan = plan_confirmation(selection, &invitado)?;

        let now = Utc::now();
        if plan.confirm_invitado {
            sqlx::query("UPDATE invitados SET estado_asistencia = TRUE, updated_at = $2 WHERE id = $1")
                .bind(guest_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_error("confirm guest"))?;
            sqlx::query("INSERT INTO asistencias_log (persona_id, tipo) VALUES ($1, $2)")
                .bind(guest_id)
                .bind(PersonaTipo::Principal.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_error("log confirmation"))?;
        }

        for id in &plan.confirm_acompanantes {
            sqlx::query(
                "UPDATE acompanantes SET estado_asistencia = TRUE, updated_at = $2 WHERE id = $1",
            )
            .bind(id.0)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error("confirm companion"))?;
            sqlx::query("INSERT INTO asistencias_log (persona_id, tipo) VALUES ($1, $2)")
                .bind(id.0)
                .bind(PersonaTipo::Acompanante.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_error("log confirmation"))?;
        }

        tx.commit().await.map_err(db_error("commit"))?;

        tracing::debug!(
            invitado_id = guest_id,
            nuevas = plan.outcome.nuevas_confirmaciones,
            "attendance confirmed"
        );
        Ok(plan.outcome)
    }

    async fn compute_stats(&self) -> Result<Stats> {
        let (total_i, conf_i, total_a, conf_a): (i64, i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM invitados),
                (SELECT COUNT(*) FROM invitados WHERE estado_asistencia),
                (SELECT COUNT(*) FROM acompanantes),
                (SELECT COUNT(*) FROM acompanantes WHERE estado_asistencia)
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("compute stats"))?;

        Ok(Stats::from_counts(
            count_u64(total_i),
            count_u64(conf_i),
            count_u64(total_a),
            count_u64(conf_a),
        ))
    }

    async fn import_batch(&self, batch: &ImportBatch) -> Result<ImportReport> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;
        let mut report = ImportReport::default();

        for draft in &batch.invitados {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM invitados WHERE cedula = $1")
                    .bind(&draft.cedula)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_error("check guest cedula"))?;
            if exists.is_some() {
                tracing::debug!(cedula = %draft.cedula, "import: guest already registered, skipped");
                continue;
            }
            sqlx::query(
                r"
                INSERT INTO invitados (nombre, cedula, campana_area, eps, sede, estado_asistencia)
                VALUES ($1, $2, $3, $4, $5, TRUE)
                ",
            )
            .bind(&draft.nombre)
            .bind(&draft.cedula)
            .bind(&draft.campana_area)
            .bind(&draft.eps)
            .bind(&draft.sede)
            .execute(&mut *tx)
            .await
            .map_err(db_error("insert guest"))?;
            report.invitados_creados += 1;
        }

        for row in &batch.acompanantes {
            let owner: Option<i64> =
                sqlx::query_scalar("SELECT id FROM invitados WHERE cedula = $1")
                    .bind(&row.cedula_invitado_principal)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_error("resolve guest cedula"))?;
            let Some(owner) = owner else {
                tracing::debug!(
                    cedula = %row.acompanante.cedula,
                    invitado_cedula = %row.cedula_invitado_principal,
                    "import: companion without matching guest, skipped"
                );
                continue;
            };
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM acompanantes WHERE cedula = $1")
                    .bind(&row.acompanante.cedula)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(db_error("check companion cedula"))?;
            if exists.is_some() {
                tracing::debug!(cedula = %row.acompanante.cedula, "import: companion already registered, skipped");
                continue;
            }
            sqlx::query(
                r"
                INSERT INTO acompanantes
                    (invitado_id, nombre, cedula, edad, parentesco, eps, estado_asistencia)
                VALUES ($1, $2, $3, $4, $5, $6, TRUE)
                ",
            )
            .bind(owner)
            .bind(&row.acompanante.nombre)
            .bind(&row.acompanante.cedula)
            .bind(row.acompanante.edad)
            .bind(&row.acompanante.parentesco)
            .bind(&row.acompanante.eps)
            .execute(&mut *tx)
            .await
            .map_err(db_error("insert companion"))?;
            report.acompanantes_creados += 1;
        }

        tx.commit().await.map_err(db_error("commit"))?;

        tracing::info!(
            invitados = report.invitados_creados,
            acompanantes = report.acompanantes_creados,
            "import batch applied"
        );
        Ok(report)
    }

    async fn delete_all(&self) -> Result<DeleteAllReport> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        let logs = sqlx::query("DELETE FROM asistencias_log")
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete logs"))?
            .rows_affected();
        let acompanantes = sqlx::query("DELETE FROM acompanantes")
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete companions"))?
            .rows_affected();
        let invitados = sqlx::query("DELETE FROM invitados")
            .execute(&mut *tx)
            .await
            .map_err(db_error("delete guests"))?
            .rows_affected();

        tx.commit().await.map_err(db_error("commit"))?;

        tracing::info!(invitados, acompanantes, logs, "registry wiped");
        Ok(DeleteAllReport {
            invitados,
            acompanantes,
            logs,
        })
    }
}
