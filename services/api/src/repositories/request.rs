//! Request repository for database operations
//!
//! Plain persistence: ownership and role checks belong to the callers.
//! Methods taking a `PgConnection` run inside the caller's transaction.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::request::{ApprovalFlags, ApprovalTimes, ClientData, Notes, RequestRecord},
    workflow::machine::WorkflowState,
};

const REQUEST_COLUMNS: &str = "id, comercial_id, datos_cliente, estado, aprobado_director, \
                               aprobado_pedidos, aprobado_admin, notas, fecha_aprobacion_director, \
                               fecha_aprobacion_pedidos, fecha_aprobacion_admin, creado_en, \
                               actualizado_en";

fn request_from_row(row: &PgRow) -> DatabaseResult<RequestRecord> {
    let state: String = row.try_get("estado")?;
    let state = state
        .parse::<WorkflowState>()
        .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(e.into())))?;
    let Json(client): Json<ClientData> = row.try_get("datos_cliente")?;
    let Json(notes): Json<Notes> = row.try_get("notas")?;

    Ok(RequestRecord {
        id: row.try_get("id")?,
        agent_id: row.try_get("comercial_id")?,
        client,
        state,
        approvals: ApprovalFlags {
            director: row.try_get("aprobado_director")?,
            orders: row.try_get("aprobado_pedidos")?,
            admin: row.try_get("aprobado_admin")?,
        },
        approved_at: ApprovalTimes {
            director: row.try_get("fecha_aprobacion_director")?,
            orders: row.try_get("fecha_aprobacion_pedidos")?,
            admin: row.try_get("fecha_aprobacion_admin")?,
        },
        notes,
        created_at: row.try_get("creado_en")?,
        updated_at: row.try_get("actualizado_en")?,
    })
}

/// Request repository
#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    /// Create a new request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a transaction on the underlying pool
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Insert a new request
    pub async fn create(&self, record: &RequestRecord) -> DatabaseResult<()> {
        debug!("Creating request {} for agent {}", record.id, record.agent_id);

        sqlx::query(
            r#"
            INSERT INTO solicitudes (id, comercial_id, datos_cliente, estado, aprobado_director,
                                     aprobado_pedidos, aprobado_admin, notas, creado_en,
                                     actualizado_en)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.agent_id)
        .bind(Json(&record.client))
        .bind(record.state.as_str())
        .bind(record.approvals.director)
        .bind(record.approvals.orders)
        .bind(record.approvals.admin)
        .bind(Json(&record.notes))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a request by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<RequestRecord>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM solicitudes WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    /// Find a request by ID and lock its row until the transaction ends
    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> DatabaseResult<Option<RequestRecord>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM solicitudes WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql).bind(id).fetch_optional(conn).await?;

        row.as_ref().map(request_from_row).transpose()
    }

    /// Requests submitted by an agent, newest first
    pub async fn find_by_owner(&self, agent_id: Uuid) -> DatabaseResult<Vec<RequestRecord>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM solicitudes WHERE comercial_id = $1 \
             ORDER BY creado_en DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(agent_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(request_from_row).collect()
    }

    /// Requests in a given state, oldest first
    pub async fn find_by_state(&self, state: WorkflowState) -> DatabaseResult<Vec<RequestRecord>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM solicitudes WHERE estado = $1 ORDER BY creado_en ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(state.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(request_from_row).collect()
    }

    /// Number of an agent's requests per state
    pub async fn count_by_state_for_owner(
        &self,
        agent_id: Uuid,
    ) -> DatabaseResult<Vec<(WorkflowState, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT estado, COUNT(*) AS total
            FROM solicitudes
            WHERE comercial_id = $1
            GROUP BY estado
            "#,
        )
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<(WorkflowState, i64)> {
                let state: String = row.try_get("estado")?;
                let state = state
                    .parse::<WorkflowState>()
                    .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(e.into())))?;
                Ok((state, row.try_get("total")?))
            })
            .collect()
    }

    /// Persist the mutable workflow columns of a request
    pub async fn update(&self, conn: &mut PgConnection, record: &RequestRecord) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE solicitudes
            SET datos_cliente = $2,
                estado = $3,
                aprobado_director = $4,
                aprobado_pedidos = $5,
                aprobado_admin = $6,
                notas = $7,
                fecha_aprobacion_director = $8,
                fecha_aprobacion_pedidos = $9,
                fecha_aprobacion_admin = $10,
                actualizado_en = $11
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(Json(&record.client))
        .bind(record.state.as_str())
        .bind(record.approvals.director)
        .bind(record.approvals.orders)
        .bind(record.approvals.admin)
        .bind(Json(&record.notes))
        .bind(record.approved_at.director)
        .bind(record.approved_at.orders)
        .bind(record.approved_at.admin)
        .bind(record.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete a request, returning whether a row was removed
    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM solicitudes WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Email of the agent who submitted a request
    pub async fn owner_email(&self, conn: &mut PgConnection, agent_id: Uuid) -> DatabaseResult<String> {
        let row = sqlx::query("SELECT email FROM usuarios WHERE id = $1")
            .bind(agent_id)
            .fetch_one(conn)
            .await?;

        Ok(row.try_get("email")?)
    }
}
