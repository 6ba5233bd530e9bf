//! Archive repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use crate::models::archive::{ArchiveSummary, ArchivedRequest};

const ARCHIVE_COLUMNS: &str = "id, solicitud_original_id, resumen, fecha_creacion, \
                               fecha_aprobacion_director, fecha_aprobacion_pedidos, \
                               fecha_aprobacion_admin, comercial_email, cliente_nombre, archivado_en";

fn archived_from_row(row: &PgRow) -> DatabaseResult<ArchivedRequest> {
    let Json(summary): Json<ArchiveSummary> = row.try_get("resumen")?;

    Ok(ArchivedRequest {
        id: row.try_get("id")?,
        original_request_id: row.try_get("solicitud_original_id")?,
        summary,
        created_at: row.try_get("fecha_creacion")?,
        director_approved_at: row.try_get("fecha_aprobacion_director")?,
        orders_approved_at: row.try_get("fecha_aprobacion_pedidos")?,
        admin_approved_at: row.try_get("fecha_aprobacion_admin")?,
        agent_email: row.try_get("comercial_email")?,
        client_name: row.try_get("cliente_nombre")?,
        archived_at: row.try_get("archivado_en")?,
    })
}

/// Archive repository
#[derive(Clone)]
pub struct ArchiveRepository {
    pool: PgPool,
}

impl ArchiveRepository {
    /// Create a new archive repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an archived request inside the caller's transaction
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        archived: &ArchivedRequest,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO solicitudes_archivadas (id, solicitud_original_id, resumen, fecha_creacion,
                                                fecha_aprobacion_director, fecha_aprobacion_pedidos,
                                                fecha_aprobacion_admin, comercial_email,
                                                cliente_nombre, archivado_en)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(archived.id)
        .bind(archived.original_request_id)
        .bind(Json(&archived.summary))
        .bind(archived.created_at)
        .bind(archived.director_approved_at)
        .bind(archived.orders_approved_at)
        .bind(archived.admin_approved_at)
        .bind(&archived.agent_email)
        .bind(&archived.client_name)
        .bind(archived.archived_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// All archived requests, most recently archived first
    pub async fn list(&self) -> DatabaseResult<Vec<ArchivedRequest>> {
        let sql = format!(
            "SELECT {ARCHIVE_COLUMNS} FROM solicitudes_archivadas ORDER BY archivado_en DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(archived_from_row).collect()
    }

    /// Find the archive entry of an original request
    pub async fn find_by_original_id(&self, id: Uuid) -> DatabaseResult<Option<ArchivedRequest>> {
        let sql = format!(
            "SELECT {ARCHIVE_COLUMNS} FROM solicitudes_archivadas WHERE solicitud_original_id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(archived_from_row).transpose()
    }

    /// Number of archived requests submitted by the agent with `email`
    pub async fn count_for_email(&self, email: &str) -> DatabaseResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM solicitudes_archivadas WHERE comercial_email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("total")?)
    }
}
