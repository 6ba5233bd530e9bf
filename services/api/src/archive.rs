//! Archival of completed requests

use chrono::{DateTime, Utc};
use common::error::DatabaseError;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        archive::{ArchiveSummary, ArchivedClient, ArchivedProcess, ArchivedRequest},
        request::RequestRecord,
    },
    repositories::{ArchiveRepository, RequestRepository},
    workflow::machine::{Stage, WorkflowError, ensure_archivable},
};

/// Condense a fully approved request into its archive row
pub fn build_archive(
    record: &RequestRecord,
    agent_email: &str,
    now: DateTime<Utc>,
) -> Result<ArchivedRequest, WorkflowError> {
    ensure_archivable(record)?;

    let note = |stage: Stage| record.notes.get(stage.note_key()).cloned();

    Ok(ArchivedRequest {
        id: Uuid::new_v4(),
        original_request_id: record.id,
        summary: ArchiveSummary {
            cliente: ArchivedClient {
                nombre: record.client.name.clone(),
                cif_nif: record.client.cif_nif.clone(),
                tipo_carga: record.client.load_type,
                metodo_pago: record.client.payment_method,
            },
            proceso: ArchivedProcess {
                director: note(Stage::Director),
                pedidos: note(Stage::Orders),
                admin: note(Stage::Admin),
            },
        },
        created_at: record.created_at,
        director_approved_at: record.approved_at.director,
        orders_approved_at: record.approved_at.orders,
        admin_approved_at: record.approved_at.admin,
        agent_email: agent_email.to_string(),
        client_name: record.client.name.clone(),
        archived_at: now,
    })
}

/// Moves completed requests into the archive
#[derive(Clone)]
pub struct ArchiveService {
    requests: RequestRepository,
    archives: ArchiveRepository,
}

impl ArchiveService {
    pub fn new(requests: RequestRepository, archives: ArchiveRepository) -> Self {
        Self { requests, archives }
    }

    /// Write the archive row and delete the live request in one transaction
    #[instrument(skip(self))]
    pub async fn archive(&self, id: Uuid) -> ApiResult<ArchivedRequest> {
        let mut tx = self.requests.begin().await?;

        let record = self
            .requests
            .find_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        let agent_email = self.requests.owner_email(&mut tx, record.agent_id).await?;
        let archived = build_archive(&record, &agent_email, Utc::now())?;

        self.archives.insert(&mut tx, &archived).await?;
        self.requests.delete(&mut tx, id).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        info!("Request {} archived as {}", id, archived.id);
        Ok(archived)
    }

    /// Every archived request
    pub async fn list(&self) -> ApiResult<Vec<ArchivedRequest>> {
        Ok(self.archives.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::tests::client_data;
    use chrono::Duration;

    fn completed_record() -> RequestRecord {
        let created = Utc::now() - Duration::days(3);
        let mut record = RequestRecord::submitted(Uuid::new_v4(), client_data(), created);
        for (i, stage) in Stage::ALL.into_iter().enumerate() {
            record.approvals.approve(stage);
            record
                .approved_at
                .stamp(stage, created + Duration::days(i as i64 + 1));
        }
        record.state = crate::workflow::machine::WorkflowState::Completed;
        record
            .notes
            .insert("director".to_string(), "Tarifa X1".to_string());
        record.notes.insert("admin".to_string(), String::new());
        record
    }

    #[test]
    fn test_build_archive_summary() {
        let record = completed_record();
        let now = Utc::now();
        let archived = build_archive(&record, "ana@example.com", now).unwrap();

        assert_eq!(archived.original_request_id, record.id);
        assert_eq!(archived.client_name, "Electro Martínez S.L.");
        assert_eq!(archived.agent_email, "ana@example.com");
        assert_eq!(archived.created_at, record.created_at);
        assert_eq!(archived.director_approved_at, record.approved_at.director);
        assert_eq!(archived.admin_approved_at, record.approved_at.admin);
        assert_eq!(archived.archived_at, now);
        assert_eq!(archived.summary.proceso.director.as_deref(), Some("Tarifa X1"));
        assert_eq!(archived.summary.proceso.pedidos, None);
        assert_eq!(archived.summary.proceso.admin.as_deref(), Some(""));

        let value = serde_json::to_value(&archived).unwrap();
        assert_eq!(value["solicitud_original_id"], record.id.to_string());
        assert_eq!(value["resumen"]["cliente"]["cif_nif"], "B50000000");
        assert_eq!(value["resumen"]["cliente"]["metodo_pago"], "TRANSFERENCIA");
    }

    #[test]
    fn test_build_archive_requires_all_approvals() {
        let mut record = completed_record();
        record.approvals.orders = false;

        assert_eq!(
            build_archive(&record, "ana@example.com", Utc::now()).unwrap_err(),
            WorkflowError::NotFullyApproved
        );
    }
}
