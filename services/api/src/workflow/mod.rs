//! Approval workflow over stored requests
//!
//! [`WorkflowService`] adds storage, ownership checks and transactions
//! around the pure rules in [`machine`].

pub mod machine;

use std::collections::HashMap;

use auth::{Role, User, repositories::UserRepository};
use chrono::Utc;
use common::error::DatabaseError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    documents::DocumentStore,
    error::{ApiError, ApiResult},
    models::request::{ClientData, DecisionPayload, RequestRecord, RequestSummary},
    repositories::{ArchiveRepository, RequestRepository},
};

use self::machine::Stage;

/// A file received with a submission
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Storage-backed approval workflow
#[derive(Clone)]
pub struct WorkflowService {
    requests: RequestRepository,
    archives: ArchiveRepository,
    users: UserRepository,
    documents: DocumentStore,
}

fn ensure_self_or_admin(actor: &User, email: &str) -> ApiResult<()> {
    if actor.role.is_admin() || actor.email == email {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "You do not have permission to view these requests".to_string(),
        ))
    }
}

impl WorkflowService {
    pub fn new(
        requests: RequestRepository,
        archives: ArchiveRepository,
        users: UserRepository,
        documents: DocumentStore,
    ) -> Self {
        Self {
            requests,
            archives,
            users,
            documents,
        }
    }

    /// Create a request pending the director
    ///
    /// The optional payment mandate is stored first and removed again if
    /// the insert fails.
    #[instrument(skip(self, agent, form, sepa), fields(agent = %agent.email))]
    pub async fn submit(
        &self,
        agent: &User,
        form: &HashMap<String, String>,
        sepa: Option<UploadedDocument>,
    ) -> ApiResult<RequestRecord> {
        if !matches!(agent.role, Role::Comercial | Role::Admin) {
            return Err(ApiError::Forbidden(
                "Only commercial agents can submit requests".to_string(),
            ));
        }

        if let Some(document) = &sepa {
            crate::documents::validate_extension(&document.filename)?;
        }
        let mut client = ClientData::from_form(form, None).map_err(ApiError::Validation)?;

        let stored = match &sepa {
            Some(document) => Some(
                self.documents
                    .save(&document.filename, &document.bytes)
                    .await?,
            ),
            None => None,
        };
        if let Some(stored) = &stored {
            client
                .documents
                .insert("sepa".to_string(), Some(stored.url.clone()));
        }

        let record = RequestRecord::submitted(agent.id, client, Utc::now());
        if let Err(e) = self.requests.create(&record).await {
            if let Some(stored) = &stored {
                self.documents.remove(&stored.url).await;
            }
            return Err(e.into());
        }

        info!("Request {} submitted for client {}", record.id, record.client.name);
        Ok(record)
    }

    /// Apply the actor's approval or rejection to a request
    ///
    /// The request row stays locked until the decision is committed, so a
    /// concurrent decision sees the advanced state.
    #[instrument(skip(self, actor, input), fields(actor = %actor.email, role = %actor.role))]
    pub async fn decide(
        &self,
        actor: &User,
        id: Uuid,
        input: &DecisionPayload,
    ) -> ApiResult<RequestRecord> {
        let mut tx = self.requests.begin().await?;

        let mut record = self
            .requests
            .find_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

        let state = machine::decide(&mut record, actor.role, input, Utc::now()).map_err(|e| {
            warn!("Decision on request {} refused: {}", id, e);
            e
        })?;

        self.requests.update(&mut tx, &record).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        info!("Request {} moved to {}", id, state);
        Ok(record)
    }

    /// Requests waiting on `role`; callers may only see their own queue
    /// unless they are administrators
    pub async fn pending_for_role(&self, actor: &User, role: Role) -> ApiResult<Vec<RequestRecord>> {
        if actor.role != role && !actor.role.is_admin() {
            return Err(ApiError::Forbidden(
                "You do not have permission to view this queue".to_string(),
            ));
        }

        let stage = Stage::for_role(role).ok_or_else(|| {
            ApiError::BadRequest(format!("Role {} has no approval queue", role))
        })?;

        let requests = self.requests.find_by_state(stage.pending_state()).await?;
        info!("Found {} requests pending for {}", requests.len(), role);
        Ok(requests)
    }

    /// Requests submitted by the user with `email`
    pub async fn requests_for_agent(
        &self,
        actor: &User,
        email: &str,
    ) -> ApiResult<Vec<RequestRecord>> {
        ensure_self_or_admin(actor, email)?;

        let agent = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(self.requests.find_by_owner(agent.id).await?)
    }

    /// Pending, completed and rejected counts for the caller's requests
    pub async fn summary_for_agent(&self, agent: &User) -> ApiResult<RequestSummary> {
        let counts = self.requests.count_by_state_for_owner(agent.id).await?;
        let archived = self.archives.count_for_email(&agent.email).await?;
        Ok(RequestSummary::from_counts(&counts, archived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: String::new(),
            full_name: "Test".to_string(),
            role,
            active: true,
            last_login: None,
            created_at: Utc::now(),
            is_temporary_password: false,
        }
    }

    #[test]
    fn test_self_or_admin() {
        let agent = user(Role::Comercial, "ana@example.com");
        assert!(ensure_self_or_admin(&agent, "ana@example.com").is_ok());
        assert!(matches!(
            ensure_self_or_admin(&agent, "otro@example.com"),
            Err(ApiError::Forbidden(_))
        ));

        let admin = user(Role::Admin, "admin@example.com");
        assert!(ensure_self_or_admin(&admin, "ana@example.com").is_ok());
    }
}
