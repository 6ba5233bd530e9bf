//! Application state shared across handlers

use auth::{AuthService, jwt::JwtService, password::PasswordHasher, repositories::UserRepository};
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    archive::ArchiveService,
    documents::DocumentStore,
    repositories::{ArchiveRepository, RequestRepository},
    workflow::WorkflowService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub workflow: WorkflowService,
    pub archive: ArchiveService,
    pub documents: DocumentStore,
}

impl AppState {
    /// Wire every service onto one pool
    pub fn new(
        pool: PgPool,
        jwt: JwtService,
        hasher: PasswordHasher,
        documents: DocumentStore,
    ) -> Self {
        let users = UserRepository::new(pool.clone());
        let requests = RequestRepository::new(pool.clone());
        let archives = ArchiveRepository::new(pool.clone());

        Self {
            auth: AuthService::new(users.clone(), jwt, hasher),
            workflow: WorkflowService::new(
                requests.clone(),
                archives.clone(),
                users,
                documents.clone(),
            ),
            archive: ArchiveService::new(requests, archives),
            documents,
        }
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
