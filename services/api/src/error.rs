//! Custom error types for the API service

use auth::AuthError;
use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

use crate::workflow::machine::WorkflowError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Already classified by the authenticator; rendered unchanged
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Bad request with message
    #[error("{0}")]
    BadRequest(String),

    /// Malformed payload
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Internal server error
    #[error("{0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => e.status_code(),
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotPendingForRole { .. } => ApiError::Forbidden(err.to_string()),
            WorkflowError::MissingBrandsOrTariff
            | WorkflowError::MissingPaymentTerm
            | WorkflowError::NotFullyApproved => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Auth(err) => return err.into_response(),
            other => other,
        };

        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!("API error: {}", err);
        }

        let body = Json(json!({
            "error": err.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
