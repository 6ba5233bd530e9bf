//! Custom error type for authentication and user management

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

/// Authentication and authorization failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email, wrong password or inactive account; deliberately
    /// indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token failed signature, expiry or format checks
    #[error("Invalid token")]
    InvalidToken,

    /// Token is valid but its subject no longer exists
    #[error("User not found")]
    UnknownSubject,

    /// Token subject has been deactivated
    #[error("Inactive user")]
    InactiveUser,

    /// Current password supplied to a password change did not match
    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// Caller is authenticated but not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Target user does not exist
    #[error("{0}")]
    NotFound(String),

    /// Storage failure
    #[error("{0}")]
    Database(#[from] DatabaseError),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::UnknownSubject
            | AuthError::InactiveUser
            | AuthError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for AuthError {
    fn from(rejection: FormRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AuthError {
    fn from(rejection: PathRejection) -> Self {
        AuthError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Authentication service error: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
