//! Credential store and authenticator
//!
//! Users authenticate with email and password at `POST /token` and receive
//! an HS256 bearer token. [`middleware::auth_middleware`] verifies that
//! token on every protected request, re-reading the user so role changes
//! and deactivation take effect immediately.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use middleware::{CurrentUser, auth_middleware};
pub use models::{Role, User};
pub use service::AuthService;
