//! Login payloads

use serde::{Deserialize, Serialize};

use super::Role;

/// Form-encoded credentials posted to `/token`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_role: Role,
    pub user_email: String,
    pub user_name: String,
    pub is_temporary_password: bool,
}
