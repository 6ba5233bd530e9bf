//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub is_temporary_password: bool,
}

/// New user row, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub is_temporary_password: bool,
}

/// Column changes applied by an update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub password_hash: Option<String>,
    pub is_temporary_password: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Payload for creating a user (admin only)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(rename = "nombre_completo")]
    pub full_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "activo", default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Payload for updating a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(rename = "nombre_completo")]
    pub full_name: Option<String>,
    #[serde(rename = "rol")]
    pub role: Option<Role>,
    #[serde(rename = "activo")]
    pub active: Option<bool>,
    pub password: Option<String>,
}

/// Payload for changing one's own password
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "nombre_completo")]
    pub full_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "activo")]
    pub active: bool,
    #[serde(rename = "ultimo_acceso")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(rename = "creado_en")]
    pub created_at: DateTime<Utc>,
    pub is_temporary_password: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            active: user.active,
            last_login: user.last_login,
            created_at: user.created_at,
            is_temporary_password: user.is_temporary_password,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

/// Response for a freshly created user; the temporary password is shown once
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUserResponse {
    pub user: UserResponse,
    pub temporary_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "director@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: "Director Comercial".to_string(),
            role: Role::Director,
            active: true,
            last_login: None,
            created_at: Utc::now(),
            is_temporary_password: false,
        };

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(json["rol"], "director");
        assert_eq!(json["nombre_completo"], "Director Comercial");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_create_user_request_defaults_to_active() {
        let payload: CreateUserRequest = serde_json::from_str(
            r#"{"email":"pedidos@example.com","nombre_completo":"Pedidos","rol":"pedidos"}"#,
        )
        .unwrap();
        assert!(payload.active);
        assert_eq!(payload.role, Role::Pedidos);
    }
}
