//! JWT service for token generation and validation
//!
//! Tokens are signed with HS256 using a shared secret. Each access token
//! embeds the user's email as subject and their role, and expires after a
//! configurable lifetime.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::AuthError;
use crate::models::{Role, User};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 30 minutes)
    pub access_token_expiry: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Secret for signing tokens (required, at least 32 bytes)
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 1800)
    pub fn from_env() -> Result<Self, AuthError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| {
            AuthError::Internal("JWT_SECRET environment variable not set".to_string())
        })?;

        if secret.len() < 32 {
            return Err(AuthError::Internal(
                "JWT_SECRET must be at least 32 bytes long".to_string(),
            ));
        }

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800);

        Ok(JwtConfig {
            secret,
            access_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// User role
    pub rol: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: u64,
}

fn now_secs() -> Result<u64, AuthError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Internal(format!("Failed to get current time: {}", e)))
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        JwtService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_token_expiry: config.access_token_expiry,
        }
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = now_secs()?;
        let claims = Claims {
            sub: user.email.clone(),
            rol: user.role,
            iat: now,
            exp: now + self.access_token_expiry,
        };

        self.encode_claims(&claims)
    }

    /// Sign arbitrary claims
    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate a token and return the claims
    ///
    /// Any decoding failure (bad signature, expired, malformed) is reported
    /// as [`AuthError::InvalidToken`].
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn service(secret: &str) -> JwtService {
        JwtService::new(&JwtConfig {
            secret: secret.to_string(),
            access_token_expiry: 1800,
        })
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "director@example.com".to_string(),
            password_hash: String::new(),
            full_name: "Director".to_string(),
            role,
            active: true,
            last_login: None,
            created_at: Utc::now(),
            is_temporary_password: false,
        }
    }

    #[test]
    fn test_token_embeds_email_and_role() {
        let jwt = service(SECRET);
        let token = jwt.generate_access_token(&user(Role::Director)).unwrap();

        let claims = jwt.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "director@example.com");
        assert_eq!(claims.rol, Role::Director);
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = service(SECRET);
        let now = now_secs().unwrap();
        let token = jwt
            .encode_claims(&Claims {
                sub: "director@example.com".to_string(),
                rol: Role::Director,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        assert!(matches!(
            jwt.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = service("another-secret-that-is-also-long-enough")
            .generate_access_token(&user(Role::Admin))
            .unwrap();

        assert!(matches!(
            service(SECRET).validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(matches!(
            service(SECRET).validate_token("not.a.token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env() {
        unsafe {
            std::env::set_var("JWT_SECRET", SECRET);
            std::env::remove_var("JWT_ACCESS_TOKEN_EXPIRY");
        }
        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.access_token_expiry, 1800);
        assert!(!format!("{:?}", config).contains(SECRET));

        unsafe {
            std::env::set_var("JWT_SECRET", "short");
        }
        assert!(JwtConfig::from_env().is_err());

        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
        assert!(JwtConfig::from_env().is_err());
    }
}
