//! Authenticator and user administration
//!
//! [`AuthService`] checks credentials, issues and verifies access tokens, and
//! implements the user management operations exposed under `/users`. Role
//! checks for the admin-only operations are done by the route handlers via
//! [`require_admin`].

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    jwt::JwtService,
    models::{
        CreateUserRequest, CreatedUserResponse, NewUser, PasswordChange, Role, TokenResponse,
        UpdateUserRequest, User, UserChanges, UserResponse,
    },
    password::{PasswordHasher, generate_temporary_password},
    repositories::UserRepository,
    validation::{validate_email, validate_full_name, validate_password},
};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    jwt: JwtService,
    hasher: PasswordHasher,
}

/// Resolve a login attempt against the stored user, if any
///
/// Unknown emails, wrong passwords and inactive accounts all collapse into
/// [`AuthError::InvalidCredentials`]. An unknown email is verified against
/// the hasher's dummy hash so it costs as much as a wrong password.
pub fn check_credentials(
    user: Option<User>,
    password: &str,
    hasher: &PasswordHasher,
) -> AuthResult<User> {
    let stored_hash = user
        .as_ref()
        .map_or(hasher.dummy_hash(), |u| u.password_hash.as_str());
    let verified = hasher.verify(password, stored_hash);

    let Some(user) = user else {
        return Err(AuthError::InvalidCredentials);
    };

    if !verified {
        return Err(AuthError::InvalidCredentials);
    }

    if !user.active {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Resolve the user a verified token points at
pub fn check_token_subject(user: Option<User>) -> AuthResult<User> {
    let user = user.ok_or(AuthError::UnknownSubject)?;
    if !user.active {
        return Err(AuthError::InactiveUser);
    }
    Ok(user)
}

/// Fail with [`AuthError::Forbidden`] unless `user` is an administrator
pub fn require_admin(user: &User, action: &str) -> AuthResult<()> {
    if user.role.is_admin() {
        Ok(())
    } else {
        warn!(
            "User {} with role {} attempted to {}",
            user.email, user.role, action
        );
        Err(AuthError::Forbidden(format!(
            "You do not have permission to {}",
            action
        )))
    }
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: UserRepository, jwt: JwtService, hasher: PasswordHasher) -> Self {
        Self { users, jwt, hasher }
    }

    /// Check an email/password pair and issue an access token
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> AuthResult<TokenResponse> {
        let stored = self.users.find_by_email(email.trim()).await?;
        let user = check_credentials(stored, password, &self.hasher).map_err(|e| {
            warn!("Failed login attempt for {}", email);
            e
        })?;

        self.users.record_login(user.id, Utc::now()).await?;
        let access_token = self.jwt.generate_access_token(&user)?;

        info!("User {} logged in", user.email);

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            user_role: user.role,
            user_email: user.email,
            user_name: user.full_name,
            is_temporary_password: user.is_temporary_password,
        })
    }

    /// Validate a bearer token and load the current state of its subject
    ///
    /// The user is re-read on every call so role changes and deactivation
    /// apply to tokens issued before them.
    pub async fn verify(&self, token: &str) -> AuthResult<User> {
        let claims = self.jwt.validate_token(token)?;
        let user = self.users.find_by_email(&claims.sub).await?;
        check_token_subject(user)
    }

    /// List every user
    pub async fn list_users(&self) -> AuthResult<Vec<UserResponse>> {
        let users = self.users.list().await?;
        info!("Found {} users", users.len());
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Create a user with a generated temporary password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> AuthResult<CreatedUserResponse> {
        let email = request.email.trim().to_string();
        validate_email(&email).map_err(AuthError::Validation)?;
        validate_full_name(&request.full_name).map_err(AuthError::Validation)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Validation("Email already registered".to_string()));
        }

        let temporary_password = generate_temporary_password();
        let new_user = NewUser {
            email,
            password_hash: self.hasher.hash(&temporary_password)?,
            full_name: request.full_name.trim().to_string(),
            role: request.role,
            active: request.active,
            is_temporary_password: true,
        };

        let user = self.users.create(&new_user).await.map_err(|e| {
            if e.is_unique_violation() {
                AuthError::Validation("Email already registered".to_string())
            } else {
                AuthError::Database(e)
            }
        })?;

        info!("User created: {} ({})", user.email, user.role);

        Ok(CreatedUserResponse {
            user: UserResponse::from(user),
            temporary_password,
        })
    }

    /// Update any user (admin)
    #[instrument(skip(self, request))]
    pub async fn update_user(
        &self,
        id: Uuid,
        request: UpdateUserRequest,
    ) -> AuthResult<UserResponse> {
        let changes = self.changes_from(request)?;
        let user = self
            .users
            .update(id, &changes)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        info!("User updated: {}", user.id);
        Ok(UserResponse::from(user))
    }

    /// Update the caller's own profile; role and active flag are off limits
    pub async fn update_profile(
        &self,
        me: &User,
        request: UpdateUserRequest,
    ) -> AuthResult<UserResponse> {
        if request.role.is_some() || request.active.is_some() {
            return Err(AuthError::Forbidden(
                "You do not have permission to change role or active status".to_string(),
            ));
        }

        self.update_user(me.id, request).await
    }

    /// Change the caller's password after checking the current one
    #[instrument(skip(self, me, change), fields(email = %me.email))]
    pub async fn change_password(&self, me: &User, change: PasswordChange) -> AuthResult<()> {
        if !self.hasher.verify(&change.current_password, &me.password_hash) {
            return Err(AuthError::IncorrectPassword);
        }
        validate_password(&change.new_password).map_err(AuthError::Validation)?;

        let changes = UserChanges {
            password_hash: Some(self.hasher.hash(&change.new_password)?),
            is_temporary_password: Some(false),
            last_login: Some(Utc::now()),
            ..UserChanges::default()
        };

        self.users
            .update(me.id, &changes)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        info!("Password changed for {}", me.email);
        Ok(())
    }

    /// Delete a user
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> AuthResult<()> {
        let deleted = self.users.delete(id).await.map_err(|e| {
            if e.is_foreign_key_violation() {
                AuthError::Validation("User still owns onboarding requests".to_string())
            } else {
                AuthError::Database(e)
            }
        })?;

        if !deleted {
            return Err(AuthError::NotFound("User not found".to_string()));
        }

        info!("User deleted: {}", id);
        Ok(())
    }

    /// Create the initial administrator unless the email is already taken
    ///
    /// Returns whether a user was created.
    pub async fn ensure_bootstrap_admin(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> AuthResult<bool> {
        if self.users.find_by_email(email).await?.is_some() {
            return Ok(false);
        }

        validate_email(email).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;

        let new_user = NewUser {
            email: email.to_string(),
            password_hash: self.hasher.hash(password)?,
            full_name: full_name.to_string(),
            role: Role::Admin,
            active: true,
            is_temporary_password: false,
        };
        self.users.create(&new_user).await?;

        info!("Bootstrap administrator {} created", email);
        Ok(true)
    }

    fn changes_from(&self, request: UpdateUserRequest) -> AuthResult<UserChanges> {
        if let Some(name) = &request.full_name {
            validate_full_name(name).map_err(AuthError::Validation)?;
        }

        let password_hash = match &request.password {
            Some(password) => {
                validate_password(password).map_err(AuthError::Validation)?;
                Some(self.hasher.hash(password)?)
            }
            None => None,
        };

        Ok(UserChanges {
            full_name: request.full_name.map(|n| n.trim().to_string()),
            role: request.role,
            active: request.active,
            is_temporary_password: password_hash.as_ref().map(|_| false),
            password_hash,
            last_login: None,
        })
    }
}
