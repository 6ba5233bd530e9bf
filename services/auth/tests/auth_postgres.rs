//! Authenticator and user administration against a real PostgreSQL database
//!
//! Point `DATABASE_URL` at a disposable database and run with `--ignored`.

use argon2::Params;
use auth::{
    AuthError, AuthService, Role,
    jwt::{JwtConfig, JwtService},
    models::{CreateUserRequest, PasswordChange, UpdateUserRequest},
    password::PasswordHasher,
    repositories::UserRepository,
};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use uuid::Uuid;

async fn service() -> AuthService {
    let pool = init_pool(&DatabaseConfig::from_env().unwrap()).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let jwt = JwtService::new(&JwtConfig {
        secret: "auth-postgres-test-secret-0123456789abcdef".to_string(),
        access_token_expiry: 1800,
    });
    let hasher = PasswordHasher::with_params(Params::new(1024, 1, 1, None).unwrap());

    AuthService::new(UserRepository::new(pool), jwt, hasher)
}

fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_temporary_password_lifecycle() {
    let auth = service().await;
    let email = unique_email();

    let created = auth
        .create_user(CreateUserRequest {
            email: email.clone(),
            full_name: "Lucía Comercial".to_string(),
            role: Role::Comercial,
            active: true,
        })
        .await
        .unwrap();
    assert_eq!(created.temporary_password.chars().count(), 12);
    assert!(created.user.is_temporary_password);

    let token = auth
        .authenticate(&email, &created.temporary_password)
        .await
        .unwrap();
    assert_eq!(token.token_type, "bearer");
    assert_eq!(token.user_role, Role::Comercial);
    assert!(token.is_temporary_password);

    let me = auth.verify(&token.access_token).await.unwrap();
    assert_eq!(me.email, email);
    assert!(me.last_login.is_some());

    let err = auth
        .change_password(
            &me,
            PasswordChange {
                current_password: "not-the-password".to_string(),
                new_password: "a-brand-new-password".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::IncorrectPassword));

    auth.change_password(
        &me,
        PasswordChange {
            current_password: created.temporary_password.clone(),
            new_password: "a-brand-new-password".to_string(),
        },
    )
    .await
    .unwrap();

    let token = auth
        .authenticate(&email, "a-brand-new-password")
        .await
        .unwrap();
    assert!(!token.is_temporary_password);
    assert!(matches!(
        auth.authenticate(&email, &created.temporary_password).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_deactivation_applies_to_issued_tokens() {
    let auth = service().await;
    let email = unique_email();

    let created = auth
        .create_user(CreateUserRequest {
            email: email.clone(),
            full_name: "Director Temporal".to_string(),
            role: Role::Director,
            active: true,
        })
        .await
        .unwrap();
    let token = auth
        .authenticate(&email, &created.temporary_password)
        .await
        .unwrap();

    auth.update_user(
        created.user.id,
        UpdateUserRequest {
            active: Some(false),
            ..UpdateUserRequest::default()
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        auth.verify(&token.access_token).await,
        Err(AuthError::InactiveUser)
    ));
    assert!(matches!(
        auth.authenticate(&email, &created.temporary_password).await,
        Err(AuthError::InvalidCredentials)
    ));

    auth.delete_user(created.user.id).await.unwrap();
    assert!(matches!(
        auth.verify(&token.access_token).await,
        Err(AuthError::UnknownSubject)
    ));
    assert!(matches!(
        auth.delete_user(created.user.id).await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_duplicate_email_and_profile_rules() {
    let auth = service().await;
    let email = unique_email();
    let request = CreateUserRequest {
        email: email.clone(),
        full_name: "Pedidos Uno".to_string(),
        role: Role::Pedidos,
        active: true,
    };

    let created = auth.create_user(request.clone()).await.unwrap();
    assert!(matches!(
        auth.create_user(request).await,
        Err(AuthError::Validation(_))
    ));

    let token = auth
        .authenticate(&email, &created.temporary_password)
        .await
        .unwrap();
    let me = auth.verify(&token.access_token).await.unwrap();

    let err = auth
        .update_profile(
            &me,
            UpdateUserRequest {
                role: Some(Role::Admin),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden(_)));

    let updated = auth
        .update_profile(
            &me,
            UpdateUserRequest {
                full_name: Some("Pedidos Renombrado".to_string()),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Pedidos Renombrado");
    assert_eq!(updated.role, Role::Pedidos);

    let bootstrap = unique_email();
    assert!(
        auth.ensure_bootstrap_admin(&bootstrap, "Admin", "bootstrap-password")
            .await
            .unwrap()
    );
    assert!(
        !auth
            .ensure_bootstrap_admin(&bootstrap, "Admin", "bootstrap-password")
            .await
            .unwrap()
    );
}
