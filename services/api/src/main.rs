use anyhow::Result;
use api::{
    config::AppConfig,
    documents::DocumentStore,
    routes,
    state::AppState,
};
use auth::{jwt::JwtService, password::PasswordHasher};
use common::{
    database::{health_check, init_pool, run_migrations},
    telemetry::init_tracing,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Initialize logging
    init_tracing(&config.telemetry);

    info!("Starting onboarding API service");

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let state = AppState::new(
        pool,
        JwtService::new(&config.jwt),
        PasswordHasher::default(),
        DocumentStore::from_config(&config.upload),
    );

    if let Some(admin) = &config.bootstrap_admin {
        let created = state
            .auth
            .ensure_bootstrap_admin(&admin.email, &admin.full_name, &admin.password)
            .await?;
        if created {
            warn!(
                "Created bootstrap administrator {}; change its password after first login",
                admin.email
            );
        }
    }

    // Start the web server
    let app = routes::create_router(
        state,
        &config.server.cors_origins(),
        config.upload.max_bytes,
    );

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
