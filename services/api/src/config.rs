//! Application configuration
//!
//! Everything is read once at startup and handed to the components that
//! need it.

use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use auth::jwt::JwtConfig;
use common::{database::DatabaseConfig, telemetry::TelemetryConfig};
use serde::Deserialize;

/// Default upload cap: 20 MiB
const DEFAULT_UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma separated list of allowed CORS origins
    cors_origins: String,
}

impl ServerConfig {
    /// Load from `SERVER_HOST`, `SERVER_PORT` and `SERVER_CORS_ORIGINS`
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default(
                "cors_origins",
                "http://localhost:3000,http://localhost:5173",
            )?
            .add_source(config::Environment::with_prefix("SERVER").try_parsing(true))
            .build()
            .context("Failed to load server configuration")?;

        settings
            .try_deserialize()
            .context("Invalid server configuration")
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed CORS origins
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Document upload settings
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded documents are written to
    pub dir: PathBuf,
    /// Public URL prefix the directory is served under
    pub url_prefix: String,
    /// Maximum accepted request body for uploads
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads/documents"),
            url_prefix: "/uploads/documents".to_string(),
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        }
    }
}

impl UploadConfig {
    /// Create a new UploadConfig from environment variables
    ///
    /// # Environment Variables
    /// - `UPLOAD_DIR`: Storage directory (default: uploads/documents)
    /// - `UPLOAD_MAX_BYTES`: Body size limit (default: 20 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.dir);

        let max_bytes = env::var("UPLOAD_MAX_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_bytes);

        Self {
            dir,
            url_prefix: defaults.url_prefix,
            max_bytes,
        }
    }
}

/// Administrator account created at startup when missing
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BootstrapAdmin {
    /// Read `BOOTSTRAP_ADMIN_EMAIL`, `BOOTSTRAP_ADMIN_PASSWORD` and
    /// `BOOTSTRAP_ADMIN_NAME`; `None` unless both email and password are set
    pub fn from_env() -> Option<Self> {
        let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;
        let full_name =
            env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrador".to_string());

        Some(Self {
            email,
            full_name,
            password,
        })
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            telemetry: TelemetryConfig::from_env(),
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            server: ServerConfig::from_env()?,
            upload: UploadConfig::from_env(),
            bootstrap_admin: BootstrapAdmin::from_env(),
        })
    }
}
