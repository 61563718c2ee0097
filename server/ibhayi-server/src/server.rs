use std::sync::Arc;

use anyhow::{Context, Result};
use email_service::{EmailConfig, EmailService};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Main Ibhayi server state, shared by every handler.
#[derive(Clone)]
pub struct IbhayiServer {
    /// Server configuration
    pub config: ServerConfig,
    /// Postgres connection pool
    pub db_pool: PgPool,
    /// Email service instance
    pub email: Arc<EmailService>,
}

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Postgres connection string
    pub database_url: String,
    /// HS256 signing secret for JWTs
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub token_ttl_hours: i64,
    /// Directory for uploaded prescription PDFs
    pub upload_dir: String,
    /// Maximum pool connections
    pub max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "change-me-in-production".to_string());
        let token_ttl_hours = std::env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);
        let upload_dir =
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl_hours,
            upload_dir,
            max_connections,
        })
    }
}

impl IbhayiServer {
    /// Create a new server instance: connect the pool, run migrations, and
    /// load the email configuration.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;

        let email_config = EmailConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Email configuration error: {}", e))?;
        let email = Arc::new(EmailService::new(email_config));

        Ok(Self {
            config,
            db_pool,
            email,
        })
    }
}
