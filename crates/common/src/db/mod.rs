//! Database layer for PDFHub
//!
//! Provides:
//! - SeaORM entity models
//! - `PgStore`, the PostgreSQL catalog backend
//! - Connection pool management with startup retry
//! - Schema migrations

pub mod models;
mod repository;

pub use repository::PgStore;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use backoff::ExponentialBackoff;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sqlx::migrate::Migrator;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    pub primary: DatabaseConnection,
}

impl DbPool {
    /// Connect using the configured URL, retrying with exponential backoff
    /// until `connect_retry_secs` have elapsed.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| AppError::Configuration {
            message: "database.url is not set".to_string(),
        })?;

        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(url);
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(config.connect_retry_secs)),
            ..ExponentialBackoff::default()
        };

        let primary = backoff::future::retry(policy, || {
            let opts = opts.clone();
            async move {
                Database::connect(opts).await.map_err(|e| {
                    warn!(error = %e, "Database not reachable, retrying");
                    backoff::Error::transient(e)
                })
            }
        })
        .await
        .map_err(|e| AppError::DatabaseConnection {
            message: format!("Failed to connect: {}", e),
        })?;

        info!("Database connection established");

        Ok(Self { primary })
    }

    /// Apply pending migrations from `dir`
    pub async fn migrate(&self, dir: &str) -> Result<()> {
        let migrator = Migrator::new(Path::new(dir))
            .await
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to load migrations from {}: {}", dir, e),
            })?;

        migrator
            .run(self.primary.get_postgres_connection_pool())
            .await
            .map_err(|e| AppError::Internal {
                message: format!("Migration failed: {}", e),
            })?;

        info!(dir, "Migrations applied");
        Ok(())
    }

    /// Get the connection (reads and writes share the primary)
    pub fn conn(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}
