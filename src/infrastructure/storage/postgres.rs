//! PostgreSQL connection pool

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::domain::DomainError;

use super::migrations::run_migrations;

/// Connects to PostgreSQL and applies pending migrations when enabled
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let url = config.resolved_url().ok_or_else(|| {
        DomainError::configuration("database.url (or DATABASE_URL) is required")
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

    info!(max_connections = config.max_connections, "Connected to PostgreSQL");

    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    Ok(pool)
}

/// Maps a unique-constraint violation to `conflict`, everything else to a storage error
pub(crate) fn map_write_error(
    e: sqlx::Error,
    action: &str,
    conflict: impl FnOnce() -> DomainError,
) -> DomainError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return conflict();
        }
    }

    let msg = e.to_string();
    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        return conflict();
    }

    DomainError::storage(format!("Failed to {}: {}", action, e))
}
