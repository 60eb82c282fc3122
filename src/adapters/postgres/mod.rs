//! PostgreSQL adapters - Database implementations for the planner ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresPlanSessionRepository` - Planning sessions with JSONB belief snapshots
//! - `PostgresPlanNodeRepository` - Search tree nodes, ordered by an insert sequence
//! - `PostgresTenantDirectory` - Default tenant lookup

mod plan_node_repository;
mod plan_session_repository;
mod tenant_directory;

pub use plan_node_repository::PostgresPlanNodeRepository;
pub use plan_session_repository::PostgresPlanSessionRepository;
pub use tenant_directory::PostgresTenantDirectory;

use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Opens a connection pool sized by `config`, applying migrations when
/// `run_migrations` is set.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| db_error(&format!("Failed to connect to database: {}", e)))?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| db_error(&format!("Failed to run migrations: {}", e)))?;
        tracing::info!("database migrations applied");
    }

    Ok(pool)
}

fn db_error(msg: &str) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, msg.to_string())
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| db_error(&format!("Failed to get {}: {}", name, e)))
}
