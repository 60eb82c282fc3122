//! PostgreSQL implementation of TenantDirectory.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::TenantDirectory;

use super::db_error;

/// Reads the default tenant from the `tenants` table.
///
/// The earliest-created active tenant is the default.
#[derive(Clone)]
pub struct PostgresTenantDirectory {
    pool: PgPool,
}

impl PostgresTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PostgresTenantDirectory {
    async fn default_tenant(&self) -> Result<Option<TenantId>, DomainError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM tenants
            WHERE active
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(&format!("Failed to fetch default tenant: {}", e)))?;

        row.map(|(id,)| TenantId::new(id).map_err(DomainError::from))
            .transpose()
    }
}
