//! Tenancy configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::TenantId;

/// Tenancy configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenancyConfig {
    /// Tenant used by requests that name none
    pub default_tenant: Option<String>,
}

impl TenancyConfig {
    /// Configured default tenants, empty when none is set.
    pub fn tenants(&self) -> Vec<TenantId> {
        self.default_tenant
            .as_deref()
            .and_then(|id| TenantId::new(id).ok())
            .into_iter()
            .collect()
    }

    /// Validate tenancy configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(id) = &self.default_tenant {
            TenantId::new(id.as_str()).map_err(|e| ValidationError::InvalidTenant(e.to_string()))?;
        }
        Ok(())
    }
}
