//! Tenant directory port.
//!
//! Callers that do not name a tenant get the directory's default one.

use crate::domain::foundation::{DomainError, TenantId};
use async_trait::async_trait;

/// Resolves the tenant to plan for when the caller gives none.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// The tenant used when a request carries no tenant.
    ///
    /// Returns `None` when no tenant is configured at all.
    async fn default_tenant(&self) -> Result<Option<TenantId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_directory_is_object_safe() {
        fn _accepts_dyn(_directory: &dyn TenantDirectory) {}
    }
}
