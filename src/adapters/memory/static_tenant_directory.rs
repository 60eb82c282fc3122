//! Tenant directory backed by a fixed list.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, TenantId};
use crate::ports::TenantDirectory;

/// Tenant directory over a list configured at startup.
///
/// The first tenant is the default. An empty list models an environment
/// with no tenants configured.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantDirectory {
    tenants: Vec<TenantId>,
}

impl StaticTenantDirectory {
    pub fn new(tenants: Vec<TenantId>) -> Self {
        Self { tenants }
    }

    /// Directory with a single tenant.
    pub fn single(tenant: TenantId) -> Self {
        Self::new(vec![tenant])
    }

    /// Directory with no tenants.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn default_tenant(&self) -> Result<Option<TenantId>, DomainError> {
        Ok(self.tenants.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_tenant_is_default() {
        let directory = StaticTenantDirectory::new(vec![
            TenantId::new("a").unwrap(),
            TenantId::new("b").unwrap(),
        ]);
        assert_eq!(
            directory.default_tenant().await.unwrap(),
            Some(TenantId::new("a").unwrap())
        );
    }

    #[tokio::test]
    async fn empty_directory_has_no_default() {
        assert_eq!(StaticTenantDirectory::empty().default_tenant().await.unwrap(), None);
    }
}
