//! In-memory adapters for the storage and tenancy ports.

mod in_memory_plan_store;
mod static_tenant_directory;

pub use in_memory_plan_store::InMemoryPlanStore;
pub use static_tenant_directory::StaticTenantDirectory;
