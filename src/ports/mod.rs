//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the planner and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PlanSessionRepository` - Planning sessions, resumable by conversation
//! - `PlanNodeRepository` - Search tree nodes, linked by id
//!
//! ## Tenancy Ports
//!
//! - `TenantDirectory` - Default tenant for requests that name none

mod plan_node_repository;
mod plan_session_repository;
mod tenant_directory;

pub use plan_node_repository::PlanNodeRepository;
pub use plan_session_repository::PlanSessionRepository;
pub use tenant_directory::TenantDirectory;
