//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the planner to external systems:
//! - `memory` - In-process store and static tenant list (tests, local runs)
//! - `postgres` - PostgreSQL store and tenant table

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryPlanStore, StaticTenantDirectory};
pub use postgres::{PostgresPlanNodeRepository, PostgresPlanSessionRepository, PostgresTenantDirectory};
