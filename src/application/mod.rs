//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates the planning domain and coordinates between ports.
//! Handlers own `Arc<dyn Port>` collaborators and never touch adapters directly.

pub mod handlers;

pub use handlers::{
    LegacyPlanRequest, PlanActionCommand, PlanActionHandler, PlanActionResult,
    RecordActionOutcomeCommand, RecordActionOutcomeHandler, RecordActionOutcomeResult,
    SelectionSource, TenantContext,
};
