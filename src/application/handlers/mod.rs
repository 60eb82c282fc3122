//! Application handlers.
//!
//! Command handlers that orchestrate domain operations through the ports.

pub mod planning;

pub use planning::{
    LegacyPlanRequest, PlanActionCommand, PlanActionHandler, PlanActionResult,
    PlanSessionManager, PlanningContext, RecordActionOutcomeCommand, RecordActionOutcomeHandler,
    RecordActionOutcomeResult, SelectionSource, SessionScope, SubGoalDecomposer, TenantContext,
    TreeSearchEngine,
};
