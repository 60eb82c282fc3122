//! Planning handlers.
//!
//! - `PlanSessionManager` - get-or-create of conversation sessions
//! - `TreeSearchEngine` - frontier expansion and leaf selection
//! - `SubGoalDecomposer` - compound requests into ordered steps
//! - `PlanActionHandler` - the planning entry points (structured and legacy)
//! - `RecordActionOutcomeHandler` - belief updates after execution

mod decompose_request;
mod legacy_request;
mod plan_action;
mod record_outcome;
mod session_manager;
mod tree_search;

pub use decompose_request::SubGoalDecomposer;
pub use legacy_request::{LegacyCart, LegacyCartItem, LegacyCatalogItem, LegacyPlanRequest, LooseAmount};
pub use plan_action::{
    PlanActionCommand, PlanActionHandler, PlanActionResult, SelectionSource, TenantContext,
};
pub use record_outcome::{
    RecordActionOutcomeCommand, RecordActionOutcomeHandler, RecordActionOutcomeResult,
};
pub use session_manager::{PlanSessionManager, SessionScope};
pub use tree_search::{PlanningContext, TreeSearchEngine};
