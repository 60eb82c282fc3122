//! Planning domain module.
//!
//! Pure decision logic of the action planner: belief estimation over the
//! customer's intent, candidate generation, multi-criteria scoring, and
//! the tree node / session aggregates the search persists.
//!
//! # Architecture
//!
//! - **Belief**: keyword detectors → normalized intent distribution
//! - **Generator**: belief → bounded list of candidate actions
//! - **Scorer**: action + state → bounded components, unbounded score
//! - **PlanNode / PlanSession**: records persisted through the ports
//!
//! Search and session orchestration live in the application layer, since
//! they need the storage ports.

pub mod action;
pub mod belief;
pub mod config;
pub mod decomposition;
pub mod errors;
pub mod generator;
pub mod node;
pub mod observation;
pub mod scorer;
pub mod session;

pub use action::*;
pub use belief::{
    estimate_initial_belief, update_belief, ActionOutcome, BeliefSnapshot, BeliefState, Intent,
    IntentDistribution, BELIEF_HISTORY_LIMIT,
};
pub use config::*;
pub use decomposition::*;
pub use errors::*;
pub use generator::*;
pub use node::*;
pub use observation::*;
pub use scorer::*;
pub use session::*;
