//! Domain layer containing planner logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `planning` - Belief estimation, action generation and scoring, tree/session aggregates

pub mod foundation;
pub mod planning;
