//! Thought Planner - next-action planning for conversational commerce agents
//!
//! Estimates a belief over what the customer wants, searches a persisted
//! tree of candidate actions scored on utility, risk and explainability,
//! and returns the best next action together with the alternatives it
//! considered.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
