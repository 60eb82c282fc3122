//! Planner error types.

use crate::domain::foundation::{DomainError, ErrorCode, PlanSessionId};

/// Errors surfaced by the planner's entry points.
///
/// Precondition failures (`NoActiveSession`, `NoTenantAvailable`) and
/// storage failures are not recovered locally; callers are expected to
/// report them as server errors. Data gaps (no candidates, no leaves) are
/// never errors, the planner falls back instead.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum PlannerError {
    #[error("No active planning session")]
    NoActiveSession,

    #[error("No tenant available to plan for")]
    NoTenantAvailable,

    #[error("Plan session not found: {0}")]
    SessionNotFound(PlanSessionId),

    #[error("Plan session expired: {0}")]
    SessionExpired(PlanSessionId),

    #[error("Invalid node transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(DomainError),
}

impl PlannerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PlannerError::NoActiveSession => ErrorCode::NoActiveSession,
            PlannerError::NoTenantAvailable => ErrorCode::TenantNotFound,
            PlannerError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            PlannerError::SessionExpired(_) => ErrorCode::SessionExpired,
            PlannerError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            PlannerError::InvalidRequest(_) => ErrorCode::ValidationFailed,
            PlannerError::Storage(err) => err.code,
        }
    }
}

impl From<DomainError> for PlannerError {
    fn from(err: DomainError) -> Self {
        PlannerError::Storage(err)
    }
}
