//! Plan session repository port.
//!
//! Defines the contract for persisting and retrieving PlanSession
//! aggregates. The planner resumes sessions by conversation, so lookups by
//! conversation must return the most recently updated session.

use crate::domain::foundation::{ConversationId, DomainError, PlanSessionId, TenantId};
use crate::domain::planning::PlanSession;
use async_trait::async_trait;

/// Repository port for PlanSession aggregate persistence.
///
/// Failures are reported through `DomainError` and are never retried by
/// the planner.
#[async_trait]
pub trait PlanSessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &PlanSession) -> Result<(), DomainError>;

    /// Update an existing session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &PlanSession) -> Result<(), DomainError>;

    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &PlanSessionId) -> Result<Option<PlanSession>, DomainError>;

    /// Find the most recently updated session of a conversation.
    ///
    /// Expired sessions are returned too; the caller decides reuse.
    async fn find_latest_by_conversation(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> Result<Option<PlanSession>, DomainError>;
}
