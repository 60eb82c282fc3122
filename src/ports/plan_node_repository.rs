//! Plan node repository port.
//!
//! The search tree lives in the store, not in memory: parent/child edges
//! are resolved through these queries so a session can be resumed after a
//! process restart.

use crate::domain::foundation::{DomainError, PlanNodeId, PlanSessionId};
use crate::domain::planning::PlanNode;
use async_trait::async_trait;

/// Repository port for search tree nodes.
#[async_trait]
pub trait PlanNodeRepository: Send + Sync {
    /// Save a new node.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, node: &PlanNode) -> Result<(), DomainError>;

    /// Update status and scores of an existing node.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if node doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, node: &PlanNode) -> Result<(), DomainError>;

    /// Find a node by its ID.
    async fn find_by_id(&self, id: &PlanNodeId) -> Result<Option<PlanNode>, DomainError>;

    /// All nodes of a session, ordered by depth then creation order.
    async fn find_by_session(&self, session_id: &PlanSessionId)
        -> Result<Vec<PlanNode>, DomainError>;

    /// Direct children of a node, ordered by total score descending
    /// (creation order among equal scores).
    async fn find_children(&self, parent_id: &PlanNodeId) -> Result<Vec<PlanNode>, DomainError>;
}
