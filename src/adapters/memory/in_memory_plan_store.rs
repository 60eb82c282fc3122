//! In-memory plan store.
//!
//! Implements both `PlanSessionRepository` and `PlanNodeRepository` over
//! process memory. Useful for:
//! - Tests and local development
//! - Single-process deployments that accept losing trees on restart
//!
//! Nodes are kept in insertion order, which doubles as creation order for
//! the ordering guarantees the ports promise.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, PlanNodeId, PlanSessionId, TenantId,
};
use crate::domain::planning::{PlanNode, PlanSession};
use crate::ports::{PlanNodeRepository, PlanSessionRepository};

#[derive(Default)]
struct StoreState {
    sessions: HashMap<PlanSessionId, PlanSession>,
    nodes: Vec<PlanNode>,
}

/// In-memory implementation of the plan storage ports.
///
/// Thread-safe via internal `Mutex`. Does not persist data across restarts.
#[derive(Default)]
pub struct InMemoryPlanStore {
    state: Mutex<StoreState>,
}

impl InMemoryPlanStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> usize {
        self.lock().map(|s| s.sessions.len()).unwrap_or(0)
    }

    /// Number of stored nodes across all sessions.
    pub fn node_count(&self) -> usize {
        self.lock().map(|s| s.nodes.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, DomainError> {
        self.state.lock().map_err(|_| {
            DomainError::new(ErrorCode::InternalError, "Plan store lock poisoned")
        })
    }
}

#[async_trait]
impl PlanSessionRepository for InMemoryPlanStore {
    async fn save(&self, session: &PlanSession) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        state.sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &PlanSession) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        match state.sessions.get_mut(session.id()) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Plan session not found: {}", session.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &PlanSessionId) -> Result<Option<PlanSession>, DomainError> {
        Ok(self.lock()?.sessions.get(id).cloned())
    }

    async fn find_latest_by_conversation(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> Result<Option<PlanSession>, DomainError> {
        let state = self.lock()?;
        let latest = state
            .sessions
            .values()
            .filter(|s| s.tenant_id() == tenant_id && s.conversation_id() == Some(conversation_id))
            .max_by_key(|s| (*s.updated_at(), *s.created_at()))
            .cloned();
        Ok(latest)
    }
}

#[async_trait]
impl PlanNodeRepository for InMemoryPlanStore {
    async fn save(&self, node: &PlanNode) -> Result<(), DomainError> {
        self.lock()?.nodes.push(node.clone());
        Ok(())
    }

    async fn update(&self, node: &PlanNode) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        match state.nodes.iter_mut().find(|n| n.id() == node.id()) {
            Some(existing) => {
                *existing = node.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::NodeNotFound,
                format!("Plan node not found: {}", node.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &PlanNodeId) -> Result<Option<PlanNode>, DomainError> {
        Ok(self.lock()?.nodes.iter().find(|n| n.id() == id).cloned())
    }

    async fn find_by_session(
        &self,
        session_id: &PlanSessionId,
    ) -> Result<Vec<PlanNode>, DomainError> {
        let mut nodes: Vec<PlanNode> = self
            .lock()?
            .nodes
            .iter()
            .filter(|n| n.session_id() == session_id)
            .cloned()
            .collect();
        // Stable: insertion order is kept within a depth.
        nodes.sort_by_key(|n| n.depth());
        Ok(nodes)
    }

    async fn find_children(&self, parent_id: &PlanNodeId) -> Result<Vec<PlanNode>, DomainError> {
        let mut children: Vec<PlanNode> = self
            .lock()?
            .nodes
            .iter()
            .filter(|n| n.parent_id() == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| b.total_score().total_cmp(&a.total_score()));
        Ok(children)
    }
}
