//! Search tree node.
//!
//! Nodes form an arena keyed by id: a node knows its parent's id and its
//! session's id, never holds references to other nodes. Children are
//! found by querying the store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, PlanNodeId, PlanSessionId, StateMachine, Timestamp,
};

use super::action::{Action, ScoredAction};

/// Lifecycle of a node in the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    /// Expanded; its children have been persisted
    Completed,
    /// Cut off by depth or score; never expanded
    Pruned,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Completed => "completed",
            NodeStatus::Pruned => "pruned",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(NodeStatus::Pending),
            "completed" => Some(NodeStatus::Completed),
            "pruned" => Some(NodeStatus::Pruned),
            _ => None,
        }
    }
}

impl StateMachine for NodeStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            NodeStatus::Pending => vec![NodeStatus::Completed, NodeStatus::Pruned],
            NodeStatus::Completed | NodeStatus::Pruned => vec![],
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One visited point of the search tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    id: PlanNodeId,
    session_id: PlanSessionId,
    parent_id: Option<PlanNodeId>,
    depth: u32,
    action: Action,
    q_value: f64,
    risk: f64,
    explainability: f64,
    total_score: f64,
    status: NodeStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl PlanNode {
    /// Creates a pending child (or parentless) node from a scored action.
    pub fn from_scored(
        session_id: PlanSessionId,
        parent_id: Option<PlanNodeId>,
        depth: u32,
        scored: &ScoredAction,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PlanNodeId::new(),
            session_id,
            parent_id,
            depth,
            action: scored.action.clone(),
            q_value: scored.q_value,
            risk: scored.risk,
            explainability: scored.explainability,
            total_score: scored.score,
            status: NodeStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the synthetic root of a session's tree, carrying the
    /// maximal score so it is always expanded first.
    pub fn root(session_id: PlanSessionId) -> Self {
        let now = Timestamp::now();
        Self {
            id: PlanNodeId::new(),
            session_id,
            parent_id: None,
            depth: 0,
            action: Action::clarify_intent("Início da sessão de planejamento"),
            q_value: 1.0,
            risk: 0.0,
            explainability: 1.0,
            total_score: 1.0,
            status: NodeStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute a node from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: PlanNodeId,
        session_id: PlanSessionId,
        parent_id: Option<PlanNodeId>,
        depth: u32,
        action: Action,
        q_value: f64,
        risk: f64,
        explainability: f64,
        total_score: f64,
        status: NodeStatus,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            session_id,
            parent_id,
            depth,
            action,
            q_value,
            risk,
            explainability,
            total_score,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &PlanNodeId {
        &self.id
    }

    pub fn session_id(&self) -> &PlanSessionId {
        &self.session_id
    }

    pub fn parent_id(&self) -> Option<&PlanNodeId> {
        self.parent_id.as_ref()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn q_value(&self) -> f64 {
        self.q_value
    }

    pub fn risk(&self) -> f64 {
        self.risk
    }

    pub fn explainability(&self) -> f64 {
        self.explainability
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == NodeStatus::Pending
    }

    /// Marks the node expanded.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the node is pending
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition(NodeStatus::Completed)
    }

    /// Marks the node cut off.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the node is pending
    pub fn prune(&mut self) -> Result<(), DomainError> {
        self.transition(NodeStatus::Pruned)
    }

    fn transition(&mut self, target: NodeStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("node_id", self.id.to_string())
        })?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
