//! Planning session aggregate.
//!
//! A session is bound to one conversation (when the caller has one) and
//! owns a search tree whose nodes live in the store. Sessions are reused
//! while their TTL lasts.
//!
//! # Invariants
//!
//! - `current_node_id` always names a node of this session once set
//! - Expired sessions are never mutated again

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    ConversationId, CustomerId, DomainError, ErrorCode, PlanNodeId, PlanSessionId,
    StateMachine, TenantId, Timestamp,
};

use super::belief::BeliefState;
use super::config::PlannerConfig;
use super::observation::ObservedState;

/// Lifecycle status of a planning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanSessionStatus {
    #[default]
    Active,
    Expired,
}

impl PlanSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanSessionStatus::Active => "active",
            PlanSessionStatus::Expired => "expired",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(PlanSessionStatus::Active),
            "expired" => Some(PlanSessionStatus::Expired),
            _ => None,
        }
    }
}

impl StateMachine for PlanSessionStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            PlanSessionStatus::Active => vec![PlanSessionStatus::Expired],
            PlanSessionStatus::Expired => vec![],
        }
    }
}

impl fmt::Display for PlanSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Root aggregate of one planning conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSession {
    id: PlanSessionId,
    tenant_id: TenantId,
    conversation_id: Option<ConversationId>,
    customer_id: CustomerId,
    /// Belief at creation, updated as action outcomes arrive
    belief: BeliefState,
    /// Observation snapshot at creation
    observed_state: ObservedState,
    max_depth: u32,
    explored_paths: u32,
    completed_actions: u32,
    root_node_id: Option<PlanNodeId>,
    current_node_id: Option<PlanNodeId>,
    status: PlanSessionStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
    expires_at: Timestamp,
}

impl PlanSession {
    /// Creates an active session expiring `session_timeout_minutes` after `now`.
    pub fn new(
        tenant_id: TenantId,
        conversation_id: Option<ConversationId>,
        customer_id: CustomerId,
        belief: BeliefState,
        observed_state: ObservedState,
        config: &PlannerConfig,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PlanSessionId::new(),
            tenant_id,
            conversation_id,
            customer_id,
            belief,
            observed_state,
            max_depth: config.max_depth,
            explored_paths: 0,
            completed_actions: 0,
            root_node_id: None,
            current_node_id: None,
            status: PlanSessionStatus::Active,
            created_at: now,
            updated_at: now,
            expires_at: now.plus_minutes(config.session_timeout_minutes),
        }
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: PlanSessionId,
        tenant_id: TenantId,
        conversation_id: Option<ConversationId>,
        customer_id: CustomerId,
        belief: BeliefState,
        observed_state: ObservedState,
        max_depth: u32,
        explored_paths: u32,
        completed_actions: u32,
        root_node_id: Option<PlanNodeId>,
        current_node_id: Option<PlanNodeId>,
        status: PlanSessionStatus,
        created_at: Timestamp,
        updated_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            id,
            tenant_id,
            conversation_id,
            customer_id,
            belief,
            observed_state,
            max_depth,
            explored_paths,
            completed_actions,
            root_node_id,
            current_node_id,
            status,
            created_at,
            updated_at,
            expires_at,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn id(&self) -> &PlanSessionId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    pub fn observed_state(&self) -> &ObservedState {
        &self.observed_state
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn explored_paths(&self) -> u32 {
        self.explored_paths
    }

    pub fn completed_actions(&self) -> u32 {
        self.completed_actions
    }

    pub fn root_node_id(&self) -> Option<&PlanNodeId> {
        self.root_node_id.as_ref()
    }

    pub fn current_node_id(&self) -> Option<&PlanNodeId> {
        self.current_node_id.as_ref()
    }

    pub fn status(&self) -> PlanSessionStatus {
        self.status
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn expires_at(&self) -> &Timestamp {
        &self.expires_at
    }

    /// A session may be resumed only while active and strictly before its
    /// expiry instant.
    pub fn is_reusable_at(&self, now: &Timestamp) -> bool {
        self.status == PlanSessionStatus::Active && now.is_before(&self.expires_at)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════════

    /// Points both root and current node at a freshly created root.
    pub fn attach_root(&mut self, root: PlanNodeId) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.root_node_id = Some(root);
        self.current_node_id = Some(root);
        self.touch();
        Ok(())
    }

    /// Records one frontier expansion that landed on `node`.
    pub fn record_expansion(&mut self, node: PlanNodeId) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.explored_paths += 1;
        self.current_node_id = Some(node);
        self.touch();
        Ok(())
    }

    /// Replaces the belief after an executed action's outcome is observed.
    pub fn apply_outcome(&mut self, belief: BeliefState, success: bool) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.belief = belief;
        if success {
            self.completed_actions += 1;
        }
        self.touch();
        Ok(())
    }

    /// Marks the session expired as of `now`.
    pub fn expire(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.status = self
            .status
            .transition_to(PlanSessionStatus::Expired)
            .map_err(|_| self.expired_error())?;
        if now.is_before(&self.expires_at) {
            self.expires_at = now;
        }
        self.updated_at = now;
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status == PlanSessionStatus::Expired {
            return Err(self.expired_error());
        }
        Ok(())
    }

    fn expired_error(&self) -> DomainError {
        DomainError::new(
            ErrorCode::SessionExpired,
            format!("Plan session {} has expired", self.id),
        )
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planning::belief::estimate_initial_belief;

    fn session_at(now: Timestamp, timeout_minutes: i64) -> PlanSession {
        let state = ObservedState::new("quero comprar um produto");
        let belief = estimate_initial_belief(&state);
        let config = PlannerConfig {
            session_timeout_minutes: timeout_minutes,
            ..Default::default()
        };
        PlanSession::new(
            TenantId::new("loja").unwrap(),
            Some(ConversationId::new("conv-1").unwrap()),
            CustomerId::anonymous(),
            belief,
            state,
            &config,
            now,
        )
    }

    #[test]
    fn new_session_expires_after_timeout() {
        let now = Timestamp::now();
        let session = session_at(now, 30);

        assert_eq!(session.expires_at(), &now.plus_minutes(30));
        assert_eq!(session.explored_paths(), 0);
        assert!(session.root_node_id().is_none());
    }

    #[test]
    fn reusable_strictly_before_expiry() {
        let now = Timestamp::now();
        let session = session_at(now, 10);
        let expiry = *session.expires_at();

        assert!(session.is_reusable_at(&now));
        assert!(session.is_reusable_at(&now.plus_minutes(9)));
        assert!(!session.is_reusable_at(&expiry));
        assert!(!session.is_reusable_at(&expiry.plus_secs(1)));
    }

    #[test]
    fn attach_root_sets_root_and_current() {
        let mut session = session_at(Timestamp::now(), 30);
        let root = PlanNodeId::new();

        session.attach_root(root).unwrap();

        assert_eq!(session.root_node_id(), Some(&root));
        assert_eq!(session.current_node_id(), Some(&root));
    }

    #[test]
    fn record_expansion_counts_paths() {
        let mut session = session_at(Timestamp::now(), 30);
        let node = PlanNodeId::new();

        session.record_expansion(node).unwrap();
        session.record_expansion(node).unwrap();

        assert_eq!(session.explored_paths(), 2);
        assert_eq!(session.current_node_id(), Some(&node));
    }

    #[test]
    fn expired_session_rejects_mutation() {
        let now = Timestamp::now();
        let mut session = session_at(now, 30);

        session.expire(now).unwrap();

        assert!(!session.is_reusable_at(&now));
        let err = session.record_expansion(PlanNodeId::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
        assert!(session.expire(now).is_err());
    }

    #[test]
    fn apply_outcome_counts_only_successes() {
        let mut session = session_at(Timestamp::now(), 30);
        let belief = session.belief().clone();

        session.apply_outcome(belief.clone(), true).unwrap();
        session.apply_outcome(belief, false).unwrap();

        assert_eq!(session.completed_actions(), 1);
    }
}
