//! PlanSessionManager - get-or-create for planning sessions.
//!
//! Sessions are resumed per conversation while their TTL lasts. Creation
//! and root-node attachment for one conversation are serialized by an async
//! mutex held here, so two concurrent calls in the same process never mint
//! two sessions for one conversation. Callers in different processes must
//! still keep a single writer per conversation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::domain::foundation::{
    ConversationId, CustomerId, DomainError, ErrorCode, TenantId, Timestamp,
};
use crate::domain::planning::{
    BeliefState, ObservedState, PlanNode, PlanSession, PlanSessionStatus, PlannerConfig,
    PlannerError,
};
use crate::ports::{PlanNodeRepository, PlanSessionRepository};

/// Who a planning call is for, with the tenant already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionScope {
    pub tenant_id: TenantId,
    pub conversation_id: Option<ConversationId>,
    pub customer_id: CustomerId,
}

type ConversationKey = (TenantId, ConversationId);

/// Resolves the session a planning call works in.
pub struct PlanSessionManager {
    sessions: Arc<dyn PlanSessionRepository>,
    nodes: Arc<dyn PlanNodeRepository>,
    conversation_locks: Mutex<HashMap<ConversationKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl PlanSessionManager {
    pub fn new(sessions: Arc<dyn PlanSessionRepository>, nodes: Arc<dyn PlanNodeRepository>) -> Self {
        Self {
            sessions,
            nodes,
            conversation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live session for the scope's conversation, or a fresh
    /// session with its root node attached.
    pub async fn get_or_create(
        &self,
        scope: &SessionScope,
        state: &ObservedState,
        belief: &BeliefState,
        config: &PlannerConfig,
    ) -> Result<PlanSession, PlannerError> {
        self.get_or_create_at(scope, state, belief, config, Timestamp::now())
            .await
    }

    /// Same as [`get_or_create`](Self::get_or_create) with an explicit clock.
    pub async fn get_or_create_at(
        &self,
        scope: &SessionScope,
        state: &ObservedState,
        belief: &BeliefState,
        config: &PlannerConfig,
        now: Timestamp,
    ) -> Result<PlanSession, PlannerError> {
        let Some(conversation_id) = &scope.conversation_id else {
            return self.create(scope, state, belief, config, now).await;
        };

        let lock = self.conversation_lock(&scope.tenant_id, conversation_id)?;
        let _guard = lock.lock().await;

        if let Some(mut existing) = self
            .sessions
            .find_latest_by_conversation(&scope.tenant_id, conversation_id)
            .await?
        {
            if existing.is_reusable_at(&now) {
                debug!(
                    session_id = %existing.id(),
                    conversation_id = %conversation_id,
                    "Resuming plan session"
                );
                return Ok(existing);
            }

            if existing.status() == PlanSessionStatus::Active {
                existing.expire(now)?;
                self.sessions.update(&existing).await?;
                debug!(session_id = %existing.id(), "Plan session expired");
            }
        }

        self.create(scope, state, belief, config, now).await
    }

    async fn create(
        &self,
        scope: &SessionScope,
        state: &ObservedState,
        belief: &BeliefState,
        config: &PlannerConfig,
        now: Timestamp,
    ) -> Result<PlanSession, PlannerError> {
        let mut session = PlanSession::new(
            scope.tenant_id.clone(),
            scope.conversation_id.clone(),
            scope.customer_id.clone(),
            belief.clone(),
            state.clone(),
            config,
            now,
        );
        self.sessions.save(&session).await?;

        let root = PlanNode::root(*session.id());
        self.nodes.save(&root).await?;

        session.attach_root(*root.id())?;
        self.sessions.update(&session).await?;

        info!(
            session_id = %session.id(),
            tenant_id = %scope.tenant_id,
            root_node_id = %root.id(),
            "Plan session created"
        );

        Ok(session)
    }

    fn conversation_lock(
        &self,
        tenant_id: &TenantId,
        conversation_id: &ConversationId,
    ) -> Result<Arc<tokio::sync::Mutex<()>>, PlannerError> {
        let mut locks = self.conversation_locks.lock().map_err(|_| {
            DomainError::new(ErrorCode::InternalError, "Conversation lock table poisoned")
        })?;
        // Drop locks nobody is waiting on.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let lock = locks
            .entry((tenant_id.clone(), conversation_id.clone()))
            .or_default()
            .clone();
        Ok(lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanStore;
    use crate::domain::planning::{estimate_initial_belief, ActionKind};

    fn manager(store: &Arc<InMemoryPlanStore>) -> PlanSessionManager {
        PlanSessionManager::new(store.clone(), store.clone())
    }

    fn scope(conversation: Option<&str>) -> SessionScope {
        SessionScope {
            tenant_id: TenantId::new("loja").unwrap(),
            conversation_id: conversation.map(|c| ConversationId::new(c).unwrap()),
            customer_id: CustomerId::anonymous(),
        }
    }

    fn inputs() -> (ObservedState, BeliefState, PlannerConfig) {
        let state = ObservedState::new("quero comprar um produto");
        let belief = estimate_initial_belief(&state);
        (state, belief, PlannerConfig::default())
    }

    #[tokio::test]
    async fn new_session_gets_a_root_node() {
        let store = Arc::new(InMemoryPlanStore::new());
        let (state, belief, config) = inputs();

        let session = manager(&store)
            .get_or_create(&scope(Some("c1")), &state, &belief, &config)
            .await
            .unwrap();

        let root_id = session.root_node_id().copied().unwrap();
        assert_eq!(session.current_node_id(), Some(&root_id));

        let root = PlanNodeRepository::find_by_id(store.as_ref(), &root_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root.depth(), 0);
        assert_eq!(root.total_score(), 1.0);
        assert!(root.parent_id().is_none());
        assert_eq!(root.action().kind(), ActionKind::ClarifyIntent);
        assert!(root.is_pending());
    }

    #[tokio::test]
    async fn session_expires_after_configured_timeout() {
        let store = Arc::new(InMemoryPlanStore::new());
        let (state, belief, config) = inputs();
        let now = Timestamp::now();

        let session = manager(&store)
            .get_or_create_at(&scope(None), &state, &belief, &config, now)
            .await
            .unwrap();

        assert_eq!(session.expires_at(), &now.plus_minutes(30));
    }

    #[tokio::test]
    async fn live_session_is_reused_for_same_conversation() {
        let store = Arc::new(InMemoryPlanStore::new());
        let manager = manager(&store);
        let (state, belief, config) = inputs();
        let now = Timestamp::now();

        let first = manager
            .get_or_create_at(&scope(Some("c1")), &state, &belief, &config, now)
            .await
            .unwrap();
        let second = manager
            .get_or_create_at(&scope(Some("c1")), &state, &belief, &config, now.plus_minutes(29))
            .await
            .unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn session_at_expiry_instant_is_not_reused() {
        let store = Arc::new(InMemoryPlanStore::new());
        let manager = manager(&store);
        let (state, belief, config) = inputs();
        let now = Timestamp::now();

        let first = manager
            .get_or_create_at(&scope(Some("c1")), &state, &belief, &config, now)
            .await
            .unwrap();
        let second = manager
            .get_or_create_at(&scope(Some("c1")), &state, &belief, &config, now.plus_minutes(30))
            .await
            .unwrap();

        assert_ne!(first.id(), second.id());
        assert_ne!(first.root_node_id(), second.root_node_id());

        let stale = PlanSessionRepository::find_by_id(store.as_ref(), first.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.status(), PlanSessionStatus::Expired);
    }

    #[tokio::test]
    async fn calls_without_conversation_never_share_sessions() {
        let store = Arc::new(InMemoryPlanStore::new());
        let manager = manager(&store);
        let (state, belief, config) = inputs();

        let a = manager.get_or_create(&scope(None), &state, &belief, &config).await.unwrap();
        let b = manager.get_or_create(&scope(None), &state, &belief, &config).await.unwrap();

        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn concurrent_calls_for_one_conversation_share_a_session() {
        let store = Arc::new(InMemoryPlanStore::new());
        let manager = Arc::new(manager(&store));
        let (state, belief, config) = inputs();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let (state, belief, config) = (state.clone(), belief.clone(), config.clone());
            handles.push(tokio::spawn(async move {
                manager
                    .get_or_create(&scope(Some("c1")), &state, &belief, &config)
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(*handle.await.unwrap().id());
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(store.session_count(), 1);
    }
}
