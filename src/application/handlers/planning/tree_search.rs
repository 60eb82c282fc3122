//! TreeSearchEngine - best-first expansion of the persisted search tree.
//!
//! The frontier is every pending node of the session. Each call expands a
//! single node: the shallowest one, highest score first. Nodes at the depth
//! limit or under the pruning threshold are cut off instead of expanded.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::foundation::{DomainError, PlanNodeId};
use crate::domain::planning::{
    generate_candidate_actions, score_action, BeliefState, NodeStatus, ObservedState, PlanNode,
    PlanSession, PlannerConfig, PlannerError,
};
use crate::ports::{PlanNodeRepository, PlanSessionRepository};

/// Everything one expansion step reads.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    /// Session whose tree is searched. Expansion fails without one.
    pub session: Option<PlanSession>,
    pub state: ObservedState,
    pub belief: BeliefState,
    pub config: PlannerConfig,
}

impl PlanningContext {
    pub fn new(
        session: PlanSession,
        state: ObservedState,
        belief: BeliefState,
        config: PlannerConfig,
    ) -> Self {
        Self {
            session: Some(session),
            state,
            belief,
            config,
        }
    }
}

/// Expands and inspects a session's search tree through the storage ports.
pub struct TreeSearchEngine {
    sessions: Arc<dyn PlanSessionRepository>,
    nodes: Arc<dyn PlanNodeRepository>,
}

impl TreeSearchEngine {
    pub fn new(sessions: Arc<dyn PlanSessionRepository>, nodes: Arc<dyn PlanNodeRepository>) -> Self {
        Self { sessions, nodes }
    }

    /// Expands the best pending node of the context's session.
    ///
    /// Returns the expanded node, or `None` when there was nothing to
    /// expand or the selected node was pruned instead. Children are written
    /// before the parent is marked completed.
    ///
    /// The depth limit is the one fixed on the session when it was created;
    /// the remaining tunables come from the context's config.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` when the context carries no session
    /// - `Storage` on any persistence failure
    pub async fn expand_frontier(
        &self,
        ctx: &mut PlanningContext,
    ) -> Result<Option<PlanNode>, PlannerError> {
        let PlanningContext {
            session,
            state,
            belief,
            config,
        } = ctx;
        let session = session.as_mut().ok_or(PlannerError::NoActiveSession)?;

        let mut pending: Vec<PlanNode> = self
            .nodes
            .find_by_session(session.id())
            .await?
            .into_iter()
            .filter(PlanNode::is_pending)
            .collect();

        // Stable, so creation order survives among equal depth and score.
        pending.sort_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| b.total_score().total_cmp(&a.total_score()))
        });

        let Some(mut node) = pending.into_iter().next() else {
            return Ok(None);
        };

        if node.depth() >= session.max_depth() {
            debug!(node_id = %node.id(), depth = node.depth(), "Pruning node at depth limit");
            self.prune(&mut node).await?;
            return Ok(None);
        }

        if node.total_score() < config.pruning_threshold {
            debug!(
                node_id = %node.id(),
                score = node.total_score(),
                threshold = config.pruning_threshold,
                "Pruning node under score threshold"
            );
            self.prune(&mut node).await?;
            return Ok(None);
        }

        let child_depth = node.depth() + 1;
        let candidates = generate_candidate_actions(state, belief, child_depth, config);
        for action in &candidates {
            let scored = score_action(action, state, belief, config);
            let child = PlanNode::from_scored(*session.id(), Some(*node.id()), child_depth, &scored);
            self.nodes.save(&child).await?;
            debug!(
                node_id = %child.id(),
                parent_id = %node.id(),
                action = %action.kind(),
                score = scored.score,
                "Child node created"
            );
        }

        node.complete()
            .map_err(|e| transition_error(&node, NodeStatus::Completed, e))?;
        self.nodes.update(&node).await?;

        session.record_expansion(*node.id())?;
        self.sessions.update(session).await?;

        debug!(
            session_id = %session.id(),
            node_id = %node.id(),
            children = candidates.len(),
            "Node expanded"
        );

        Ok(Some(node))
    }

    /// Highest-scoring leaf of the session's tree.
    ///
    /// A leaf has a parent, is not pruned and has no children. Ties go to
    /// the earliest node in storage order. Parentless nodes (the root and
    /// decomposition steps) are never candidates.
    pub async fn select_best_leaf(
        &self,
        session: &PlanSession,
    ) -> Result<Option<PlanNode>, PlannerError> {
        let nodes = self.nodes.find_by_session(session.id()).await?;
        let parents: HashSet<PlanNodeId> = nodes.iter().filter_map(|n| n.parent_id().copied()).collect();

        let best = nodes
            .into_iter()
            .filter(|n| {
                n.parent_id().is_some()
                    && n.status() != NodeStatus::Pruned
                    && !parents.contains(n.id())
            })
            .fold(None::<PlanNode>, |best, node| match best {
                Some(current) if current.total_score() >= node.total_score() => Some(current),
                _ => Some(node),
            });

        Ok(best)
    }

    /// Direct children of a node, best first.
    pub async fn children_of(&self, node_id: &PlanNodeId) -> Result<Vec<PlanNode>, PlannerError> {
        Ok(self.nodes.find_children(node_id).await?)
    }

    async fn prune(&self, node: &mut PlanNode) -> Result<(), PlannerError> {
        node.prune()
            .map_err(|e| transition_error(node, NodeStatus::Pruned, e))?;
        self.nodes.update(node).await?;
        Ok(())
    }
}

fn transition_error(node: &PlanNode, to: NodeStatus, cause: DomainError) -> PlannerError {
    debug!(node_id = %node.id(), error = %cause, "Rejected node transition");
    PlannerError::InvalidTransition {
        from: node.status().to_string(),
        to: to.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanStore;
    use crate::application::handlers::planning::{PlanSessionManager, SessionScope};
    use crate::domain::foundation::{CustomerId, TenantId};
    use crate::domain::planning::{estimate_initial_belief, ActionKind};

    struct Fixture {
        store: Arc<InMemoryPlanStore>,
        engine: TreeSearchEngine,
        ctx: PlanningContext,
    }

    async fn fixture(message: &str, config: PlannerConfig) -> Fixture {
        let store = Arc::new(InMemoryPlanStore::new());
        let manager = PlanSessionManager::new(store.clone(), store.clone());
        let state = ObservedState::new(message);
        let belief = estimate_initial_belief(&state);
        let scope = SessionScope {
            tenant_id: TenantId::new("loja").unwrap(),
            conversation_id: None,
            customer_id: CustomerId::anonymous(),
        };
        let session = manager
            .get_or_create(&scope, &state, &belief, &config)
            .await
            .unwrap();

        Fixture {
            engine: TreeSearchEngine::new(store.clone(), store.clone()),
            ctx: PlanningContext::new(session, state, belief, config),
            store,
        }
    }

    fn session_of(ctx: &PlanningContext) -> &PlanSession {
        ctx.session.as_ref().unwrap()
    }

    #[tokio::test]
    async fn expansion_without_session_fails() {
        let mut f = fixture("ok", PlannerConfig::default()).await;
        f.ctx.session = None;

        let err = f.engine.expand_frontier(&mut f.ctx).await.unwrap_err();

        assert_eq!(err, PlannerError::NoActiveSession);
    }

    #[tokio::test]
    async fn first_expansion_completes_root_and_adds_children() {
        let mut f = fixture("quero comprar um produto", PlannerConfig::default()).await;
        let root_id = *session_of(&f.ctx).root_node_id().unwrap();

        let expanded = f.engine.expand_frontier(&mut f.ctx).await.unwrap().unwrap();

        assert_eq!(expanded.id(), &root_id);
        assert_eq!(expanded.status(), NodeStatus::Completed);

        let children = f.engine.children_of(&root_id).await.unwrap();
        assert!(!children.is_empty());
        assert!(children.iter().all(|c| c.depth() == 1));
        assert!(children
            .windows(2)
            .all(|w| w[0].total_score() >= w[1].total_score()));

        let session = session_of(&f.ctx);
        assert_eq!(session.explored_paths(), 1);
        assert_eq!(session.current_node_id(), Some(&root_id));
    }

    #[tokio::test]
    async fn children_are_written_in_generation_order() {
        let mut f = fixture("quero comprar um produto", PlannerConfig::default()).await;
        let session_id = *session_of(&f.ctx).id();

        f.engine.expand_frontier(&mut f.ctx).await.unwrap();

        let kinds: Vec<ActionKind> = f
            .store
            .find_by_session(&session_id)
            .await
            .unwrap()
            .iter()
            .filter(|n| n.depth() == 1)
            .map(|n| n.action().kind())
            .collect();
        assert_eq!(kinds, vec![ActionKind::SearchProducts, ActionKind::Checkout]);
    }

    #[tokio::test]
    async fn node_at_depth_limit_is_pruned() {
        let config = PlannerConfig {
            max_depth: 1,
            ..PlannerConfig::default()
        };
        let mut f = fixture("ok", config).await;

        f.engine.expand_frontier(&mut f.ctx).await.unwrap().unwrap();
        let pruned = f.engine.expand_frontier(&mut f.ctx).await.unwrap();
        assert!(pruned.is_none());

        let nodes = f.store.find_by_session(session_of(&f.ctx).id()).await.unwrap();
        let child = nodes.iter().find(|n| n.depth() == 1).unwrap();
        assert_eq!(child.status(), NodeStatus::Pruned);
        assert!(nodes.iter().all(|n| n.depth() <= 1));
    }

    #[tokio::test]
    async fn resumed_session_keeps_its_depth_limit() {
        let config = PlannerConfig {
            max_depth: 1,
            ..PlannerConfig::default()
        };
        let mut f = fixture("ok", config).await;
        f.ctx.config = PlannerConfig {
            max_depth: 3,
            ..PlannerConfig::default()
        };

        f.engine.expand_frontier(&mut f.ctx).await.unwrap().unwrap();
        assert!(f.engine.expand_frontier(&mut f.ctx).await.unwrap().is_none());

        let nodes = f.store.find_by_session(session_of(&f.ctx).id()).await.unwrap();
        assert!(nodes.iter().all(|n| n.depth() <= 1));
        assert_eq!(session_of(&f.ctx).explored_paths(), 1);
    }

    #[tokio::test]
    async fn low_score_node_is_pruned() {
        let config = PlannerConfig {
            pruning_threshold: 1.5,
            ..PlannerConfig::default()
        };
        let mut f = fixture("ok", config).await;
        let root_id = *session_of(&f.ctx).root_node_id().unwrap();

        assert!(f.engine.expand_frontier(&mut f.ctx).await.unwrap().is_none());

        let root = PlanNodeRepository::find_by_id(f.store.as_ref(), &root_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root.status(), NodeStatus::Pruned);
        assert_eq!(session_of(&f.ctx).explored_paths(), 0);
    }

    #[tokio::test]
    async fn pruned_nodes_are_not_expanded_again() {
        let config = PlannerConfig {
            pruning_threshold: 1.5,
            ..PlannerConfig::default()
        };
        let mut f = fixture("ok", config).await;

        f.engine.expand_frontier(&mut f.ctx).await.unwrap();
        let again = f.engine.expand_frontier(&mut f.ctx).await.unwrap();

        assert!(again.is_none());
        assert_eq!(f.store.node_count(), 1);
    }

    #[tokio::test]
    async fn tree_never_grows_past_max_depth() {
        let config = PlannerConfig {
            max_depth: 2,
            ..PlannerConfig::default()
        };
        let mut f = fixture("quero comprar um produto", config).await;
        let budget = f.ctx.config.expansion_budget();

        for _ in 0..budget {
            if f.engine.expand_frontier(&mut f.ctx).await.unwrap().is_none() {
                break;
            }
        }

        let nodes = f.store.find_by_session(session_of(&f.ctx).id()).await.unwrap();
        assert!(nodes.iter().all(|n| n.depth() <= 2));
    }

    #[tokio::test]
    async fn best_leaf_skips_root_and_expanded_nodes() {
        let mut f = fixture("ok", PlannerConfig::default()).await;
        let root_id = *session_of(&f.ctx).root_node_id().unwrap();

        assert!(f
            .engine
            .select_best_leaf(session_of(&f.ctx))
            .await
            .unwrap()
            .is_none());

        f.engine.expand_frontier(&mut f.ctx).await.unwrap();
        let leaf = f
            .engine
            .select_best_leaf(session_of(&f.ctx))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(leaf.parent_id(), Some(&root_id));
        assert_eq!(leaf.action().kind(), ActionKind::ClarifyIntent);
    }

    #[tokio::test]
    async fn best_leaf_prefers_earliest_on_ties() {
        let f = fixture("ok", PlannerConfig::default()).await;
        let session = session_of(&f.ctx);
        let root_id = *session.root_node_id().unwrap();
        let scored = score_action(
            &crate::domain::planning::Action::search_products("meias"),
            &f.ctx.state,
            &f.ctx.belief,
            &f.ctx.config,
        );
        let first = PlanNode::from_scored(*session.id(), Some(root_id), 1, &scored);
        let second = PlanNode::from_scored(*session.id(), Some(root_id), 1, &scored);
        PlanNodeRepository::save(f.store.as_ref(), &first).await.unwrap();
        PlanNodeRepository::save(f.store.as_ref(), &second).await.unwrap();

        let leaf = f.engine.select_best_leaf(session).await.unwrap().unwrap();

        assert_eq!(leaf.id(), first.id());
    }
}
