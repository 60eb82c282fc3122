//! PlanActionHandler - decides the next action for one customer message.
//!
//! Flow:
//! 1. Resolve the tenant (explicit, else the directory default)
//! 2. Estimate the belief and get or create the conversation's session
//! 3. Expand the tree until it stalls or the expansion budget is spent
//! 4. Take the best leaf, re-scored against the current observation
//! 5. Without a leaf, score depth-0 candidates directly
//! 6. Decompose the message when the chosen action is a multi-step plan

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::foundation::{ConversationId, CustomerId, PlanNodeId, PlanSessionId, TenantId};
use crate::domain::planning::{
    estimate_initial_belief, generate_candidate_actions, score_action, Action, ActionKind,
    BeliefState, ObservedState, PlannerConfig, PlannerError, ScoredAction, SubGoalPipeline,
};
use crate::ports::{PlanNodeRepository, PlanSessionRepository, TenantDirectory};

use super::{PlanSessionManager, PlanningContext, SessionScope, SubGoalDecomposer, TreeSearchEngine};

/// Question asked when nothing better can be proposed.
const FALLBACK_QUESTION: &str = "Pode me contar um pouco mais sobre o que você precisa?";

/// Caller identity for a planning call. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantContext {
    pub tenant_id: Option<TenantId>,
    pub conversation_id: Option<ConversationId>,
    pub customer_id: Option<CustomerId>,
}

/// Command to plan the next action for an observation.
#[derive(Debug, Clone)]
pub struct PlanActionCommand {
    pub state: ObservedState,
    pub context: TenantContext,
    /// Overrides the handler's configuration for this call
    pub config: Option<PlannerConfig>,
}

impl PlanActionCommand {
    pub fn new(state: ObservedState) -> Self {
        Self {
            state,
            context: TenantContext::default(),
            config: None,
        }
    }

    pub fn with_context(mut self, context: TenantContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// How the chosen action was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Best leaf of the search tree
    TreeLeaf,
    /// Tree had no leaf, depth-0 candidates were scored directly
    DirectScoring,
    /// No candidate at all, a clarifying question was synthesized
    Clarification,
}

/// Result of a planning call.
#[derive(Debug, Clone, Serialize)]
pub struct PlanActionResult {
    pub session_id: PlanSessionId,
    pub chosen: ScoredAction,
    /// Tree node the action came from, when it came from the tree
    pub node_id: Option<PlanNodeId>,
    pub source: SelectionSource,
    /// `expand_frontier` calls made, pruning calls included
    pub expansions: usize,
    pub belief: BeliefState,
    /// Present when the chosen action is a multi-step plan
    pub sub_goals: Option<SubGoalPipeline>,
}

/// Handler for planning the next action.
pub struct PlanActionHandler {
    tenants: Arc<dyn TenantDirectory>,
    sessions: PlanSessionManager,
    search: TreeSearchEngine,
    decomposer: SubGoalDecomposer,
    config: PlannerConfig,
}

impl PlanActionHandler {
    pub fn new(
        session_repository: Arc<dyn PlanSessionRepository>,
        node_repository: Arc<dyn PlanNodeRepository>,
        tenants: Arc<dyn TenantDirectory>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            tenants,
            sessions: PlanSessionManager::new(session_repository.clone(), node_repository.clone()),
            search: TreeSearchEngine::new(session_repository, node_repository.clone()),
            decomposer: SubGoalDecomposer::new(node_repository),
            config,
        }
    }

    /// Configuration used when a command carries none.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub async fn handle(&self, cmd: PlanActionCommand) -> Result<PlanActionResult, PlannerError> {
        let config = cmd.config.unwrap_or_else(|| self.config.clone());
        config
            .validate()
            .map_err(|e| PlannerError::InvalidRequest(e.to_string()))?;

        // 1. Resolve tenant
        let tenant_id = match cmd.context.tenant_id {
            Some(tenant_id) => tenant_id,
            None => self
                .tenants
                .default_tenant()
                .await?
                .ok_or(PlannerError::NoTenantAvailable)?,
        };

        // 2. Belief and session
        let belief = estimate_initial_belief(&cmd.state);
        let scope = SessionScope {
            tenant_id,
            conversation_id: cmd.context.conversation_id,
            customer_id: cmd.context.customer_id.unwrap_or_else(CustomerId::anonymous),
        };
        let session = self
            .sessions
            .get_or_create(&scope, &cmd.state, &belief, &config)
            .await?;
        let session_id = *session.id();
        let mut ctx = PlanningContext::new(session, cmd.state, belief, config);

        // 3. Expand within budget
        let budget = ctx.config.expansion_budget();
        let mut expansions = 0;
        while expansions < budget {
            expansions += 1;
            if self.search.expand_frontier(&mut ctx).await?.is_none() {
                break;
            }
        }

        // 4-5. Best leaf, else direct scoring
        let session = ctx.session.as_ref().ok_or(PlannerError::NoActiveSession)?;
        let (chosen, node_id, source) = match self.search.select_best_leaf(session).await? {
            Some(leaf) => (
                score_action(leaf.action(), &ctx.state, &ctx.belief, &ctx.config),
                Some(*leaf.id()),
                SelectionSource::TreeLeaf,
            ),
            None => {
                warn!(session_id = %session_id, "Search tree has no leaf, scoring candidates directly");
                let (chosen, source) = score_directly(&ctx.state, &ctx.belief, &ctx.config);
                (chosen, None, source)
            }
        };

        // 6. Decompose multi-step plans
        let sub_goals = if chosen.action.kind() == ActionKind::MultiStepPlan {
            Some(
                self.decomposer
                    .decompose(&ctx.state.message, session_id, &ctx.state, &ctx.config)
                    .await?,
            )
        } else {
            None
        };

        info!(
            session_id = %session_id,
            action = %chosen.action.kind(),
            score = chosen.score,
            source = ?source,
            expansions,
            "Action selected"
        );

        Ok(PlanActionResult {
            session_id,
            chosen,
            node_id,
            source,
            expansions,
            belief: ctx.belief,
            sub_goals,
        })
    }
}

/// Scores depth-0 candidates without touching the tree. The first of
/// equally scored candidates wins; with no candidate at all a clarifying
/// question is scored instead.
fn score_directly(
    state: &ObservedState,
    belief: &BeliefState,
    config: &PlannerConfig,
) -> (ScoredAction, SelectionSource) {
    let best = generate_candidate_actions(state, belief, 0, config)
        .iter()
        .map(|action| score_action(action, state, belief, config))
        .fold(None::<ScoredAction>, |best, scored| match best {
            Some(current) if current.score >= scored.score => Some(current),
            _ => Some(scored),
        });

    match best {
        Some(scored) => (scored, SelectionSource::DirectScoring),
        None => {
            warn!("No candidate actions, asking for clarification");
            let action = Action::clarify_intent(FALLBACK_QUESTION);
            (
                score_action(&action, state, belief, config),
                SelectionSource::Clarification,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryPlanStore, StaticTenantDirectory};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use crate::domain::planning::{PlanNode, ScoringWeights};
    use async_trait::async_trait;

    fn handler_with(store: &Arc<InMemoryPlanStore>, tenants: StaticTenantDirectory) -> PlanActionHandler {
        PlanActionHandler::new(
            store.clone(),
            store.clone(),
            Arc::new(tenants),
            PlannerConfig::default(),
        )
    }

    fn handler(store: &Arc<InMemoryPlanStore>) -> PlanActionHandler {
        handler_with(store, StaticTenantDirectory::single(TenantId::new("loja").unwrap()))
    }

    #[tokio::test]
    async fn fails_without_any_tenant() {
        let store = Arc::new(InMemoryPlanStore::new());
        let handler = handler_with(&store, StaticTenantDirectory::empty());

        let err = handler
            .handle(PlanActionCommand::new(ObservedState::new("ok")))
            .await
            .unwrap_err();

        assert_eq!(err, PlannerError::NoTenantAvailable);
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn explicit_tenant_skips_directory() {
        let store = Arc::new(InMemoryPlanStore::new());
        let handler = handler_with(&store, StaticTenantDirectory::empty());
        let context = TenantContext {
            tenant_id: Some(TenantId::new("outra-loja").unwrap()),
            ..TenantContext::default()
        };

        let result = handler
            .handle(PlanActionCommand::new(ObservedState::new("ok")).with_context(context))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn short_message_asks_for_clarification() {
        let store = Arc::new(InMemoryPlanStore::new());

        let result = handler(&store)
            .handle(PlanActionCommand::new(ObservedState::new("ok")))
            .await
            .unwrap();

        assert_eq!(result.chosen.action.kind(), ActionKind::ClarifyIntent);
        assert_eq!(result.source, SelectionSource::TreeLeaf);
        assert!(result.node_id.is_some());
        assert!(result.sub_goals.is_none());
    }

    #[tokio::test]
    async fn purchase_message_picks_product_search() {
        let store = Arc::new(InMemoryPlanStore::new());

        let result = handler(&store)
            .handle(PlanActionCommand::new(ObservedState::new("quero comprar um produto")))
            .await
            .unwrap();

        assert_eq!(result.chosen.action.kind(), ActionKind::SearchProducts);
        assert_eq!(result.source, SelectionSource::TreeLeaf);
        assert!(result.expansions <= PlannerConfig::default().expansion_budget());
    }

    #[tokio::test]
    async fn expansion_budget_bounds_the_search() {
        let store = Arc::new(InMemoryPlanStore::new());
        let config = PlannerConfig {
            max_actions_to_consider: 1,
            max_depth: 3,
            ..PlannerConfig::default()
        };

        let result = handler(&store)
            .handle(PlanActionCommand::new(ObservedState::new("ok")).with_config(config))
            .await
            .unwrap();

        assert_eq!(result.expansions, 3);
        let session = PlanSessionRepository::find_by_id(store.as_ref(), &result.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.explored_paths(), 3);
    }

    #[tokio::test]
    async fn no_leaf_falls_back_to_direct_scoring() {
        let store = Arc::new(InMemoryPlanStore::new());
        let config = PlannerConfig {
            pruning_threshold: 1.5,
            ..PlannerConfig::default()
        };

        let result = handler(&store)
            .handle(
                PlanActionCommand::new(ObservedState::new("quero comprar um produto"))
                    .with_config(config),
            )
            .await
            .unwrap();

        assert_eq!(result.source, SelectionSource::DirectScoring);
        assert_eq!(result.chosen.action.kind(), ActionKind::SearchProducts);
        assert!(result.node_id.is_none());
    }

    #[tokio::test]
    async fn no_candidates_falls_back_to_clarification() {
        let store = Arc::new(InMemoryPlanStore::new());

        let result = handler(&store)
            .handle(PlanActionCommand::new(ObservedState::new("bom dia para você")))
            .await
            .unwrap();

        assert_eq!(result.source, SelectionSource::Clarification);
        assert_eq!(result.chosen.action.kind(), ActionKind::ClarifyIntent);
    }

    #[tokio::test]
    async fn chosen_multi_step_plan_is_decomposed() {
        let store = Arc::new(InMemoryPlanStore::new());
        let config = PlannerConfig {
            weights: ScoringWeights {
                utility: 1.0,
                risk: 0.0,
                explainability: 0.0,
            },
            pruning_threshold: 1.5,
            ..PlannerConfig::default()
        };
        let message = "quero ver os tênis, adicionar a camiseta no carrinho e depois pagar com pix";

        let result = handler(&store)
            .handle(PlanActionCommand::new(ObservedState::new(message)).with_config(config))
            .await
            .unwrap();

        assert_eq!(result.chosen.action.kind(), ActionKind::MultiStepPlan);
        let sub_goals = result.sub_goals.unwrap();
        assert_eq!(sub_goals.len(), 3);
        assert_eq!(sub_goals.steps[2].dependencies, vec![2]);
    }

    #[tokio::test]
    async fn same_conversation_resumes_the_tree() {
        let store = Arc::new(InMemoryPlanStore::new());
        let handler = handler(&store);
        let context = TenantContext {
            conversation_id: Some(ConversationId::new("conv-1").unwrap()),
            ..TenantContext::default()
        };

        let first = handler
            .handle(PlanActionCommand::new(ObservedState::new("ok")).with_context(context.clone()))
            .await
            .unwrap();
        let second = handler
            .handle(PlanActionCommand::new(ObservedState::new("ok")).with_context(context))
            .await
            .unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn invalid_override_is_rejected() {
        let store = Arc::new(InMemoryPlanStore::new());
        let config = PlannerConfig {
            max_depth: 0,
            ..PlannerConfig::default()
        };

        let err = handler(&store)
            .handle(PlanActionCommand::new(ObservedState::new("ok")).with_config(config))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    struct FailingNodeRepository;

    #[async_trait]
    impl PlanNodeRepository for FailingNodeRepository {
        async fn save(&self, _node: &PlanNode) -> Result<(), DomainError> {
            Err(DomainError::database("Simulated save failure"))
        }

        async fn update(&self, _node: &PlanNode) -> Result<(), DomainError> {
            Ok(())
        }

        async fn find_by_id(&self, _id: &PlanNodeId) -> Result<Option<PlanNode>, DomainError> {
            Ok(None)
        }

        async fn find_by_session(
            &self,
            _session_id: &PlanSessionId,
        ) -> Result<Vec<PlanNode>, DomainError> {
            Ok(Vec::new())
        }

        async fn find_children(&self, _parent_id: &PlanNodeId) -> Result<Vec<PlanNode>, DomainError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let store = Arc::new(InMemoryPlanStore::new());
        let handler = PlanActionHandler::new(
            store.clone(),
            Arc::new(FailingNodeRepository),
            Arc::new(StaticTenantDirectory::single(TenantId::new("loja").unwrap())),
            PlannerConfig::default(),
        );

        let err = handler
            .handle(PlanActionCommand::new(ObservedState::new("ok")))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }
}
