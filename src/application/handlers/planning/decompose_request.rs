//! SubGoalDecomposer - splits a compound request into an ordered pipeline.
//!
//! Each clause is planned on its own: a per-clause observation, a fresh
//! belief, and the first candidate the generator proposes. Steps are stored
//! as parentless, already-completed nodes so the frontier never picks them
//! up and leaf selection never returns them.

use std::sync::Arc;

use tracing::debug;

use crate::domain::foundation::PlanSessionId;
use crate::domain::planning::{
    estimate_initial_belief, generate_candidate_actions, score_action, split_compound_request,
    Action, NodeStatus, ObservedState, PlanNode, PlannerConfig, PlannerError, SubGoal,
    SubGoalPipeline,
};
use crate::ports::PlanNodeRepository;

/// Decomposes compound requests into linear sub-goal pipelines.
pub struct SubGoalDecomposer {
    nodes: Arc<dyn PlanNodeRepository>,
}

impl SubGoalDecomposer {
    pub fn new(nodes: Arc<dyn PlanNodeRepository>) -> Self {
        Self { nodes }
    }

    /// Plans at most `config.max_depth` clauses of `message`.
    ///
    /// Step `n` depends on step `n - 1`; the first step has no
    /// dependencies. A message with no usable clause yields an empty
    /// pipeline.
    pub async fn decompose(
        &self,
        message: &str,
        session_id: PlanSessionId,
        state: &ObservedState,
        config: &PlannerConfig,
    ) -> Result<SubGoalPipeline, PlannerError> {
        let segments = split_compound_request(message);
        let mut steps = Vec::new();

        for (index, segment) in segments.into_iter().take(config.max_depth as usize).enumerate() {
            let depth = index as u32;
            let segment_state = state.with_message(segment.clone());
            let segment_belief = estimate_initial_belief(&segment_state);

            let action = generate_candidate_actions(&segment_state, &segment_belief, depth, config)
                .into_iter()
                .next()
                .unwrap_or_else(|| Action::clarify_intent(segment.clone()));
            let scored = score_action(&action, &segment_state, &segment_belief, config);

            let mut node = PlanNode::from_scored(session_id, None, depth, &scored);
            node.complete().map_err(|_| PlannerError::InvalidTransition {
                from: node.status().to_string(),
                to: NodeStatus::Completed.to_string(),
            })?;
            self.nodes.save(&node).await?;

            let step = index + 1;
            debug!(
                session_id = %session_id,
                step,
                action = %action.kind(),
                "Sub-goal planned"
            );

            steps.push(SubGoal {
                step,
                segment,
                node_id: *node.id(),
                scored,
                dependencies: SubGoalPipeline::linear_dependencies(step),
            });
        }

        Ok(SubGoalPipeline { steps })
    }
}
