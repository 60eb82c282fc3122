//! RecordActionOutcomeHandler - feeds an executed action's result back
//! into the session belief.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{ErrorCode, PlanSessionId};
use crate::domain::planning::{update_belief, Action, ActionOutcome, BeliefState, PlannerError};
use crate::ports::PlanSessionRepository;

/// Command to record the outcome of an action the agent executed.
#[derive(Debug, Clone)]
pub struct RecordActionOutcomeCommand {
    pub session_id: PlanSessionId,
    pub action: Action,
    pub outcome: ActionOutcome,
}

/// Result of recording an outcome.
#[derive(Debug, Clone)]
pub struct RecordActionOutcomeResult {
    pub belief: BeliefState,
    pub completed_actions: u32,
}

/// Handler for recording action outcomes.
pub struct RecordActionOutcomeHandler {
    sessions: Arc<dyn PlanSessionRepository>,
}

impl RecordActionOutcomeHandler {
    pub fn new(sessions: Arc<dyn PlanSessionRepository>) -> Self {
        Self { sessions }
    }

    pub async fn handle(
        &self,
        cmd: RecordActionOutcomeCommand,
    ) -> Result<RecordActionOutcomeResult, PlannerError> {
        let mut session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or(PlannerError::SessionNotFound(cmd.session_id))?;

        let belief = update_belief(session.belief(), &cmd.action, &cmd.outcome);
        session
            .apply_outcome(belief, cmd.outcome.success)
            .map_err(|e| match e.code {
                ErrorCode::SessionExpired => PlannerError::SessionExpired(cmd.session_id),
                _ => PlannerError::from(e),
            })?;
        self.sessions.update(&session).await?;

        info!(
            session_id = %cmd.session_id,
            action = %cmd.action.kind(),
            success = cmd.outcome.success,
            "Action outcome recorded"
        );

        Ok(RecordActionOutcomeResult {
            belief: session.belief().clone(),
            completed_actions: session.completed_actions(),
        })
    }
}
