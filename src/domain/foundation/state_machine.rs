//! State machine trait for status enums.
//!
//! Gives lifecycle enums (such as a search-tree node status) one way to
//! validate and perform transitions.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors list the legal targets of each state and get validated
/// transitions for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for NodeStatus {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Pending => vec![Completed, Pruned],
///             Completed | Pruned => vec![],
///         }
///     }
/// }
///
/// let next = node.status().transition_to(NodeStatus::Pruned)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum JobStatus {
        Queued,
        Running,
        Done,
        Dropped,
    }

    impl StateMachine for JobStatus {
        fn valid_transitions(&self) -> Vec<Self> {
            use JobStatus::*;
            match self {
                Queued => vec![Running, Dropped],
                Running => vec![Done],
                Done | Dropped => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(
            JobStatus::Queued.transition_to(JobStatus::Running),
            Ok(JobStatus::Running)
        );
    }

    #[test]
    fn transition_to_fails_for_invalid_transition() {
        assert!(JobStatus::Queued.transition_to(JobStatus::Done).is_err());
        assert!(JobStatus::Done.transition_to(JobStatus::Queued).is_err());
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Dropped.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }
}
