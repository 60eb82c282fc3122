//! Planner tunables.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Longest accepted session time-to-live: one year.
pub const MAX_SESSION_TIMEOUT_MINUTES: i64 = 60 * 24 * 365;

/// Weights of the combined score `utility·q − risk·r + explainability·e`.
///
/// The weights are applied as given; they do not need to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_utility_weight")]
    pub utility: f64,
    #[serde(default = "default_risk_weight")]
    pub risk: f64,
    #[serde(default = "default_explainability_weight")]
    pub explainability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            utility: default_utility_weight(),
            risk: default_risk_weight(),
            explainability: default_explainability_weight(),
        }
    }
}

/// Fixed tunables of one planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Scoring weights
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Branching factor: candidates kept per expansion
    #[serde(default = "default_max_actions")]
    pub max_actions_to_consider: usize,

    /// Deepest level a node may be expanded from
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// UCB1 exploration constant. Kept for configuration compatibility;
    /// the frontier ordering does not read it.
    #[serde(default = "default_exploration_factor")]
    pub exploration_factor: f64,

    /// Nodes scoring below this are pruned instead of expanded
    #[serde(default = "default_pruning_threshold")]
    pub pruning_threshold: f64,

    /// Session time-to-live in minutes
    #[serde(default = "default_session_timeout")]
    pub session_timeout_minutes: i64,
}

impl PlannerConfig {
    /// Upper bound on `expand_frontier` calls per planning call.
    pub fn expansion_budget(&self) -> usize {
        self.max_actions_to_consider
            .saturating_mul(self.max_depth as usize)
    }

    /// Validate planner tunables
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("weights.utility", self.weights.utility),
            ("weights.risk", self.weights.risk),
            ("weights.explainability", self.weights.explainability),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::out_of_range(field, 0.0, f64::MAX, value));
            }
        }
        if self.max_actions_to_consider == 0 {
            return Err(ValidationError::out_of_range(
                "max_actions_to_consider",
                1.0,
                f64::MAX,
                0.0,
            ));
        }
        if self.max_depth == 0 {
            return Err(ValidationError::out_of_range("max_depth", 1.0, f64::MAX, 0.0));
        }
        if !self.pruning_threshold.is_finite() {
            return Err(ValidationError::invalid_format(
                "pruning_threshold",
                "must be a finite number",
            ));
        }
        if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&self.session_timeout_minutes) {
            return Err(ValidationError::out_of_range(
                "session_timeout_minutes",
                1.0,
                MAX_SESSION_TIMEOUT_MINUTES as f64,
                self.session_timeout_minutes as f64,
            ));
        }
        Ok(())
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            max_actions_to_consider: default_max_actions(),
            max_depth: default_max_depth(),
            exploration_factor: default_exploration_factor(),
            pruning_threshold: default_pruning_threshold(),
            session_timeout_minutes: default_session_timeout(),
        }
    }
}

fn default_utility_weight() -> f64 {
    0.5
}

fn default_risk_weight() -> f64 {
    0.3
}

fn default_explainability_weight() -> f64 {
    0.2
}

fn default_max_actions() -> usize {
    5
}

fn default_max_depth() -> u32 {
    3
}

fn default_exploration_factor() -> f64 {
    1.414
}

fn default_pruning_threshold() -> f64 {
    0.1
}

fn default_session_timeout() -> i64 {
    30
}
