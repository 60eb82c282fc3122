//! Belief estimation over the customer's unobserved intent.
//!
//! Rule-based keyword detectors produce an unnormalized weight per intent;
//! the weights are normalized into a probability distribution. This stands
//! in for the belief state of a POMDP, it is not a calibrated filter.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

use super::action::Action;
use super::observation::ObservedState;

/// Number of prior beliefs kept for diagnostics.
pub const BELIEF_HISTORY_LIMIT: usize = 5;

/// Step applied to confidence/uncertainty after an observed outcome.
const OUTCOME_STEP: f64 = 0.1;

/// Messages shorter than this (in characters) look like clarification requests.
const SHORT_MESSAGE_CHARS: usize = 10;

/// Hypothesized customer intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Purchase,
    Information,
    Browse,
    Checkout,
    Support,
    Clarification,
}

impl Intent {
    /// Every intent, in a fixed order.
    pub const ALL: [Intent; 6] = [
        Intent::Purchase,
        Intent::Information,
        Intent::Browse,
        Intent::Checkout,
        Intent::Support,
        Intent::Clarification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Purchase => "purchase",
            Intent::Information => "information",
            Intent::Browse => "browse",
            Intent::Checkout => "checkout",
            Intent::Support => "support",
            Intent::Clarification => "clarification",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Probability per intent. Sums to one once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct IntentDistribution {
    pub purchase: f64,
    pub information: f64,
    pub browse: f64,
    pub checkout: f64,
    pub support: f64,
    pub clarification: f64,
}

impl IntentDistribution {
    /// Uniform distribution over every intent.
    pub fn uniform() -> Self {
        let p = 1.0 / Intent::ALL.len() as f64;
        Self {
            purchase: p,
            information: p,
            browse: p,
            checkout: p,
            support: p,
            clarification: p,
        }
    }

    pub fn get(&self, intent: Intent) -> f64 {
        match intent {
            Intent::Purchase => self.purchase,
            Intent::Information => self.information,
            Intent::Browse => self.browse,
            Intent::Checkout => self.checkout,
            Intent::Support => self.support,
            Intent::Clarification => self.clarification,
        }
    }

    fn set(&mut self, intent: Intent, value: f64) {
        match intent {
            Intent::Purchase => self.purchase = value,
            Intent::Information => self.information = value,
            Intent::Browse => self.browse = value,
            Intent::Checkout => self.checkout = value,
            Intent::Support => self.support = value,
            Intent::Clarification => self.clarification = value,
        }
    }

    pub fn sum(&self) -> f64 {
        Intent::ALL.iter().map(|i| self.get(*i)).sum()
    }

    /// Highest probability; the first intent in `Intent::ALL` wins ties.
    pub fn max(&self) -> (Intent, f64) {
        Intent::ALL
            .iter()
            .map(|i| (*i, self.get(*i)))
            .fold((Intent::Purchase, f64::MIN), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }

    /// Divides each weight by the total. A non-positive total yields the
    /// uniform distribution.
    fn normalized(weights: IntentDistribution) -> Self {
        let total = weights.sum();
        if !(total.is_finite() && total > 0.0) {
            return Self::uniform();
        }
        let mut out = Self::default();
        for intent in Intent::ALL {
            out.set(intent, weights.get(intent) / total);
        }
        out
    }
}

/// Frozen copy of a previous belief, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefSnapshot {
    pub probabilities: IntentDistribution,
    pub intent_confidence: f64,
    pub state_uncertainty: f64,
    pub recorded_at: Timestamp,
}

/// Distribution over intents plus two confidence metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefState {
    pub probabilities: IntentDistribution,
    pub intent_confidence: f64,
    /// `1 - max(probabilities)` at estimation time
    pub state_uncertainty: f64,
    #[serde(default)]
    pub history: Vec<BeliefSnapshot>,
}

impl BeliefState {
    pub fn probability(&self, intent: Intent) -> f64 {
        self.probabilities.get(intent)
    }

    pub fn dominant_intent(&self) -> Intent {
        self.probabilities.max().0
    }

    fn snapshot(&self) -> BeliefSnapshot {
        BeliefSnapshot {
            probabilities: self.probabilities,
            intent_confidence: self.intent_confidence,
            state_uncertainty: self.state_uncertainty,
            recorded_at: Timestamp::now(),
        }
    }
}

/// What happened after an action was executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ActionOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Some(detail.into()),
        }
    }
}

struct IntentDetector {
    intent: Intent,
    keywords: &'static [&'static str],
    fired_weight: f64,
    default_weight: f64,
    /// Counts towards intent confidence when it fires
    high_signal: bool,
}

const DETECTORS: [IntentDetector; 5] = [
    IntentDetector {
        intent: Intent::Purchase,
        keywords: &[
            "comprar", "quero", "adicionar", "carrinho", "pedir", "buy", "purchase",
            "add to cart", "order", "quiero",
        ],
        fired_weight: 0.8,
        default_weight: 0.1,
        high_signal: true,
    },
    IntentDetector {
        intent: Intent::Checkout,
        keywords: &[
            "finalizar", "pagar", "pagamento", "checkout", "fechar pedido", "pay", "payment",
        ],
        fired_weight: 0.9,
        default_weight: 0.05,
        high_signal: true,
    },
    IntentDetector {
        intent: Intent::Information,
        keywords: &[
            "?", "como", "qual", "quanto", "quando", "onde", "what", "how", "which", "price",
            "preço", "info", "cuánto",
        ],
        fired_weight: 0.7,
        default_weight: 0.15,
        high_signal: true,
    },
    IntentDetector {
        intent: Intent::Browse,
        keywords: &[
            "ver", "mostrar", "opções", "catálogo", "show", "browse", "list", "options",
            "catalog", "novidades",
        ],
        fired_weight: 0.6,
        default_weight: 0.1,
        high_signal: false,
    },
    IntentDetector {
        intent: Intent::Support,
        keywords: &[
            "problema", "reclamação", "reembolso", "devolução", "ajuda", "atendente", "help",
            "refund", "broken", "human", "humano",
        ],
        fired_weight: 0.8,
        default_weight: 0.05,
        high_signal: true,
    },
];

const CLARIFICATION_FIRED_WEIGHT: f64 = 0.9;
const CLARIFICATION_DEFAULT_WEIGHT: f64 = 0.1;

/// True when `keyword` occurs in `text` (already lower-cased).
///
/// Single words must match a whole word; phrases and punctuation match as
/// substrings.
pub(crate) fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.contains(' ') || !keyword.chars().all(char::is_alphanumeric) {
        return text.contains(keyword);
    }
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

/// Estimates the initial belief for an observation. Never fails.
pub fn estimate_initial_belief(state: &ObservedState) -> BeliefState {
    let text = state.normalized_message();
    let length = state.message_len();

    let mut weights = IntentDistribution::default();
    let mut high_signal_fired = false;

    for detector in &DETECTORS {
        let fired = detector
            .keywords
            .iter()
            .any(|keyword| contains_keyword(&text, keyword));
        high_signal_fired |= fired && detector.high_signal;
        let weight = if fired {
            detector.fired_weight
        } else {
            detector.default_weight
        };
        weights.set(detector.intent, weight);
    }

    let clarification = if length < SHORT_MESSAGE_CHARS {
        CLARIFICATION_FIRED_WEIGHT
    } else {
        CLARIFICATION_DEFAULT_WEIGHT
    };
    weights.set(Intent::Clarification, clarification);

    let probabilities = IntentDistribution::normalized(weights);
    let (_, max_probability) = probabilities.max();

    let length_bonus = (length as f64 / 100.0).min(0.4);
    let signal_bonus = if high_signal_fired { 0.3 } else { 0.0 };
    let intent_confidence = (0.3 + length_bonus + signal_bonus).min(1.0);

    BeliefState {
        probabilities,
        intent_confidence,
        state_uncertainty: 1.0 - max_probability,
        history: Vec::new(),
    }
}

/// Nudges the belief after an action's outcome is observed.
///
/// The previous belief is appended to the trailing history. Probabilities
/// are left as they were.
pub fn update_belief(belief: &BeliefState, action: &Action, outcome: &ActionOutcome) -> BeliefState {
    let mut history = belief.history.clone();
    history.push(belief.snapshot());
    if history.len() > BELIEF_HISTORY_LIMIT {
        let excess = history.len() - BELIEF_HISTORY_LIMIT;
        history.drain(..excess);
    }

    let step = if outcome.success {
        OUTCOME_STEP
    } else {
        -OUTCOME_STEP
    };

    tracing::debug!(
        action = %action.kind(),
        success = outcome.success,
        "Updating belief from action outcome"
    );

    BeliefState {
        probabilities: belief.probabilities,
        intent_confidence: (belief.intent_confidence + step).clamp(0.0, 1.0),
        state_uncertainty: (belief.state_uncertainty - step).clamp(0.0, 1.0),
        history,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn belief_for(message: &str) -> BeliefState {
        estimate_initial_belief(&ObservedState::new(message))
    }

    #[test]
    fn short_message_is_dominated_by_clarification() {
        let belief = belief_for("ok");

        assert_eq!(belief.dominant_intent(), Intent::Clarification);
        assert!(belief.probability(Intent::Clarification) > 0.6);
        assert!(belief.state_uncertainty > 0.3);
        assert!(belief.intent_confidence < 0.4);
    }

    #[test]
    fn purchase_keywords_favor_purchase() {
        let belief = belief_for("quero comprar um produto");

        assert_eq!(belief.dominant_intent(), Intent::Purchase);
        assert!(belief.probability(Intent::Purchase) > 0.5);
        assert!(belief.intent_confidence >= 0.6);
    }

    #[test]
    fn support_keywords_favor_support() {
        let belief = belief_for("meu pedido chegou com problema, preciso de ajuda");
        assert_eq!(belief.dominant_intent(), Intent::Support);
    }

    #[test]
    fn question_mark_fires_information() {
        let belief = belief_for("vocês entregam no sábado?");
        assert_eq!(belief.dominant_intent(), Intent::Information);
    }

    #[test]
    fn single_word_keywords_match_whole_words_only() {
        assert!(contains_keyword("quero ver opções", "ver"));
        assert!(!contains_keyword("camisa verde", "ver"));
        assert!(contains_keyword("can i add to cart now", "add to cart"));
        assert!(contains_keyword("tem azul?", "?"));
    }

    #[test]
    fn empty_message_still_yields_valid_distribution() {
        let belief = belief_for("");
        assert!((belief.probabilities.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_fallback_when_weights_are_zero() {
        let probabilities = IntentDistribution::normalized(IntentDistribution::default());
        assert_eq!(probabilities, IntentDistribution::uniform());
    }

    #[test]
    fn update_belief_success_raises_confidence() {
        let belief = belief_for("quero comprar um produto");
        let action = Action::checkout();

        let updated = update_belief(&belief, &action, &ActionOutcome::succeeded());

        assert!((updated.intent_confidence - (belief.intent_confidence + 0.1).min(1.0)).abs() < 1e-9);
        assert!((updated.state_uncertainty - (belief.state_uncertainty - 0.1).max(0.0)).abs() < 1e-9);
        assert_eq!(updated.probabilities, belief.probabilities);
        assert_eq!(updated.history.len(), 1);
    }

    #[test]
    fn update_belief_failure_lowers_confidence_and_clamps() {
        let mut belief = belief_for("ok");
        belief.intent_confidence = 0.05;
        belief.state_uncertainty = 0.95;

        let updated = update_belief(&belief, &Action::checkout(), &ActionOutcome::failed("timeout"));

        assert_eq!(updated.intent_confidence, 0.0);
        assert_eq!(updated.state_uncertainty, 1.0);
    }

    #[test]
    fn update_belief_caps_history() {
        let mut belief = belief_for("ok");
        for _ in 0..8 {
            belief = update_belief(&belief, &Action::checkout(), &ActionOutcome::succeeded());
        }
        assert_eq!(belief.history.len(), BELIEF_HISTORY_LIMIT);
    }

    proptest! {
        #[test]
        fn probabilities_always_sum_to_one(message in ".{0,200}") {
            let belief = belief_for(&message);
            prop_assert!((belief.probabilities.sum() - 1.0).abs() < 1e-6);
            for intent in Intent::ALL {
                let p = belief.probability(intent);
                prop_assert!((0.0..=1.0).contains(&p));
            }
            prop_assert!((0.0..=1.0).contains(&belief.intent_confidence));
            prop_assert!((0.0..=1.0).contains(&belief.state_uncertainty));
        }
    }
}
