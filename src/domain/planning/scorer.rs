//! Multi-criteria action scoring.
//!
//! Each action gets three bounded components (expected utility, risk,
//! explainability) which are combined with the configured weights into an
//! unbounded score:
//!
//! ```text
//! score = w.utility · q − w.risk · risk + w.explainability · explainability
//! ```
//!
//! The combined score is deliberately left unclamped; comparisons across
//! actions and against the pruning threshold rely on the raw value.

use super::action::{Action, ActionKind, ActionParams, ConfidenceInterval, ScoredAction};
use super::belief::{contains_keyword, BeliefState, Intent};
use super::config::PlannerConfig;
use super::observation::ObservedState;

/// Carts above this many items make adding more less useful.
const CROWDED_CART_ITEMS: u32 = 5;

const CART_RISK_TIERS: [(f64, f64); 2] = [(1000.0, 0.3), (5000.0, 0.3)];
const CHECKOUT_RISK_TIERS: [(f64, f64); 2] = [(500.0, 0.2), (2000.0, 0.3)];

const SENSITIVE_KEYWORDS: [&str; 6] = [
    "reembolso", "estorno", "fraude", "refund", "fraud", "chargeback",
];

/// Interval half-width per unit of state uncertainty.
const INTERVAL_SCALE: f64 = 0.2;

/// Scores one action against the observed state. Deterministic.
pub fn score_action(
    action: &Action,
    state: &ObservedState,
    belief: &BeliefState,
    config: &PlannerConfig,
) -> ScoredAction {
    let q_value = q_value(action, state, belief).clamp(0.0, 1.0);
    let risk = risk(action, state, belief).clamp(0.0, 1.0);
    let explainability = explainability(action, state, belief).clamp(0.0, 1.0);

    let weights = &config.weights;
    let score = weights.utility * q_value - weights.risk * risk
        + weights.explainability * explainability;

    let confidence_interval =
        ConfidenceInterval::around(score, belief.state_uncertainty * INTERVAL_SCALE);

    let rationale = format!(
        "{}: utilidade {:.2}, risco {:.2}, explicabilidade {:.2} (intenção dominante: {})",
        action.kind(),
        q_value,
        risk,
        explainability,
        belief.dominant_intent()
    );

    ScoredAction {
        action: action.clone(),
        q_value,
        risk,
        explainability,
        score,
        rationale,
        confidence_interval,
    }
}

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn tiered(amount: f64, tiers: &[(f64, f64)]) -> f64 {
    tiers
        .iter()
        .filter(|(threshold, _)| amount > *threshold)
        .map(|(_, penalty)| penalty)
        .sum()
}

fn names_product(state: &ObservedState, product_name: &str) -> bool {
    !product_name.is_empty()
        && state
            .normalized_message()
            .contains(&product_name.to_lowercase())
}

fn q_value(action: &Action, state: &ObservedState, belief: &BeliefState) -> f64 {
    match &action.params {
        ActionParams::AddToCart { product_name, .. } => {
            0.3 + 0.5 * belief.probability(Intent::Purchase)
                + 0.2 * indicator(names_product(state, product_name))
                - 0.2 * indicator(state.cart.item_count > CROWDED_CART_ITEMS)
        }
        ActionParams::SearchProducts { .. } => {
            0.2 + 0.4 * belief.probability(Intent::Browse)
                + 0.3 * belief.probability(Intent::Purchase)
        }
        ActionParams::Checkout => {
            if state.cart.is_empty() {
                0.0
            } else {
                0.4 + 0.6 * belief.probability(Intent::Checkout)
            }
        }
        ActionParams::AnswerQuestion { .. } => {
            0.2 + 0.7 * belief.probability(Intent::Information)
                + 0.1 * indicator(!state.knowledge.is_empty())
        }
        ActionParams::EscalateHuman { .. } => 0.1 + 0.8 * belief.probability(Intent::Support),
        ActionParams::ClarifyIntent { .. } => 0.3 * belief.state_uncertainty,
        ActionParams::MultiStepPlan { .. } => 0.2 + 0.4 * belief.intent_confidence,
    }
}

fn risk(action: &Action, state: &ObservedState, belief: &BeliefState) -> f64 {
    match &action.params {
        ActionParams::AddToCart { .. } => {
            0.1 + tiered(state.cart.total, &CART_RISK_TIERS)
                + 0.2 * (1.0 - belief.intent_confidence)
        }
        ActionParams::Checkout => 0.2 + tiered(state.cart.total, &CHECKOUT_RISK_TIERS),
        ActionParams::AnswerQuestion { .. } => {
            let text = state.normalized_message();
            let sensitive = SENSITIVE_KEYWORDS
                .iter()
                .any(|keyword| contains_keyword(&text, keyword));
            0.05 + 0.4 * indicator(sensitive)
        }
        ActionParams::SearchProducts { .. } => 0.05,
        ActionParams::EscalateHuman { .. } => 0.15,
        ActionParams::ClarifyIntent { .. } => 0.05,
        ActionParams::MultiStepPlan { .. } => 0.2 + 0.2 * action.complexity,
    }
}

/// Intent an action answers to, for the explainability bonus.
fn relevant_probability(kind: ActionKind, belief: &BeliefState) -> f64 {
    match kind {
        ActionKind::AddToCart | ActionKind::Checkout => belief
            .probability(Intent::Purchase)
            .max(belief.probability(Intent::Checkout)),
        ActionKind::SearchProducts => belief.probability(Intent::Browse),
        ActionKind::AnswerQuestion => belief.probability(Intent::Information),
        ActionKind::EscalateHuman => belief.probability(Intent::Support),
        ActionKind::ClarifyIntent => belief.probability(Intent::Clarification),
        ActionKind::MultiStepPlan => belief.probabilities.max().1,
    }
}

fn kind_keywords(kind: ActionKind) -> &'static [&'static str] {
    match kind {
        ActionKind::AddToCart => &["carrinho", "adicionar", "cart", "add"],
        ActionKind::Checkout => &["finalizar", "pagar", "checkout", "pay"],
        ActionKind::SearchProducts => &["ver", "buscar", "procurar", "show", "search", "find"],
        ActionKind::AnswerQuestion => &["?", "como", "qual", "what", "how"],
        ActionKind::EscalateHuman => &["atendente", "humano", "human", "agent"],
        ActionKind::ClarifyIntent => &[],
        ActionKind::MultiStepPlan => &["depois", "then", "também", "also"],
    }
}

fn explainability(action: &Action, state: &ObservedState, belief: &BeliefState) -> f64 {
    let kind = action.kind();
    let text = state.normalized_message();
    let keyword_present = kind_keywords(kind)
        .iter()
        .any(|keyword| contains_keyword(&text, keyword))
        || match &action.params {
            ActionParams::AddToCart { product_name, .. } => names_product(state, product_name),
            _ => false,
        };

    0.5 + 0.2 * indicator(action.complexity < 0.3) - 0.2 * indicator(action.complexity > 0.7)
        + 0.2 * relevant_probability(kind, belief)
        + 0.1 * indicator(keyword_present)
}
