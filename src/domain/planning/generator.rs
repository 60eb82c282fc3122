//! Candidate action generation from the current belief.

use super::action::Action;
use super::belief::{BeliefState, Intent};
use super::config::PlannerConfig;
use super::decomposition::{is_multi_clause, split_compound_request};
use super::observation::{CatalogItem, ObservedState};

const PURCHASE_THRESHOLD: f64 = 0.3;
const STRONG_PURCHASE_THRESHOLD: f64 = 0.5;
const CHECKOUT_THRESHOLD: f64 = 0.4;
const INFORMATION_THRESHOLD: f64 = 0.3;
const BROWSE_THRESHOLD: f64 = 0.3;
const SUPPORT_THRESHOLD: f64 = 0.4;
const CLARIFICATION_THRESHOLD: f64 = 0.5;

/// Messages longer than this (in characters) warrant a multi-step plan.
const LONG_MESSAGE_CHARS: usize = 100;

/// Proposes candidate actions for the given search depth.
///
/// Order of generation is the tie-break priority used downstream
/// (purchase and checkout first). The list is truncated, not ranked, to
/// `max_actions_to_consider` and may be empty.
pub fn generate_candidate_actions(
    state: &ObservedState,
    belief: &BeliefState,
    depth: u32,
    config: &PlannerConfig,
) -> Vec<Action> {
    let mut actions = Vec::new();
    let mut search_proposed = false;

    if belief.probability(Intent::Purchase) > PURCHASE_THRESHOLD {
        if let Some(item) = product_for_message(state) {
            actions.push(Action::add_to_cart(item, 1));
        }
        actions.push(Action::search_products(state.message.trim()));
        search_proposed = true;
    }

    if belief.probability(Intent::Checkout) > CHECKOUT_THRESHOLD
        || belief.probability(Intent::Purchase) > STRONG_PURCHASE_THRESHOLD
    {
        actions.push(Action::checkout());
    }

    if belief.probability(Intent::Information) > INFORMATION_THRESHOLD {
        actions.push(Action::answer_question(state.message.trim()));
    }

    if belief.probability(Intent::Browse) > BROWSE_THRESHOLD && !search_proposed {
        actions.push(Action::search_products(state.message.trim()));
    }

    if belief.probability(Intent::Support) > SUPPORT_THRESHOLD {
        actions.push(Action::escalate_human(format!(
            "Cliente pediu suporte: {}",
            state.message.trim()
        )));
    }

    if belief.probability(Intent::Clarification) > CLARIFICATION_THRESHOLD {
        actions.push(Action::clarify_intent(
            "Pode me contar um pouco mais sobre o que você procura?",
        ));
    }

    if depth == 0
        && (state.message_len() > LONG_MESSAGE_CHARS || is_multi_clause(&state.message))
    {
        actions.push(Action::multi_step_plan(split_compound_request(
            &state.message,
        )));
    }

    actions.truncate(config.max_actions_to_consider);
    actions
}

/// Catalog item named in the message, else the first catalog item.
fn product_for_message(state: &ObservedState) -> Option<&CatalogItem> {
    let text = state.normalized_message();
    state
        .catalog
        .iter()
        .find(|item| !item.name.is_empty() && text.contains(&item.name.to_lowercase()))
        .or_else(|| state.catalog.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::planning::action::{ActionKind, ActionParams};
    use crate::domain::planning::belief::estimate_initial_belief;
    use crate::domain::planning::observation::CartSummary;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem {
                id: "sku-1".to_string(),
                name: "Camiseta".to_string(),
                price: 59.9,
            },
            CatalogItem {
                id: "sku-2".to_string(),
                name: "Tênis".to_string(),
                price: 299.0,
            },
        ]
    }

    fn kinds(actions: &[Action]) -> Vec<ActionKind> {
        actions.iter().map(Action::kind).collect()
    }

    fn generate(state: &ObservedState, depth: u32) -> Vec<Action> {
        let belief = estimate_initial_belief(state);
        generate_candidate_actions(state, &belief, depth, &PlannerConfig::default())
    }

    #[test]
    fn purchase_message_proposes_cart_search_and_checkout() {
        let state = ObservedState::new("quero comprar um produto").with_catalog(catalog());

        let actions = generate(&state, 0);

        assert_eq!(
            kinds(&actions),
            vec![
                ActionKind::AddToCart,
                ActionKind::SearchProducts,
                ActionKind::Checkout
            ]
        );
    }

    #[test]
    fn add_to_cart_prefers_product_named_in_message() {
        let state = ObservedState::new("quero comprar o tênis").with_catalog(catalog());

        let actions = generate(&state, 0);

        match &actions[0].params {
            ActionParams::AddToCart { product_id, .. } => assert_eq!(product_id, "sku-2"),
            other => panic!("Expected AddToCart, got {:?}", other),
        }
    }

    #[test]
    fn empty_catalog_skips_add_to_cart() {
        let state = ObservedState::new("quero comprar um produto");
        let actions = generate(&state, 0);
        assert!(!kinds(&actions).contains(&ActionKind::AddToCart));
        assert!(kinds(&actions).contains(&ActionKind::SearchProducts));
    }

    #[test]
    fn short_message_proposes_clarification_only() {
        let state = ObservedState::new("ok");
        assert_eq!(kinds(&generate(&state, 0)), vec![ActionKind::ClarifyIntent]);
    }

    #[test]
    fn multi_clause_message_adds_plan_only_at_root_depth() {
        let state = ObservedState::new("quero ver camisetas e depois finalizar o pedido")
            .with_catalog(catalog())
            .with_cart(CartSummary {
                item_count: 1,
                total: 59.9,
                items: vec![],
            });

        let config = PlannerConfig {
            max_actions_to_consider: 10,
            ..Default::default()
        };
        let belief = estimate_initial_belief(&state);

        let at_root = generate_candidate_actions(&state, &belief, 0, &config);
        let deeper = generate_candidate_actions(&state, &belief, 1, &config);

        assert!(kinds(&at_root).contains(&ActionKind::MultiStepPlan));
        assert!(!kinds(&deeper).contains(&ActionKind::MultiStepPlan));
    }

    #[test]
    fn candidates_are_truncated_in_generation_order() {
        let state = ObservedState::new("quero comprar um produto").with_catalog(catalog());
        let belief = estimate_initial_belief(&state);
        let config = PlannerConfig {
            max_actions_to_consider: 2,
            ..Default::default()
        };

        let actions = generate_candidate_actions(&state, &belief, 0, &config);

        assert_eq!(
            kinds(&actions),
            vec![ActionKind::AddToCart, ActionKind::SearchProducts]
        );
    }

    #[test]
    fn neutral_long_message_can_yield_no_candidates() {
        let state = ObservedState::new("bom dia para você também pessoal");
        let actions = generate(&state, 1);
        assert!(actions.is_empty());
    }
}
