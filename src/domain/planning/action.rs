//! Actions the agent can take and their scored form.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::observation::CatalogItem;

/// Discriminant of [`ActionParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AnswerQuestion,
    SearchProducts,
    AddToCart,
    Checkout,
    EscalateHuman,
    ClarifyIntent,
    MultiStepPlan,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::AnswerQuestion => "answer_question",
            ActionKind::SearchProducts => "search_products",
            ActionKind::AddToCart => "add_to_cart",
            ActionKind::Checkout => "checkout",
            ActionKind::EscalateHuman => "escalate_human",
            ActionKind::ClarifyIntent => "clarify_intent",
            ActionKind::MultiStepPlan => "multi_step_plan",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific parameters of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionParams {
    AnswerQuestion {
        question: String,
    },
    SearchProducts {
        query: String,
    },
    AddToCart {
        product_id: String,
        product_name: String,
        quantity: u32,
    },
    Checkout,
    EscalateHuman {
        reason: String,
    },
    ClarifyIntent {
        question: String,
    },
    MultiStepPlan {
        steps: Vec<String>,
    },
}

impl ActionParams {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionParams::AnswerQuestion { .. } => ActionKind::AnswerQuestion,
            ActionParams::SearchProducts { .. } => ActionKind::SearchProducts,
            ActionParams::AddToCart { .. } => ActionKind::AddToCart,
            ActionParams::Checkout => ActionKind::Checkout,
            ActionParams::EscalateHuman { .. } => ActionKind::EscalateHuman,
            ActionParams::ClarifyIntent { .. } => ActionKind::ClarifyIntent,
            ActionParams::MultiStepPlan { .. } => ActionKind::MultiStepPlan,
        }
    }
}

/// An action the agent could take next. Immutable value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub params: ActionParams,
    pub description: String,
    /// Estimated complexity in [0, 1]
    pub complexity: f64,
}

impl Action {
    pub fn new(params: ActionParams, description: impl Into<String>, complexity: f64) -> Self {
        Self {
            params,
            description: description.into(),
            complexity: complexity.clamp(0.0, 1.0),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.params.kind()
    }

    pub fn answer_question(question: impl Into<String>) -> Self {
        Self::new(
            ActionParams::AnswerQuestion {
                question: question.into(),
            },
            "Responder à pergunta do cliente com base no conhecimento disponível",
            0.3,
        )
    }

    pub fn search_products(query: impl Into<String>) -> Self {
        Self::new(
            ActionParams::SearchProducts {
                query: query.into(),
            },
            "Buscar produtos no catálogo",
            0.2,
        )
    }

    pub fn add_to_cart(item: &CatalogItem, quantity: u32) -> Self {
        Self::new(
            ActionParams::AddToCart {
                product_id: item.id.clone(),
                product_name: item.name.clone(),
                quantity,
            },
            format!("Adicionar {} ao carrinho", item.name),
            0.3,
        )
    }

    pub fn checkout() -> Self {
        Self::new(ActionParams::Checkout, "Finalizar o pedido", 0.4)
    }

    pub fn escalate_human(reason: impl Into<String>) -> Self {
        Self::new(
            ActionParams::EscalateHuman {
                reason: reason.into(),
            },
            "Transferir para um atendente humano",
            0.5,
        )
    }

    pub fn clarify_intent(question: impl Into<String>) -> Self {
        Self::new(
            ActionParams::ClarifyIntent {
                question: question.into(),
            },
            "Pedir esclarecimento sobre o que o cliente deseja",
            0.1,
        )
    }

    pub fn multi_step_plan(steps: Vec<String>) -> Self {
        Self::new(
            ActionParams::MultiStepPlan { steps },
            "Dividir a solicitação em etapas",
            0.8,
        )
    }
}

/// Closed interval `[min, max]` within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub min: f64,
    pub max: f64,
}

impl ConfidenceInterval {
    /// `[score − margin, score + margin]` with each bound clamped to [0, 1].
    pub fn around(score: f64, margin: f64) -> Self {
        Self {
            min: (score - margin).clamp(0.0, 1.0),
            max: (score + margin).clamp(0.0, 1.0),
        }
    }
}

/// An action with its scores. Produced fresh by the scorer, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAction {
    pub action: Action,
    pub q_value: f64,
    pub risk: f64,
    pub explainability: f64,
    /// Weighted combination; unbounded and signed
    pub score: f64,
    pub rationale: String,
    pub confidence_interval: ConfidenceInterval,
}
