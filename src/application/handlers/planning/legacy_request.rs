//! Legacy request shape for the planning entry point.
//!
//! Older callers send a loose JSON record where every field may be missing
//! and the cart total may arrive as a string. It is normalized into a
//! `PlanActionCommand` and planned like any other request.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, CustomerId, TenantId};
use crate::domain::planning::{
    CartLine, CartSummary, CatalogItem, Channel, ConversationTurn, ObservedState, PlannerConfig,
    PlannerError, Speaker,
};

use super::{PlanActionCommand, PlanActionHandler, PlanActionResult, TenantContext};

/// A number that may be sent as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseAmount {
    Number(f64),
    Text(String),
}

impl LooseAmount {
    /// Numeric value; text that does not parse as a finite number is 0.
    pub fn value(&self) -> f64 {
        let value = match self {
            LooseAmount::Number(n) => *n,
            LooseAmount::Text(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyCartItem {
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<LooseAmount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyCart {
    pub items: Vec<LegacyCartItem>,
    pub item_count: Option<u32>,
    pub total: Option<LooseAmount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyCatalogItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<LooseAmount>,
}

/// Planning request in the legacy shape. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyPlanRequest {
    pub message: Option<String>,
    /// Prior customer messages, oldest first
    pub history: Vec<String>,
    pub cart: Option<LegacyCart>,
    pub catalog: Vec<LegacyCatalogItem>,
    pub knowledge: Vec<String>,
    pub preferences: Vec<String>,
    pub channel: Option<String>,
    pub tenant_id: Option<String>,
    pub conversation_id: Option<String>,
    pub customer_id: Option<String>,
    pub config: Option<PlannerConfig>,
}

impl LegacyPlanRequest {
    /// Normalizes the request. Never fails: blank ids are dropped and
    /// unreadable amounts become zero.
    pub fn into_command(self) -> PlanActionCommand {
        let history = self
            .history
            .into_iter()
            .map(|text| ConversationTurn {
                speaker: Speaker::Customer,
                text,
            })
            .collect();

        let catalog = self
            .catalog
            .into_iter()
            .filter_map(|item| {
                let id = item.id.filter(|id| !id.trim().is_empty())?;
                Some(CatalogItem {
                    name: item.name.unwrap_or_else(|| id.clone()),
                    price: item.price.map(|p| p.value()).unwrap_or(0.0),
                    id,
                })
            })
            .collect();

        let mut state = ObservedState::new(self.message.unwrap_or_default())
            .with_cart(self.cart.map(normalize_cart).unwrap_or_default())
            .with_catalog(catalog)
            .with_knowledge(self.knowledge)
            .with_channel(
                self.channel
                    .as_deref()
                    .map(Channel::parse_lenient)
                    .unwrap_or_default(),
            );
        state.history = history;
        state.preferences = self.preferences;

        PlanActionCommand {
            state,
            context: TenantContext {
                tenant_id: self.tenant_id.and_then(|id| TenantId::new(id).ok()),
                conversation_id: self.conversation_id.and_then(|id| ConversationId::new(id).ok()),
                customer_id: self.customer_id.and_then(|id| CustomerId::new(id).ok()),
            },
            config: self.config,
        }
    }
}

fn normalize_cart(cart: LegacyCart) -> CartSummary {
    let items: Vec<CartLine> = cart
        .items
        .into_iter()
        .map(|item| CartLine {
            product_id: item.product_id.unwrap_or_default(),
            name: item.name.unwrap_or_default(),
            quantity: item.quantity.unwrap_or(1),
            unit_price: item.price.map(|p| p.value()).unwrap_or(0.0),
        })
        .collect();

    let derived = CartSummary::from_lines(items);
    CartSummary {
        item_count: cart.item_count.unwrap_or(derived.item_count),
        total: cart.total.map(|t| t.value()).unwrap_or(derived.total),
        items: derived.items,
    }
}

impl PlanActionHandler {
    /// Plans a legacy-shaped request.
    ///
    /// # Errors
    ///
    /// Same as [`PlanActionHandler::handle`].
    pub async fn handle_legacy(
        &self,
        request: LegacyPlanRequest,
    ) -> Result<PlanActionResult, PlannerError> {
        self.handle(request.into_command()).await
    }
}
