//! The observed state handed to the planner for one planning step.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Messaging channel the observation arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Whatsapp,
    #[default]
    Web,
    Email,
    Api,
}

impl Channel {
    /// Parses a loosely formatted channel name, defaulting to `Web`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "whatsapp" | "wa" => Channel::Whatsapp,
            "email" | "e-mail" => Channel::Email,
            "api" => Channel::Api,
            _ => Channel::Web,
        }
    }
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Customer,
    Agent,
}

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// A line in the customer's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Summary of the customer's cart at observation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CartSummary {
    pub item_count: u32,
    pub total: f64,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl CartSummary {
    /// Builds a summary from cart lines, deriving count and total.
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let item_count = items
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity));
        let total = items
            .iter()
            .map(|line| line.unit_price * f64::from(line.quantity))
            .sum();
        Self {
            item_count,
            total,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

/// A product the agent can offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// Immutable input snapshot of one planning step.
///
/// Owned by the caller; the planner only borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedState {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub cart: CartSummary,
    #[serde(default)]
    pub catalog: Vec<CatalogItem>,
    /// Knowledge-base excerpts retrieved for this message
    #[serde(default)]
    pub knowledge: Vec<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub channel: Channel,
    pub captured_at: Timestamp,
}

impl ObservedState {
    /// Creates a snapshot holding only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            cart: CartSummary::default(),
            catalog: Vec::new(),
            knowledge: Vec::new(),
            preferences: Vec::new(),
            channel: Channel::default(),
            captured_at: Timestamp::now(),
        }
    }

    pub fn with_cart(mut self, cart: CartSummary) -> Self {
        self.cart = cart;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogItem>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_knowledge(mut self, knowledge: Vec<String>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Copy of this snapshot with the message replaced; used to plan a
    /// single segment of a compound request.
    pub fn with_message(&self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self.clone()
        }
    }

    /// Lower-cased message text.
    pub fn normalized_message(&self) -> String {
        self.message.to_lowercase()
    }

    /// Message length in characters, ignoring surrounding whitespace.
    pub fn message_len(&self) -> usize {
        self.message.trim().chars().count()
    }
}
