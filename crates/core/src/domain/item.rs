use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest accepted line-item description.
pub const MAX_ITEM_DESCRIPTION_CHARS: usize = 280;

/// A priced line item. `total` is always derived from quantity and unit
/// price; it is never stored independently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl QuoteItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        let mut description: String = description.into();
        if description.chars().count() > MAX_ITEM_DESCRIPTION_CHARS {
            description = description.chars().take(MAX_ITEM_DESCRIPTION_CHARS).collect();
        }
        Self { description, quantity: quantity.max(1), unit_price }
    }

    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Result of distributing a target total across line items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistributionResult {
    pub items: Vec<QuoteItem>,
    pub aesthetic_adjusted: bool,
    /// Normalized weights actually used, kept for audit metadata.
    pub weights: Vec<f64>,
}

impl DistributionResult {
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(QuoteItem::total).sum()
    }
}
