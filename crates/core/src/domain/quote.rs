use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::GenerationAudit;
use crate::domain::context::ClientProfile;
use crate::domain::item::QuoteItem;
use crate::domain::sector::Sector;

/// Requested finish level. Maps to a margin offset in the distributor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Basic,
    #[default]
    Standard,
    Premium,
}

impl QualityTier {
    pub fn margin_offset(&self) -> f64 {
        match self {
            QualityTier::Basic => -0.05,
            QualityTier::Standard => 0.0,
            QualityTier::Premium => 0.07,
        }
    }
}

/// A caller-supplied line item. Unit price may be missing; the pipeline
/// distributes the remaining budget across priceless items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Option<Decimal>,
}

/// Everything the caller can tell us about the project.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub description: String,
    pub client_name: String,
    pub price_range: Option<String>,
    pub sector_hint: Option<Sector>,
    pub user_items: Option<Vec<UserItem>>,
    pub quality: Option<QualityTier>,
    pub location_hint: Option<String>,
    pub owner_id: Option<String>,
    pub client_profile: Option<ClientProfile>,
    pub project_type: Option<String>,
    pub region: Option<String>,
    pub tax_percent: Option<f64>,
}

impl QuoteRequest {
    pub fn new(description: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self { description: description.into(), client_name: client_name.into(), ..Self::default() }
    }
}

/// A complete, priced quote ready for delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuote {
    pub id: Uuid,
    pub title: String,
    pub sector: Sector,
    pub client_name: String,
    pub items: Vec<QuoteItem>,
    pub subtotal: Decimal,
    pub tax_percent: f64,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub valid_until: DateTime<Utc>,
    pub terms: Vec<String>,
    pub timeline: String,
    pub summary: String,
    pub audit: GenerationAudit,
}

impl GeneratedQuote {
    pub fn line_count(&self) -> usize {
        self.items.len()
    }
}
