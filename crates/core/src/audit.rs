//! Per-quote provenance metadata.
//!
//! Every external capability call can silently degrade to a deterministic
//! local tier; the audit records which tier actually produced each artifact
//! so fallbacks stay observable instead of implicit in control flow.

use serde::{Deserialize, Serialize};

use crate::domain::estimate::CostEstimate;
use crate::domain::history::PriceSuggestion;

/// Which strategy produced an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTier {
    External,
    Local,
}

/// How the sector was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorSource {
    Caller,
    ExternalClassifier,
    KeywordClassifier,
}

/// Pipeline stages that can fall back to a local strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Classification,
    ItemContextualization,
    Enrichment,
    Embedding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: GenerationStage,
    pub tier: FallbackTier,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationAudit {
    pub sector_source: Option<SectorSource>,
    pub stages: Vec<StageRecord>,
    pub estimate: Option<CostEstimate>,
    pub distribution_weights: Vec<f64>,
    pub suggestion: Option<PriceSuggestion>,
    pub history_blended: bool,
    /// Whether the distributor applied the cosmetic grand-total shift.
    pub aesthetic_adjusted: bool,
    /// True when an unexpected fault rerouted the whole pipeline onto the
    /// deterministic local path.
    pub rerouted_to_local: bool,
}

impl GenerationAudit {
    pub fn record(&mut self, stage: GenerationStage, tier: FallbackTier) {
        self.stages.push(StageRecord { stage, tier });
    }

    pub fn tier_for(&self, stage: GenerationStage) -> Option<FallbackTier> {
        self.stages.iter().rev().find(|record| record.stage == stage).map(|record| record.tier)
    }

    pub fn used_local_fallback(&self) -> bool {
        self.rerouted_to_local
            || self.stages.iter().any(|record| record.tier == FallbackTier::Local)
    }
}
