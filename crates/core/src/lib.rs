//! Quote pricing & generation pipeline.
//!
//! Turns a free-text project description plus a handful of hints into a
//! priced, weighted set of line items, validated against sector price bands
//! and optionally blended with the requester's pricing history. External
//! text/embedding capabilities are optional: every stage has a
//! deterministic local tier.

pub mod audit;
pub mod capabilities;
pub mod classifier;
pub mod config;
pub mod context;
pub mod distribution;
pub mod domain;
pub mod errors;
pub mod estimator;
pub mod history;
pub mod pipeline;
pub mod prompts;
pub mod sectors;
pub mod templates;
pub mod text;
pub mod validation;

pub use audit::{FallbackTier, GenerationAudit, GenerationStage, SectorSource};
pub use capabilities::{
    CompletionRequest, DisabledCapability, Embedder, Payload, TextGenerator,
};
pub use classifier::SectorClassifier;
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, EngineConfig, HistoryPolicy, LlmConfig, LlmProvider,
    LoadOptions, LogFormat, NudgeRules,
};
pub use context::ContextExtractor;
pub use distribution::{DistributionItem, DistributionOptions, PriceDistributor};
pub use domain::context::{ClientProfile, ProjectContext, Scale, SoftwareComplexity};
pub use domain::estimate::{AppliedMultiplier, CostEstimate, RangeValidation, TicketBand};
pub use domain::history::{PriceSuggestion, QuoteHistoryEntry, SimilarQuote};
pub use domain::item::{DistributionResult, QuoteItem};
pub use domain::quote::{GeneratedQuote, QualityTier, QuoteRequest, UserItem};
pub use domain::sector::Sector;
pub use errors::{CapabilityError, Rejection, RejectionReason, StoreError};
pub use estimator::CostEstimator;
pub use history::{HistoryMatcher, HistoryStore, InMemoryHistoryStore};
pub use pipeline::{Orchestrator, PipelineFault};
pub use templates::TemplateEngine;
