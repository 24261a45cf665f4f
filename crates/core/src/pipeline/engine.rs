//! The generation orchestrator.
//!
//! Linear stage sequence: validate → resolve sector → source items (user or
//! generated) → estimate → blend with history → distribute → package. Only
//! the first two stages can reject; every later fault reroutes onto the
//! deterministic local path so the caller always receives a complete quote
//! or a structured rejection, never an error.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::audit::{FallbackTier, GenerationAudit, GenerationStage, SectorSource};
use crate::capabilities::{Embedder, Payload, TextGenerator};
use crate::classifier::SectorClassifier;
use crate::config::EngineConfig;
use crate::context::ContextExtractor;
use crate::distribution::{DistributionItem, DistributionOptions, PriceDistributor};
use crate::domain::context::ProjectContext;
use crate::domain::estimate::CostEstimate;
use crate::domain::history::{PriceSuggestion, QuoteHistoryEntry};
use crate::domain::item::QuoteItem;
use crate::domain::quote::{GeneratedQuote, QuoteRequest, UserItem};
use crate::domain::sector::Sector;
use crate::errors::{CapabilityError, Rejection, RejectionReason};
use crate::estimator::CostEstimator;
use crate::history::{HistoryMatcher, HistoryStore};
use crate::prompts;
use crate::sectors;
use crate::templates::{contextualize_concept, format_amount, TemplateEngine};
use crate::validation;

use super::fallback::with_local_fallback;

/// Internal fault that reroutes the pipeline onto the local path. Never
/// surfaces to the caller.
#[derive(Debug, Error)]
#[error("pipeline fault: {0}")]
pub struct PipelineFault(String);

/// Construction sub-types priced as design-practice deliverables; they use
/// the positional weight table instead of keyword weights.
const DESIGN_PRACTICE_TYPES: &[&str] = &["anteproyecto", "proyecto basico"];

pub struct Orchestrator {
    config: EngineConfig,
    extractor: ContextExtractor,
    classifier: SectorClassifier,
    estimator: CostEstimator,
    distributor: PriceDistributor,
    matcher: HistoryMatcher,
    templates: TemplateEngine,
    generator: Option<Arc<dyn TextGenerator>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl Orchestrator {
    pub fn new(config: EngineConfig, store: Arc<dyn HistoryStore>) -> Self {
        Self {
            extractor: ContextExtractor::new(),
            classifier: SectorClassifier::new(),
            estimator: CostEstimator::new(config.clone()),
            distributor: PriceDistributor::new(config.clone()),
            matcher: HistoryMatcher::new(store, config.history.clone()),
            templates: TemplateEngine::new(),
            generator: None,
            embedder: None,
            config,
        }
    }

    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Generate a complete quote for the request, or a structured
    /// rejection. This is the only entry point of the pipeline.
    pub async fn generate_quote(
        &self,
        request: QuoteRequest,
    ) -> Result<GeneratedQuote, Rejection> {
        validation::validate_description(&request.description)?;

        let mut audit = GenerationAudit::default();
        let sector = self.resolve_sector(&request, &mut audit).await?;
        let context = self.extractor.extract(
            &request.description,
            request.price_range.as_deref(),
            request.location_hint.as_deref(),
            Some(sector),
        );

        let quote = match self.run_pipeline(&request, sector, &context, audit.clone()).await {
            Ok(quote) => quote,
            Err(fault) => {
                error!(%fault, "pipeline fault; rerouting to the local path");
                audit.rerouted_to_local = true;
                self.local_fallback_quote(&request, sector, &context, audit)
            }
        };

        info!(
            quote_id = %quote.id,
            sector = sector.key(),
            total = %quote.total,
            fallback = quote.audit.used_local_fallback(),
            "quote generated"
        );
        self.record_generation(&request, &quote).await;
        Ok(quote)
    }

    /// Caller-supplied sectors are trusted; otherwise classify, and reject
    /// generic results that do not look like a plausible request.
    async fn resolve_sector(
        &self,
        request: &QuoteRequest,
        audit: &mut GenerationAudit,
    ) -> Result<Sector, Rejection> {
        if let Some(sector) = request.sector_hint {
            audit.sector_source = Some(SectorSource::Caller);
            return Ok(sector);
        }

        let (sector, tier) =
            self.classifier.classify(&request.description, self.generator.as_deref()).await;
        audit.record(GenerationStage::Classification, tier);
        audit.sector_source = Some(match tier {
            FallbackTier::External => SectorSource::ExternalClassifier,
            FallbackTier::Local => SectorSource::KeywordClassifier,
        });

        if sector == Sector::Other && !self.classifier.looks_plausible(&request.description) {
            return Err(Rejection::new(
                RejectionReason::UnclassifiableSector,
                "No hemos podido identificar el tipo de servicio; indica el sector o amplía la \
                 descripción.",
            ));
        }
        Ok(sector)
    }

    async fn run_pipeline(
        &self,
        request: &QuoteRequest,
        sector: Sector,
        context: &ProjectContext,
        mut audit: GenerationAudit,
    ) -> Result<GeneratedQuote, PipelineFault> {
        let tax_percent = request.tax_percent.unwrap_or(self.config.default_tax_percent);
        let estimate = self.estimator.estimate(
            sector,
            context,
            request.price_range.as_deref(),
            request.client_profile,
            request.project_type.as_deref(),
            request.region.as_deref(),
        );

        let (target_total, suggestion) =
            self.blended_target(request, sector, &estimate, &mut audit).await;

        let sanitized = sanitize_user_items(request.user_items.as_deref().unwrap_or_default());
        let (items, aesthetic_adjusted, weights) = if sanitized.is_empty() {
            let result = self
                .generated_items(request, sector, context, target_total, tax_percent, &mut audit)
                .await;
            if result.items.is_empty() {
                return Err(PipelineFault("distribution produced no line items".to_owned()));
            }
            (result.items, result.aesthetic_adjusted, result.weights)
        } else {
            let (items, weights) = price_user_items(&sanitized, target_total, tax_percent);
            (items, false, weights)
        };

        Ok(self
            .package(
                request,
                sector,
                context,
                estimate,
                suggestion,
                items,
                aesthetic_adjusted,
                weights,
                tax_percent,
                audit,
            )
            .await)
    }

    /// History suggestion and the 60/40 blend. Runs only for identified
    /// owners; any history problem leaves the computed target untouched.
    async fn blended_target(
        &self,
        request: &QuoteRequest,
        sector: Sector,
        estimate: &CostEstimate,
        audit: &mut GenerationAudit,
    ) -> (f64, Option<PriceSuggestion>) {
        let mut target = estimate.target_total as f64;
        let Some(owner_id) = request.owner_id.as_deref() else {
            return (target, None);
        };

        let (suggestion, tier) = self
            .matcher
            .suggest_price_with_tier(
                owner_id,
                &request.description,
                Some(sector),
                self.embedder.as_deref(),
            )
            .await;
        audit.record(GenerationStage::Embedding, tier);

        if let Some(blended) = self.matcher.blend(target, &suggestion) {
            target = blended;
            audit.history_blended = true;
        }
        (target, Some(suggestion).filter(|s| !s.is_empty()))
    }

    /// Generated-items path: sector concept templates, contextualized by
    /// the external capability or the local rewrite, then distributed.
    async fn generated_items(
        &self,
        request: &QuoteRequest,
        sector: Sector,
        context: &ProjectContext,
        target_total: f64,
        tax_percent: f64,
        audit: &mut GenerationAudit,
    ) -> crate::domain::item::DistributionResult {
        let concepts = sectors::profile(sector).concepts;

        let external = self.generator.as_ref().map(|generator| {
            let generator = Arc::clone(generator);
            let prompt = prompts::contextualize_request(sector, &request.description, concepts);
            let expected = concepts.len();
            async move {
                let raw = generator.complete(prompt).await?;
                let texts = Payload::parse(&raw).string_array()?;
                if texts.len() != expected {
                    return Err(CapabilityError::Malformed(format!(
                        "expected {expected} items, got {}",
                        texts.len()
                    )));
                }
                Ok(texts)
            }
        });

        let outcome = with_local_fallback("item_contextualization", external, || {
            concepts
                .iter()
                .map(|concept| contextualize_concept(concept, sector, &request.description))
                .collect()
        })
        .await;
        audit.record(GenerationStage::ItemContextualization, outcome.tier);

        let items: Vec<DistributionItem> =
            outcome.value.into_iter().map(|description| DistributionItem::new(description, 1)).collect();

        let options = DistributionOptions {
            margin_offset: request.quality.unwrap_or_default().margin_offset(),
            positional_weights: self.is_design_practice(request, sector, context),
        };
        self.distributor.distribute(&items, target_total, sector, tax_percent, options)
    }

    fn is_design_practice(
        &self,
        request: &QuoteRequest,
        sector: Sector,
        context: &ProjectContext,
    ) -> bool {
        if sector != Sector::Construction {
            return false;
        }
        let resolved = request.project_type.as_deref().or(context.project_type.as_deref());
        resolved.is_some_and(|tag| DESIGN_PRACTICE_TYPES.contains(&tag))
    }

    /// Assemble the final quote: totals, commercial texts (external
    /// enrichment attempted once, local templates otherwise) and the audit.
    #[allow(clippy::too_many_arguments)]
    async fn package(
        &self,
        request: &QuoteRequest,
        sector: Sector,
        context: &ProjectContext,
        estimate: CostEstimate,
        suggestion: Option<PriceSuggestion>,
        items: Vec<QuoteItem>,
        aesthetic_adjusted: bool,
        weights: Vec<f64>,
        tax_percent: f64,
        mut audit: GenerationAudit,
    ) -> GeneratedQuote {
        let subtotal: Decimal = items.iter().map(QuoteItem::total).sum::<Decimal>().round_dp(2);
        let tax_amount = (subtotal * Decimal::from_f64_retain(tax_percent).unwrap_or_default()
            / Decimal::ONE_HUNDRED)
            .round_dp(2);
        let total = subtotal + tax_amount;

        let timeline = self.templates.timeline(context, estimate.scale);

        let external = self.generator.as_ref().map(|generator| {
            let generator = Arc::clone(generator);
            let prompt =
                prompts::enrich_request(sector, &request.description, &request.client_name);
            async move {
                let raw = generator.complete(prompt).await?;
                parse_enrichment(&raw)
            }
        });
        let outcome = with_local_fallback("enrichment", external, || EnrichedTexts {
            title: self.templates.title(sector, &request.client_name),
            summary: self.templates.summary(
                &request.client_name,
                items.len(),
                &format_amount(total),
                &timeline,
            ),
            terms: None,
        })
        .await;
        audit.record(GenerationStage::Enrichment, outcome.tier);

        let texts = outcome.value;
        let terms = texts
            .terms
            .unwrap_or_else(|| self.templates.terms(self.config.validity_days, context));

        audit.estimate = Some(estimate);
        audit.distribution_weights = weights;
        audit.suggestion = suggestion;
        audit.aesthetic_adjusted = aesthetic_adjusted;

        GeneratedQuote {
            id: Uuid::new_v4(),
            title: texts.title,
            sector,
            client_name: request.client_name.clone(),
            items,
            subtotal,
            tax_percent,
            tax_amount,
            total,
            valid_until: Utc::now() + Duration::days(self.config.validity_days),
            terms,
            timeline,
            summary: texts.summary,
            audit,
        }
    }

    /// Fully deterministic re-entry path: template items, local texts, no
    /// external calls. Used when a later stage faults unexpectedly.
    fn local_fallback_quote(
        &self,
        request: &QuoteRequest,
        sector: Sector,
        context: &ProjectContext,
        mut audit: GenerationAudit,
    ) -> GeneratedQuote {
        let tax_percent = request.tax_percent.unwrap_or(self.config.default_tax_percent);
        let estimate = self.estimator.estimate(
            sector,
            context,
            request.price_range.as_deref(),
            request.client_profile,
            request.project_type.as_deref(),
            request.region.as_deref(),
        );

        let items: Vec<DistributionItem> = sectors::profile(sector)
            .concepts
            .iter()
            .map(|concept| {
                DistributionItem::new(
                    contextualize_concept(concept, sector, &request.description),
                    1,
                )
            })
            .collect();
        audit.record(GenerationStage::ItemContextualization, FallbackTier::Local);

        let distribution = self.distributor.distribute(
            &items,
            estimate.target_total as f64,
            sector,
            tax_percent,
            DistributionOptions {
                margin_offset: request.quality.unwrap_or_default().margin_offset(),
                positional_weights: self.is_design_practice(request, sector, context),
            },
        );

        let subtotal: Decimal =
            distribution.items.iter().map(QuoteItem::total).sum::<Decimal>().round_dp(2);
        let tax_amount = (subtotal * Decimal::from_f64_retain(tax_percent).unwrap_or_default()
            / Decimal::ONE_HUNDRED)
            .round_dp(2);
        let total = subtotal + tax_amount;
        let timeline = self.templates.timeline(context, estimate.scale);

        audit.record(GenerationStage::Enrichment, FallbackTier::Local);
        let title = self.templates.title(sector, &request.client_name);
        let summary = self.templates.summary(
            &request.client_name,
            distribution.items.len(),
            &format_amount(total),
            &timeline,
        );

        audit.estimate = Some(estimate);
        audit.aesthetic_adjusted = distribution.aesthetic_adjusted;
        audit.distribution_weights = distribution.weights;

        GeneratedQuote {
            id: Uuid::new_v4(),
            title,
            sector,
            client_name: request.client_name.clone(),
            items: distribution.items,
            subtotal,
            tax_percent,
            tax_amount,
            total,
            valid_until: Utc::now() + Duration::days(self.config.validity_days),
            terms: self.templates.terms(self.config.validity_days, context),
            timeline,
            summary,
            audit,
        }
    }

    /// Fire-and-forget history write for identified owners.
    async fn record_generation(&self, request: &QuoteRequest, quote: &GeneratedQuote) {
        let Some(owner_id) = request.owner_id.as_deref() else {
            return;
        };

        let (embedding, _tier) = self
            .matcher
            .comparison_vector(&request.description, self.embedder.as_deref())
            .await;
        let entry = QuoteHistoryEntry {
            id: quote.id.to_string(),
            owner_id: owner_id.to_owned(),
            sector: quote.sector,
            title: quote.title.clone(),
            total_amount: quote.total.try_into().ok(),
            items: serde_json::to_value(&quote.items).unwrap_or(Value::Null),
            embedding: (!embedding.is_empty()).then_some(embedding),
            created_at: Utc::now(),
        };
        self.matcher.record_generation(entry).await;
    }
}

struct EnrichedTexts {
    title: String,
    summary: String,
    terms: Option<Vec<String>>,
}

/// Parse the enrichment payload: `title` and `summary` are required,
/// `terms` is optional.
fn parse_enrichment(raw: &str) -> Result<EnrichedTexts, CapabilityError> {
    let value = match Payload::parse(raw) {
        Payload::Parsed(value) => value,
        Payload::Malformed(text) => {
            let preview: String = text.chars().take(120).collect();
            return Err(CapabilityError::Malformed(preview));
        }
    };

    let object = value
        .as_object()
        .ok_or_else(|| CapabilityError::Malformed("expected a JSON object".to_owned()))?;
    let required = |field: &str| {
        object
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| CapabilityError::Malformed(format!("missing or empty field `{field}`")))
    };

    let terms = object.get("terms").and_then(Value::as_array).map(|entries| {
        entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>()
    });

    Ok(EnrichedTexts {
        title: required("title")?,
        summary: required("summary")?,
        terms: terms.filter(|terms| !terms.is_empty()),
    })
}

/// Drop noise items and floor quantities; negative prices read as unpriced.
fn sanitize_user_items(items: &[UserItem]) -> Vec<UserItem> {
    items
        .iter()
        .filter(|item| validation::acceptable_item_description(&item.description))
        .map(|item| UserItem {
            description: item.description.trim().to_owned(),
            quantity: item.quantity.max(1),
            unit_price: item.unit_price.filter(|price| *price >= Decimal::ZERO),
        })
        .collect()
}

/// Price user-supplied items: priced lines are kept verbatim and the
/// remaining budget goes to the unpriced ones. A single unpriced item takes
/// it all; several split it evenly scaled by quantity.
fn price_user_items(
    items: &[UserItem],
    target_total: f64,
    tax_percent: f64,
) -> (Vec<QuoteItem>, Vec<f64>) {
    let target_subtotal = target_total / (1.0 + tax_percent / 100.0);

    let priced_sum: f64 = items
        .iter()
        .filter_map(|item| {
            item.unit_price
                .and_then(|price| TryInto::<f64>::try_into(price).ok())
                .map(|price| price * item.quantity as f64)
        })
        .sum();
    let remaining = (target_subtotal - priced_sum).max(0.0);

    let unpriced: Vec<&UserItem> = items.iter().filter(|item| item.unit_price.is_none()).collect();
    let unpriced_units: u32 = unpriced.iter().map(|item| item.quantity).sum();

    let quote_items: Vec<QuoteItem> = items
        .iter()
        .map(|item| match item.unit_price {
            Some(price) => QuoteItem::new(item.description.clone(), item.quantity, price.round_dp(2)),
            None => {
                let allocation = if unpriced.len() == 1 {
                    remaining
                } else if unpriced_units > 0 {
                    remaining / unpriced_units as f64 * item.quantity as f64
                } else {
                    0.0
                };
                let unit_price = ((allocation / item.quantity as f64) * 100.0).round() / 100.0;
                QuoteItem::new(
                    item.description.clone(),
                    item.quantity,
                    Decimal::from_f64_retain(unit_price).unwrap_or_default().round_dp(2),
                )
            }
        })
        .collect();

    let subtotal: f64 = quote_items
        .iter()
        .filter_map(|item| TryInto::<f64>::try_into(item.total()).ok())
        .sum();
    let weights = if subtotal > 0.0 {
        quote_items
            .iter()
            .map(|item| {
                TryInto::<f64>::try_into(item.total()).map(|total| total / subtotal).unwrap_or(0.0)
            })
            .collect()
    } else {
        Vec::new()
    };

    (quote_items, weights)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::audit::{FallbackTier, GenerationStage, SectorSource};
    use crate::capabilities::{CompletionRequest, TextGenerator};
    use crate::config::EngineConfig;
    use crate::domain::history::QuoteHistoryEntry;
    use crate::domain::quote::{QuoteRequest, UserItem};
    use crate::domain::sector::Sector;
    use crate::errors::{CapabilityError, RejectionReason};
    use crate::history::{fallback_embedding, HistoryStore, InMemoryHistoryStore};

    use super::Orchestrator;

    fn local_orchestrator() -> Orchestrator {
        Orchestrator::new(EngineConfig::default(), Arc::new(InMemoryHistoryStore::new()))
    }

    /// Answers every prompt family with well-formed JSON.
    struct ScriptedGenerator;

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
            if request.system.contains("clasificador") {
                return Ok("construction".to_owned());
            }
            if request.system.contains("array JSON") {
                let count = request
                    .system
                    .split_whitespace()
                    .find_map(|word| word.parse::<usize>().ok())
                    .unwrap_or(1);
                let entries: Vec<String> =
                    (1..=count).map(|index| format!("\"Partida {index}\"")).collect();
                return Ok(format!("[{}]", entries.join(", ")));
            }
            if request.system.contains("objeto JSON") {
                return Ok(
                    r#"{"title": "Reforma integral llave en mano", "summary": "Obra completa con materiales incluidos.", "terms": ["Pago al contado."]}"#
                        .to_owned(),
                );
            }
            Err(CapabilityError::Unavailable("unexpected prompt".to_owned()))
        }
    }

    #[tokio::test]
    async fn blacklisted_description_is_rejected() {
        let rejection = local_orchestrator()
            .generate_quote(QuoteRequest::new("xd jaja mi proyecto", "Cliente"))
            .await
            .expect_err("blacklisted");
        assert_eq!(rejection.reason, RejectionReason::Blacklisted);
    }

    #[tokio::test]
    async fn short_description_is_rejected() {
        let rejection = local_orchestrator()
            .generate_quote(QuoteRequest::new("web ya", "Cliente"))
            .await
            .expect_err("too short");
        assert_eq!(rejection.reason, RejectionReason::TooShort);
    }

    #[tokio::test]
    async fn local_only_deployment_yields_a_complete_quote() {
        let quote = local_orchestrator()
            .generate_quote(QuoteRequest::new(
                "Reforma integral de un piso de 90 m2 en Madrid",
                "Construcciones Vega",
            ))
            .await
            .expect("complete quote");

        assert!(!quote.items.is_empty());
        assert!(quote.subtotal > Decimal::ZERO);
        assert_eq!(quote.total, quote.subtotal + quote.tax_amount);
        assert!(!quote.title.is_empty());
        assert!(!quote.summary.is_empty());
        assert!(!quote.terms.is_empty());
        assert!(!quote.timeline.is_empty());
        assert!(quote.valid_until > Utc::now());

        // Every fallback tier fired and is visible in the audit.
        assert!(quote.audit.used_local_fallback());
        assert_eq!(quote.audit.sector_source, Some(SectorSource::KeywordClassifier));
        assert_eq!(
            quote.audit.tier_for(GenerationStage::ItemContextualization),
            Some(FallbackTier::Local)
        );
        assert_eq!(quote.audit.tier_for(GenerationStage::Enrichment), Some(FallbackTier::Local));
        assert!(quote.audit.estimate.is_some());
        assert_eq!(quote.audit.distribution_weights.len(), quote.items.len());
    }

    #[tokio::test]
    async fn external_capability_drives_texts_and_items() {
        let orchestrator = local_orchestrator().with_text_generator(Arc::new(ScriptedGenerator));
        let quote = orchestrator
            .generate_quote(QuoteRequest::new(
                "Reforma completa de una vivienda antigua",
                "Patrimonio SL",
            ))
            .await
            .expect("quote");

        assert_eq!(quote.sector, Sector::Construction);
        assert_eq!(quote.audit.sector_source, Some(SectorSource::ExternalClassifier));
        assert_eq!(
            quote.audit.tier_for(GenerationStage::ItemContextualization),
            Some(FallbackTier::External)
        );
        assert_eq!(
            quote.audit.tier_for(GenerationStage::Enrichment),
            Some(FallbackTier::External)
        );
        assert_eq!(quote.title, "Reforma integral llave en mano");
        assert_eq!(quote.terms, vec!["Pago al contado.".to_owned()]);
        assert!(quote.items.iter().all(|item| item.description.starts_with("Partida")));
    }

    #[tokio::test]
    async fn failing_capability_still_yields_a_complete_quote() {
        use crate::capabilities::DisabledCapability;

        // Capabilities wired but permanently failing: every stage must
        // recover through its local tier.
        let orchestrator = local_orchestrator()
            .with_text_generator(Arc::new(DisabledCapability))
            .with_embedder(Arc::new(DisabledCapability));

        let mut request =
            QuoteRequest::new("Desarrollo de una plataforma web corporativa", "Nortia");
        request.owner_id = Some("owner-9".to_owned());

        let quote = orchestrator.generate_quote(request).await.expect("quote");

        assert!(!quote.items.is_empty());
        assert_eq!(quote.audit.sector_source, Some(SectorSource::KeywordClassifier));
        assert_eq!(
            quote.audit.tier_for(GenerationStage::ItemContextualization),
            Some(FallbackTier::Local)
        );
        assert_eq!(quote.audit.tier_for(GenerationStage::Enrichment), Some(FallbackTier::Local));
        assert_eq!(quote.audit.tier_for(GenerationStage::Embedding), Some(FallbackTier::Local));
    }

    #[tokio::test]
    async fn caller_sector_hint_is_trusted() {
        let mut request =
            QuoteRequest::new("Campaña de publicidad para el lanzamiento", "Brandify");
        request.sector_hint = Some(Sector::Events);

        let quote = local_orchestrator().generate_quote(request).await.expect("quote");
        assert_eq!(quote.sector, Sector::Events);
        assert_eq!(quote.audit.sector_source, Some(SectorSource::Caller));
    }

    #[tokio::test]
    async fn user_items_keep_their_prices_and_split_the_rest() {
        let mut request = QuoteRequest::new(
            "Reforma de oficina con dirección de obra incluida",
            "Oficinas Delta",
        );
        request.sector_hint = Some(Sector::Construction);
        request.user_items = Some(vec![
            UserItem {
                description: "Dirección de obra".to_owned(),
                quantity: 1,
                unit_price: Some(Decimal::new(150_000, 2)),
            },
            UserItem {
                description: "Albañilería".to_owned(),
                quantity: 2,
                unit_price: None,
            },
            UserItem { description: "Pintura".to_owned(), quantity: 1, unit_price: None },
        ]);

        let quote = local_orchestrator().generate_quote(request).await.expect("quote");

        assert_eq!(quote.items.len(), 3);
        assert_eq!(quote.items[0].unit_price, Decimal::new(150_000, 2));

        // Unpriced items split the remaining budget per unit: the two-unit
        // line carries twice the one-unit line.
        let albanileria: f64 = quote.items[1].total().try_into().expect("f64");
        let pintura: f64 = quote.items[2].total().try_into().expect("f64");
        assert!((albanileria - 2.0 * pintura).abs() < 0.05);
        assert_eq!(quote.audit.distribution_weights.len(), 3);
    }

    #[tokio::test]
    async fn noise_user_items_are_dropped_before_pricing() {
        let mut request = QuoteRequest::new("Desarrollo de una tienda online", "Moda Rivas");
        request.sector_hint = Some(Sector::Software);
        request.user_items = Some(vec![UserItem {
            description: "xd".to_owned(),
            quantity: 1,
            unit_price: None,
        }]);

        let quote = local_orchestrator().generate_quote(request).await.expect("quote");

        // All user items were noise, so the generated path took over.
        assert!(quote.items.len() > 1);
        assert!(quote
            .audit
            .tier_for(GenerationStage::ItemContextualization)
            .is_some());
    }

    #[tokio::test]
    async fn owner_history_blends_into_the_total() {
        let store = Arc::new(InMemoryHistoryStore::new());
        for (id, title, total) in [
            ("h-1", "Reforma integral de cocina", 11_000.0),
            ("h-2", "Reforma de cocina y salon", 14_000.0),
        ] {
            store
                .append(QuoteHistoryEntry {
                    id: id.to_owned(),
                    owner_id: "owner-7".to_owned(),
                    sector: Sector::Construction,
                    title: title.to_owned(),
                    total_amount: Some(total),
                    items: serde_json::json!([]),
                    embedding: Some(fallback_embedding(title)),
                    created_at: Utc::now(),
                })
                .await
                .expect("seed history");
        }

        let mut request =
            QuoteRequest::new("Reforma integral de la cocina del piso", "Hogar Sur");
        request.sector_hint = Some(Sector::Construction);
        request.owner_id = Some("owner-7".to_owned());

        let quote = local_orchestrator_with(store).generate_quote(request).await.expect("quote");

        assert!(quote.audit.history_blended);
        let suggestion = quote.audit.suggestion.as_ref().expect("suggestion");
        assert!(suggestion.suggested_average.is_some());
        assert_eq!(
            quote.audit.tier_for(GenerationStage::Embedding),
            Some(FallbackTier::Local)
        );
    }

    #[tokio::test]
    async fn generation_is_recorded_for_identified_owners() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let orchestrator = local_orchestrator_with(Arc::clone(&store));

        let mut request = QuoteRequest::new("Campaña de marketing digital", "Brandify");
        request.owner_id = Some("owner-3".to_owned());

        let quote = orchestrator.generate_quote(request).await.expect("quote");

        let recorded = store.recent("owner-3", None, 10).await.expect("recent");
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].id, quote.id.to_string());
        assert!(recorded[0].embedding.is_some());
    }

    #[tokio::test]
    async fn anonymous_requests_leave_no_history() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let orchestrator = local_orchestrator_with(Arc::clone(&store));

        orchestrator
            .generate_quote(QuoteRequest::new("Campaña de marketing digital", "Brandify"))
            .await
            .expect("quote");

        let recorded = store.recent("", None, 10).await.expect("recent");
        assert!(recorded.is_empty());
    }

    fn local_orchestrator_with(store: Arc<InMemoryHistoryStore>) -> Orchestrator {
        Orchestrator::new(EngineConfig::default(), store)
    }
}
