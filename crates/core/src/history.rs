//! Similarity-based retrieval over an owner's quote history.
//!
//! Writes are fire-and-forget: a failed insert or embedding is logged and
//! swallowed, never raised. Reads degrade to an empty suggestion on any
//! error, so the pipeline can always continue without history.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::audit::FallbackTier;
use crate::capabilities::Embedder;
use crate::config::HistoryPolicy;
use crate::domain::history::{PriceSuggestion, QuoteHistoryEntry, SimilarQuote};
use crate::domain::sector::Sector;
use crate::errors::StoreError;
use crate::text::normalize;

/// Fixed vocabulary backing the deterministic fallback embedding.
const FALLBACK_VOCABULARY: &[&str] = &[
    "web", "app", "software", "plataforma", "api", "tienda", "ecommerce", "online", "digital",
    "reforma", "obra", "vivienda", "cocina", "bano", "local", "nave", "instalacion", "evento",
    "boda", "congreso", "feria", "catering", "campana", "marketing", "publicidad", "redes", "seo",
    "branding", "contenidos", "consultoria", "auditoria", "estrategia", "procesos", "formacion",
    "curso", "taller", "mentoria", "fabricacion", "produccion", "moldes", "serie", "logistica",
    "comercio", "diseno", "desarrollo", "mantenimiento", "integral", "urgente",
];

/// Append-only per-owner history store.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: QuoteHistoryEntry) -> Result<(), StoreError>;

    /// Most recent entries for an owner, newest first, optionally filtered
    /// by sector.
    async fn recent(
        &self,
        owner_id: &str,
        sector: Option<Sector>,
        limit: usize,
    ) -> Result<Vec<QuoteHistoryEntry>, StoreError>;
}

/// In-memory store for tests and database-less deployments.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    entries: Arc<Mutex<Vec<QuoteHistoryEntry>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entry: QuoteHistoryEntry) -> Result<(), StoreError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }

    async fn recent(
        &self,
        owner_id: &str,
        sector: Option<Sector>,
        limit: usize,
    ) -> Result<Vec<QuoteHistoryEntry>, StoreError> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        let mut matching: Vec<QuoteHistoryEntry> = entries
            .into_iter()
            .filter(|entry| entry.owner_id == owner_id)
            .filter(|entry| sector.map_or(true, |wanted| entry.sector == wanted))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

pub struct HistoryMatcher {
    store: Arc<dyn HistoryStore>,
    policy: HistoryPolicy,
}

impl HistoryMatcher {
    pub fn new(store: Arc<dyn HistoryStore>, policy: HistoryPolicy) -> Self {
        Self { store, policy }
    }

    /// Record a generation. Failures are logged and swallowed.
    pub async fn record_generation(&self, entry: QuoteHistoryEntry) {
        if let Err(error) = self.store.append(entry).await {
            warn!(%error, "could not record quote history entry");
        }
    }

    /// Price suggestion from the owner's most similar past quotes. Never
    /// fails; any error yields an empty suggestion.
    pub async fn suggest_price(
        &self,
        owner_id: &str,
        description: &str,
        sector: Option<Sector>,
        embedder: Option<&dyn Embedder>,
    ) -> PriceSuggestion {
        self.suggest_price_with_tier(owner_id, description, sector, embedder).await.0
    }

    /// Same as [`suggest_price`], also reporting which embedding tier built
    /// the comparison vector.
    ///
    /// [`suggest_price`]: Self::suggest_price
    pub async fn suggest_price_with_tier(
        &self,
        owner_id: &str,
        description: &str,
        sector: Option<Sector>,
        embedder: Option<&dyn Embedder>,
    ) -> (PriceSuggestion, FallbackTier) {
        let (query, tier) = self.comparison_vector(description, embedder).await;
        if query.is_empty() {
            return (PriceSuggestion::default(), tier);
        }

        let entries = match self.store.recent(owner_id, sector, self.policy.window).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, owner_id, "history lookup failed; returning empty suggestion");
                return (PriceSuggestion::default(), tier);
            }
        };

        let mut scored: Vec<(SimilarQuote, Option<f64>)> = entries
            .iter()
            .filter_map(|entry| {
                // Vectors from a different embedding space cannot be
                // compared; mismatched dimensions are skipped.
                let stored = entry.embedding.as_ref()?;
                let score = cosine_similarity(&query, stored)?;
                (score > self.policy.similarity_cutoff).then(|| {
                    (SimilarQuote { id: entry.id.clone(), score }, entry.total_amount)
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.score.partial_cmp(&a.0.score).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(self.policy.max_matches);

        let totals: Vec<f64> = scored.iter().filter_map(|(_, total)| *total).collect();
        let (suggested_average, low, high) = if totals.is_empty() {
            (None, None, None)
        } else {
            let sum: f64 = totals.iter().sum();
            let low = totals.iter().cloned().fold(f64::INFINITY, f64::min);
            let high = totals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            (Some(sum / totals.len() as f64), Some(low), Some(high))
        };

        (
            PriceSuggestion {
                suggested_average,
                low,
                high,
                similar_quotes: scored.into_iter().map(|(similar, _)| similar).collect(),
            },
            tier,
        )
    }

    /// Fixed blend of the computed total with the historical average,
    /// favoring the fresh estimate.
    pub fn blend(&self, computed_total: f64, suggestion: &PriceSuggestion) -> Option<f64> {
        let average = suggestion.suggested_average?;
        let history_weight = self.policy.blend_weight;
        Some(((1.0 - history_weight) * computed_total + history_weight * average).round())
    }

    /// Comparison vector for a description: external embedding when
    /// available, deterministic bag-of-words otherwise. L2-normalized in
    /// both cases.
    pub async fn comparison_vector(
        &self,
        description: &str,
        embedder: Option<&dyn Embedder>,
    ) -> (Vec<f32>, FallbackTier) {
        if let Some(embedder) = embedder {
            match embedder.embed(description).await {
                Ok(vector) if !vector.is_empty() => {
                    return (l2_normalize(vector), FallbackTier::External);
                }
                Ok(_) => debug!("embedding capability returned an empty vector"),
                Err(error) => debug!(%error, "embedding capability unavailable"),
            }
        }
        (fallback_embedding(description), FallbackTier::Local)
    }
}

/// Deterministic bag-of-words vector over the fixed domain vocabulary.
pub fn fallback_embedding(description: &str) -> Vec<f32> {
    let normalized = normalize(description);
    let counts: Vec<f32> = FALLBACK_VOCABULARY
        .iter()
        .map(|term| normalized.matches(term).count() as f32)
        .collect();
    l2_normalize(counts)
}

fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

/// Cosine similarity; `None` when the vectors are incomparable.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f64> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut left_norm = 0.0f64;
    let mut right_norm = 0.0f64;
    for (a, b) in left.iter().zip(right) {
        dot += f64::from(*a) * f64::from(*b);
        left_norm += f64::from(*a) * f64::from(*a);
        right_norm += f64::from(*b) * f64::from(*b);
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return None;
    }
    Some(dot / (left_norm.sqrt() * right_norm.sqrt()))
}
