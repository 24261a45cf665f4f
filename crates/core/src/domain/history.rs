use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::sector::Sector;

/// Append-only snapshot of a past generation for one owner.
///
/// `embedding` may be absent when embedding generation failed at record
/// time; such entries are skipped during retrieval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteHistoryEntry {
    pub id: String,
    pub owner_id: String,
    pub sector: Sector,
    pub title: String,
    pub total_amount: Option<f64>,
    /// JSON snapshot of the generated items.
    pub items: serde_json::Value,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarQuote {
    pub id: String,
    pub score: f64,
}

/// Price hint derived from an owner's most similar past quotes.
/// All statistics are absent when no similar history exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub suggested_average: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
    /// Descending by score; every score is above the similarity cutoff.
    pub similar_quotes: Vec<SimilarQuote>,
}

impl PriceSuggestion {
    pub fn is_empty(&self) -> bool {
        self.suggested_average.is_none()
    }

    /// Short human-readable snippets for prompt construction.
    pub fn prompt_snippets(&self) -> Vec<String> {
        self.similar_quotes
            .iter()
            .map(|similar| {
                format!("presupuesto {} (similitud {:.2})", similar.id, similar.score)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{PriceSuggestion, SimilarQuote};

    #[test]
    fn empty_suggestion_has_no_average() {
        assert!(PriceSuggestion::default().is_empty());
    }

    #[test]
    fn snippets_mention_similarity() {
        let suggestion = PriceSuggestion {
            suggested_average: Some(4_200.0),
            low: Some(3_500.0),
            high: Some(5_000.0),
            similar_quotes: vec![SimilarQuote { id: "h-17".to_owned(), score: 0.82 }],
        };
        let snippets = suggestion.prompt_snippets();
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].contains("h-17"));
        assert!(snippets[0].contains("0.82"));
    }
}
