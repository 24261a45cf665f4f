//! Sector classification.
//!
//! Two strategies composed with fallback: an external text classifier when
//! one is wired in, and the local keyword scan over the sector registry.
//! The keyword scan is also the sole strategy for local-only deployments.

use tracing::debug;

use crate::audit::FallbackTier;
use crate::capabilities::{CompletionRequest, TextGenerator};
use crate::domain::sector::Sector;
use crate::sectors;
use crate::text::normalize;
use crate::validation;

#[derive(Clone, Copy, Debug, Default)]
pub struct SectorClassifier;

impl SectorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Local keyword scan: sectors are tried in registry order, the first
    /// sector with a matching trigger wins, default `Other`.
    pub fn classify_keywords(&self, description: &str) -> Sector {
        let normalized = normalize(description);
        Sector::ALL
            .into_iter()
            .find(|sector| {
                sectors::profile(*sector)
                    .keywords
                    .iter()
                    .any(|keyword| normalized.contains(keyword))
            })
            .unwrap_or(Sector::Other)
    }

    /// External classification with local fallback. Returns the sector and
    /// the tier that produced it. An in-set answer is trusted; an
    /// out-of-set answer from a healthy capability maps to `Other`.
    pub async fn classify(
        &self,
        description: &str,
        generator: Option<&dyn TextGenerator>,
    ) -> (Sector, FallbackTier) {
        if let Some(generator) = generator {
            match generator.complete(classification_request(description)).await {
                Ok(answer) => {
                    let sector = parse_sector_label(&answer);
                    return (sector, FallbackTier::External);
                }
                Err(error) => {
                    debug!(%error, "external sector classification unavailable");
                }
            }
        }
        (self.classify_keywords(description), FallbackTier::Local)
    }

    /// Whether an `Other` result should still be accepted as a valid
    /// generic request.
    pub fn looks_plausible(&self, description: &str) -> bool {
        validation::has_professional_signal(description)
    }
}

fn classification_request(description: &str) -> CompletionRequest {
    let labels: Vec<&str> = Sector::ALL.iter().map(Sector::key).collect();
    CompletionRequest::new(
        format!(
            "Eres un clasificador de solicitudes de presupuesto. Responde únicamente con una \
             de estas etiquetas: {}.",
            labels.join(", ")
        ),
        description.to_owned(),
    )
    .with_temperature(0.0)
    .with_max_tokens(10)
}

/// Map a free-form answer onto the closed sector set; anything else is
/// `Other`.
fn parse_sector_label(answer: &str) -> Sector {
    let normalized = normalize(answer);
    let token = normalized.trim().trim_matches(['"', '\'', '.', '`']);

    Sector::from_key(token)
        .or_else(|| Sector::ALL.into_iter().find(|sector| token.contains(sector.key())))
        .unwrap_or(Sector::Other)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::audit::FallbackTier;
    use crate::capabilities::{CompletionRequest, TextGenerator};
    use crate::errors::CapabilityError;

    use super::{parse_sector_label, Sector, SectorClassifier};

    struct FixedAnswer(&'static str);

    #[async_trait]
    impl TextGenerator for FixedAnswer {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, CapabilityError> {
            Ok(self.0.to_owned())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl TextGenerator for Unavailable {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, CapabilityError> {
            Err(CapabilityError::Unavailable("offline".to_owned()))
        }
    }

    #[test]
    fn keyword_scan_finds_sector() {
        let classifier = SectorClassifier::new();
        assert_eq!(
            classifier.classify_keywords("Necesito una reforma integral del piso"),
            Sector::Construction
        );
        assert_eq!(
            classifier.classify_keywords("Campaña de redes sociales para mi marca"),
            Sector::Marketing
        );
        assert_eq!(classifier.classify_keywords("algo que no encaja en nada"), Sector::Other);
    }

    #[test]
    fn out_of_set_labels_map_to_other() {
        assert_eq!(parse_sector_label("astrología"), Sector::Other);
        assert_eq!(parse_sector_label("construction"), Sector::Construction);
        assert_eq!(parse_sector_label(" \"marketing\" "), Sector::Marketing);
        assert_eq!(parse_sector_label("El sector es: software."), Sector::Software);
    }

    #[tokio::test]
    async fn external_answer_is_trusted_when_in_set() {
        let classifier = SectorClassifier::new();
        let (sector, tier) =
            classifier.classify("da igual el texto", Some(&FixedAnswer("events"))).await;
        assert_eq!(sector, Sector::Events);
        assert_eq!(tier, FallbackTier::External);
    }

    #[tokio::test]
    async fn capability_failure_falls_back_to_keywords() {
        let classifier = SectorClassifier::new();
        let (sector, tier) =
            classifier.classify("Organizamos una boda en la playa", Some(&Unavailable)).await;
        assert_eq!(sector, Sector::Events);
        assert_eq!(tier, FallbackTier::Local);
    }

    #[tokio::test]
    async fn no_generator_uses_keywords() {
        let classifier = SectorClassifier::new();
        let (sector, tier) = classifier.classify("Curso de formación para el equipo", None).await;
        assert_eq!(sector, Sector::Training);
        assert_eq!(tier, FallbackTier::Local);
    }
}
