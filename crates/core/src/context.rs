//! Signal extraction from free-text project descriptions.
//!
//! Detectors run in a fixed order over the normalized text; later detectors
//! win on conflict (an explicit area measurement overrides scale keywords).
//! Extraction is pure and never fails: a missing signal leaves the field
//! unset.

use regex::Regex;

use crate::domain::context::{
    ProjectContext, Scale, SoftwareComplexity, SoftwareProfile,
};
use crate::domain::sector::Sector;
use crate::sectors::{
    self, area_scale, price_range_scale, region_multiplier, CLIENT_PROFILE_KEYWORDS,
    ENTERPRISE_SCALE_KEYWORDS, RAW_MATERIAL_KEYWORDS, SMALL_SCALE_KEYWORDS, URGENCY_PATTERNS,
};
use crate::text::{normalize, parse_amount, range_upper_bound};

const DESCRIPTION_LENGTH_SIGNAL: usize = 400;

pub struct ContextExtractor {
    area: Regex,
    timeline: Regex,
    location: Regex,
}

impl Default for ContextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextExtractor {
    pub fn new() -> Self {
        // The patterns are static and known-good; a failed compile would be
        // a programming error caught by the constructor tests.
        Self {
            area: Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:m2|m²|metros cuadrados)")
                .expect("area pattern"),
            timeline: Regex::new(r"(\d+)\s*(semanas?|meses?)").expect("timeline pattern"),
            location: Regex::new(
                r"\ben ([A-ZÁÉÍÓÚÑ][a-záéíóúñü]+(?:\s+[A-ZÁÉÍÓÚÑ][a-záéíóúñü]+)?)",
            )
            .expect("location pattern"),
        }
    }

    pub fn extract(
        &self,
        description: &str,
        price_range: Option<&str>,
        location_hint: Option<&str>,
        sector: Option<Sector>,
    ) -> ProjectContext {
        let normalized = normalize(description);
        let mut context = ProjectContext::default();

        self.detect_scale(&normalized, &mut context);
        self.detect_urgency(&normalized, &mut context);
        self.detect_timeline(&normalized, &mut context);
        self.detect_location(description, location_hint, sector, &mut context);
        self.detect_scale_from_range(price_range, &mut context);
        self.detect_volatility(&normalized, sector, &mut context);
        self.detect_client_profile(&normalized, &mut context);
        self.detect_project_type(&normalized, sector, &mut context);

        if sector == Some(Sector::Software) {
            context.software_profile = Some(self.software_profile(&normalized));
        }

        context
    }

    /// Keyword scale first, then the area measurement, which overrides it.
    fn detect_scale(&self, normalized: &str, context: &mut ProjectContext) {
        if ENTERPRISE_SCALE_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
            context.scale_hint = Some(Scale::Enterprise);
        } else if SMALL_SCALE_KEYWORDS.iter().any(|keyword| normalized.contains(keyword)) {
            context.scale_hint = Some(Scale::Small);
        }

        if let Some(captures) = self.area.captures(normalized) {
            if let Some(square_meters) = captures.get(1).and_then(|m| parse_amount(m.as_str())) {
                context.scale_hint = Some(area_scale(square_meters));
            }
        }
    }

    /// Highest matching multiplier wins when several patterns fire.
    fn detect_urgency(&self, normalized: &str, context: &mut ProjectContext) {
        for (fragment, multiplier, reason) in URGENCY_PATTERNS {
            if !normalized.contains(fragment) {
                continue;
            }
            let current = context.urgency_multiplier.unwrap_or(1.0);
            if *multiplier > current {
                context.urgency_multiplier = Some(*multiplier);
                context.urgency_reason = Some((*reason).to_owned());
            }
        }
    }

    fn detect_timeline(&self, normalized: &str, context: &mut ProjectContext) {
        let Some(captures) = self.timeline.captures(normalized) else {
            return;
        };
        let Some(count) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            return;
        };
        let unit = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let weeks = if unit.starts_with("mes") { count.saturating_mul(4) } else { count };
        if weeks > 0 {
            context.timeline_weeks = Some(weeks);
        }
    }

    /// Explicit location argument beats the "en <Place>" capture. The place
    /// is normalized before the table lookups.
    fn detect_location(
        &self,
        description: &str,
        location_hint: Option<&str>,
        sector: Option<Sector>,
        context: &mut ProjectContext,
    ) {
        let place = location_hint
            .map(str::to_owned)
            .filter(|hint| !hint.trim().is_empty())
            .or_else(|| {
                self.location
                    .captures(description)
                    .and_then(|captures| captures.get(1))
                    .map(|m| m.as_str().to_owned())
            });

        let Some(place) = place else {
            return;
        };
        let normalized_place = normalize(&place);
        context.location_hint = Some(place);

        if let Some((region, factor)) =
            region_multiplier(&normalized_place, sector.unwrap_or(Sector::Other))
        {
            context.region = Some(region.to_owned());
            context.location_multiplier = Some(factor);
        }
    }

    /// Only fires when no earlier detector resolved a scale.
    fn detect_scale_from_range(&self, price_range: Option<&str>, context: &mut ProjectContext) {
        if context.scale_hint.is_some() {
            return;
        }
        if let Some(upper) = price_range.and_then(range_upper_bound) {
            context.scale_hint = Some(price_range_scale(upper));
        }
    }

    fn detect_volatility(
        &self,
        normalized: &str,
        sector: Option<Sector>,
        context: &mut ProjectContext,
    ) {
        let volatile_sector = sector.map(|s| sectors::profile(s).volatile).unwrap_or(false);
        let mentions_materials =
            RAW_MATERIAL_KEYWORDS.iter().any(|keyword| normalized.contains(keyword));

        if volatile_sector || mentions_materials {
            context.fluctuation_warning = Some(
                "Los precios de materiales pueden variar; el importe final se confirmara al \
                 cerrar el pedido."
                    .to_owned(),
            );
        }
    }

    fn detect_client_profile(&self, normalized: &str, context: &mut ProjectContext) {
        context.client_profile = CLIENT_PROFILE_KEYWORDS
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword))
            .map(|(_, profile)| *profile);
    }

    fn detect_project_type(
        &self,
        normalized: &str,
        sector: Option<Sector>,
        context: &mut ProjectContext,
    ) {
        let Some(sector) = sector else {
            return;
        };
        context.project_type = sectors::profile(sector)
            .project_type_rules
            .iter()
            .find(|rule| normalized.contains(rule.keyword))
            .map(|rule| rule.tag.to_owned());
    }

    fn software_profile(&self, normalized: &str) -> SoftwareProfile {
        const INTEGRATIONS: &[&str] =
            &["stripe", "paypal", "shopify", "hubspot", "salesforce", "whatsapp", "sap"];

        let has_web_admin = ["panel de administracion", "backoffice", "panel admin", "intranet"]
            .iter()
            .any(|keyword| normalized.contains(keyword));
        let has_mobile_app =
            ["app movil", "android", "ios", "aplicacion movil"].iter().any(|k| normalized.contains(k));
        let mentions_external_api =
            ["api externa", "api de", "integracion con", "webservice"].iter().any(|k| {
                normalized.contains(k)
            });
        let mentions_analytics = ["analitica", "dashboard", "metricas", "informes"]
            .iter()
            .any(|keyword| normalized.contains(keyword));
        let named_integrations: Vec<String> = INTEGRATIONS
            .iter()
            .filter(|name| normalized.contains(*name))
            .map(|name| (*name).to_owned())
            .collect();
        let is_saas = ["saas", "multi-tenant", "multitenant", "por suscripcion"]
            .iter()
            .any(|keyword| normalized.contains(keyword));

        let mut score = 0u32;
        for signal in
            [has_web_admin, has_mobile_app, mentions_external_api, mentions_analytics, is_saas]
        {
            if signal {
                score += 1;
            }
        }
        score += (named_integrations.len() as u32).min(2);
        if normalized.chars().count() > DESCRIPTION_LENGTH_SIGNAL {
            score += 1;
        }

        let complexity = match score {
            0..=2 => SoftwareComplexity::Low,
            3..=4 => SoftwareComplexity::Medium,
            _ => SoftwareComplexity::High,
        };

        SoftwareProfile {
            score,
            complexity,
            has_web_admin,
            has_mobile_app,
            mentions_external_api,
            mentions_analytics,
            named_integrations,
            is_saas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ContextExtractor {
        ContextExtractor::new()
    }

    #[test]
    fn area_overrides_keyword_scale() {
        let context = extractor().extract(
            "Necesito un anteproyecto de vivienda de 500 m2",
            None,
            None,
            Some(Sector::Construction),
        );
        assert_eq!(context.scale_hint, Some(Scale::Enterprise));
    }

    #[test]
    fn small_keyword_sets_small_scale() {
        let context =
            extractor().extract("Quiero un MVP sencillo para validar la idea", None, None, None);
        assert_eq!(context.scale_hint, Some(Scale::Small));
    }

    #[test]
    fn small_area_beats_enterprise_keyword() {
        let context = extractor().extract(
            "Reforma integral de un local de 50 m2",
            None,
            None,
            Some(Sector::Construction),
        );
        assert_eq!(context.scale_hint, Some(Scale::Small));
    }

    #[test]
    fn forty_eight_hour_pattern_dominates() {
        let context = extractor().extract("Lo necesito urgente, en 48 horas", None, None, None);
        assert_eq!(context.urgency_multiplier, Some(1.2));
        assert!(context.urgency_reason.as_deref().unwrap_or("").contains("48 horas"));
    }

    #[test]
    fn months_convert_to_weeks() {
        let context = extractor().extract("Entrega en 3 meses como máximo", None, None, None);
        assert_eq!(context.timeline_weeks, Some(12));
    }

    #[test]
    fn weeks_are_taken_verbatim() {
        let context = extractor().extract("Plazo de 6 semanas", None, None, None);
        assert_eq!(context.timeline_weeks, Some(6));
    }

    #[test]
    fn capitalized_place_resolves_region() {
        let context = extractor().extract(
            "Reforma de cocina en Madrid con acabados altos",
            None,
            None,
            Some(Sector::Construction),
        );
        assert_eq!(context.region.as_deref(), Some("madrid"));
        assert_eq!(context.location_multiplier, Some(1.3));
    }

    #[test]
    fn explicit_location_beats_description_capture() {
        let context = extractor().extract(
            "Campaña de publicidad en Madrid",
            None,
            Some("Galicia"),
            Some(Sector::Marketing),
        );
        assert_eq!(context.region.as_deref(), Some("galicia"));
        assert_eq!(context.location_multiplier, Some(0.9));
    }

    #[test]
    fn price_range_sets_scale_only_without_other_signals() {
        let with_range = extractor().extract(
            "Desarrollo de una página corporativa",
            Some("entre 3.000 y 25.000 €"),
            None,
            Some(Sector::Software),
        );
        assert_eq!(with_range.scale_hint, Some(Scale::Enterprise));

        let keyword_wins = extractor().extract(
            "Prototipo inicial de la plataforma",
            Some("entre 3.000 y 25.000 €"),
            None,
            Some(Sector::Software),
        );
        assert_eq!(keyword_wins.scale_hint, Some(Scale::Small));
    }

    #[test]
    fn volatile_sector_sets_fluctuation_warning() {
        let context = extractor().extract(
            "Reforma del baño y la cocina",
            None,
            None,
            Some(Sector::Construction),
        );
        assert!(context.fluctuation_warning.is_some());
    }

    #[test]
    fn raw_materials_warn_in_any_sector() {
        let context = extractor().extract(
            "Campaña para una marca de muebles de madera y acero",
            None,
            None,
            Some(Sector::Marketing),
        );
        assert!(context.fluctuation_warning.is_some());
    }

    #[test]
    fn client_profile_and_project_type_from_keywords() {
        let context = extractor().extract(
            "Somos una startup y queremos una tienda online con Stripe",
            None,
            None,
            Some(Sector::Software),
        );
        assert_eq!(context.client_profile, Some(crate::domain::context::ClientProfile::Startup));
        assert_eq!(context.project_type.as_deref(), Some("ecommerce"));
    }

    #[test]
    fn software_profile_scores_complexity() {
        let context = extractor().extract(
            "Plataforma SaaS con panel de administracion, app movil para iOS, integracion con \
             Stripe y Salesforce, y dashboard de metricas",
            None,
            None,
            Some(Sector::Software),
        );
        let profile = context.software_profile.expect("software profile");
        assert!(profile.is_saas);
        assert!(profile.has_web_admin);
        assert!(profile.has_mobile_app);
        assert_eq!(profile.named_integrations.len(), 2);
        assert_eq!(profile.complexity, SoftwareComplexity::High);
    }

    #[test]
    fn extraction_never_fails_on_empty_input() {
        let context = extractor().extract("", None, None, None);
        assert_eq!(context, ProjectContext::default());
    }
}
