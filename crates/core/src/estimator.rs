//! Band-based cost estimation.
//!
//! The base total is the midpoint of the resolved (sector, scale) ticket
//! band. Adjustments stack multiplicatively against the running total, in a
//! fixed order, and every applied factor is recorded by name. The final
//! total is clamped back into the band; clamping is recorded for audit.
//! `estimate` never fails: with no hints at all it prices the sector's
//! default scale.

use crate::config::EngineConfig;
use crate::domain::context::{ClientProfile, ProjectContext, Scale};
use crate::domain::estimate::{AppliedMultiplier, CostEstimate, RangeValidation};
use crate::domain::sector::Sector;
use crate::sectors::{self, price_range_scale, region_multiplier};
use crate::text::{normalize, range_upper_bound};

/// Flat surcharge applied when the requested delivery fits in two weeks.
const RUSH_MULTIPLIER: f64 = 1.10;
const RUSH_WEEKS: u32 = 2;

#[derive(Clone, Debug)]
pub struct CostEstimator {
    config: EngineConfig,
}

impl CostEstimator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn estimate(
        &self,
        sector: Sector,
        context: &ProjectContext,
        price_range: Option<&str>,
        client_profile: Option<ClientProfile>,
        project_type: Option<&str>,
        region: Option<&str>,
    ) -> CostEstimate {
        let profile = sectors::profile(sector);
        let scale = self.resolve_scale(sector, context, price_range);
        let band = profile.band(scale);
        let base_total = band.midpoint();

        let mut running = base_total;
        let mut applied = Vec::new();
        let mut apply = |name: &str, factor: Option<f64>, running: &mut f64| {
            let Some(factor) = factor else {
                return;
            };
            if factor <= 0.0 || (factor - 1.0).abs() < f64::EPSILON {
                return;
            }
            *running *= factor;
            applied.push(AppliedMultiplier { name: name.to_owned(), factor });
        };

        apply("inflacion", Some(self.config.inflation_index), &mut running);
        apply("mercado", Some(self.config.market_index), &mut running);

        let resolved_profile = client_profile.or(context.client_profile);
        apply(
            "perfil de cliente",
            resolved_profile.and_then(|p| profile.client_profile_multiplier(p)),
            &mut running,
        );

        let resolved_type = project_type
            .map(str::to_owned)
            .or_else(|| context.project_type.clone());
        apply(
            "tipo de proyecto",
            resolved_type.as_deref().and_then(|tag| profile.project_type_multiplier(tag)),
            &mut running,
        );

        // A resolved region beats the generic location multiplier; only one
        // of the two applies.
        let explicit_region = region
            .map(normalize)
            .and_then(|key| region_multiplier(&key, sector))
            .map(|(_, factor)| factor);
        let regional = explicit_region.or({
            if context.region.is_some() {
                context.location_multiplier
            } else {
                None
            }
        });
        match regional {
            Some(factor) => apply("region", Some(factor), &mut running),
            None => apply("ubicacion", context.location_multiplier, &mut running),
        }

        apply("urgencia", context.urgency_multiplier, &mut running);

        if context.timeline_weeks.is_some_and(|weeks| weeks <= RUSH_WEEKS) {
            apply("entrega inmediata", Some(RUSH_MULTIPLIER), &mut running);
        }

        let unclamped = running.round();
        let clamped = unclamped.clamp(band.min, band.max);
        let adjusted = clamped != unclamped;

        CostEstimate {
            scale,
            base_total,
            applied_multipliers: applied,
            target_total: clamped.max(0.0) as u64,
            range_validation: RangeValidation { adjusted, band, unclamped },
        }
    }

    /// Precedence: explicit scale hint > price-range inference > sector
    /// default.
    fn resolve_scale(
        &self,
        sector: Sector,
        context: &ProjectContext,
        price_range: Option<&str>,
    ) -> Scale {
        if let Some(scale) = context.scale_hint {
            return scale;
        }
        if let Some(upper) = price_range.and_then(range_upper_bound) {
            return price_range_scale(upper);
        }
        sectors::profile(sector).default_scale
    }
}
