//! Single source of truth for per-sector reference data.
//!
//! The classifier, the estimator, the distributor and the template engine
//! all read the same [`SectorProfile`] record instead of keeping parallel
//! keyword tables. Data is compiled in and read-only after process start.

mod data;

pub use data::{
    area_scale, price_range_scale, region_multiplier, CLIENT_PROFILE_KEYWORDS,
    ENTERPRISE_SCALE_KEYWORDS, POSITIONAL_WEIGHTS, RAW_MATERIAL_KEYWORDS, SMALL_SCALE_KEYWORDS,
    URGENCY_PATTERNS,
};

use crate::domain::context::{ClientProfile, Scale};
use crate::domain::estimate::TicketBand;
use crate::domain::sector::Sector;

/// Keyword rule mapping a description fragment to a project sub-type tag.
#[derive(Clone, Copy, Debug)]
pub struct ProjectTypeRule {
    pub keyword: &'static str,
    pub tag: &'static str,
}

/// Everything the pipeline knows about one sector.
#[derive(Clone, Copy, Debug)]
pub struct SectorProfile {
    pub sector: Sector,
    /// Classifier triggers, in priority order.
    pub keywords: &'static [&'static str],
    pub default_scale: Scale,
    /// National reference ticket bands per scale. May be incomplete.
    pub bands: &'static [(Scale, TicketBand)],
    /// Generic profile band used when a (sector, scale) band is missing.
    pub fallback_band: TicketBand,
    /// Concept templates for the generated-items path.
    pub concepts: &'static [&'static str],
    /// Keyword → benchmark value. Benchmarks act as relative weights.
    pub benchmarks: &'static [(&'static str, f64)],
    /// Keyword → relative weight, tried after the benchmark table.
    pub weights: &'static [(&'static str, f64)],
    pub client_profile_multipliers: &'static [(ClientProfile, f64)],
    /// Detection rules feeding `ProjectContext::project_type`.
    pub project_type_rules: &'static [ProjectTypeRule],
    /// Sub-type multiplier tables; exactly one applies, namely the first
    /// table containing the resolved sub-type key.
    pub project_type_tables: &'static [&'static [(&'static str, f64)]],
    /// Whether prices in this sector swing with raw-material markets.
    pub volatile: bool,
}

impl SectorProfile {
    pub fn band(&self, scale: Scale) -> TicketBand {
        self.bands
            .iter()
            .find(|(candidate, _)| *candidate == scale)
            .map(|(_, band)| *band)
            .unwrap_or(self.fallback_band)
    }

    pub fn has_band(&self, scale: Scale) -> bool {
        self.bands.iter().any(|(candidate, _)| *candidate == scale)
    }

    pub fn client_profile_multiplier(&self, profile: ClientProfile) -> Option<f64> {
        self.client_profile_multipliers
            .iter()
            .find(|(candidate, _)| *candidate == profile)
            .map(|(_, factor)| *factor)
    }

    /// First multiplier table containing the sub-type key wins.
    pub fn project_type_multiplier(&self, tag: &str) -> Option<f64> {
        self.project_type_tables.iter().find_map(|table| {
            table.iter().find(|(key, _)| *key == tag).map(|(_, factor)| *factor)
        })
    }
}

/// Registry lookup. Every sector has a profile, `Other` included.
pub fn profile(sector: Sector) -> &'static SectorProfile {
    data::profile(sector)
}

#[cfg(test)]
mod tests {
    use super::{profile, Scale, Sector};

    #[test]
    fn every_sector_has_a_profile_with_concepts() {
        for sector in Sector::ALL {
            let profile = profile(sector);
            assert_eq!(profile.sector, sector);
            assert!(!profile.concepts.is_empty(), "{sector:?} needs concept templates");
            assert!(profile.fallback_band.min < profile.fallback_band.max);
        }
    }

    #[test]
    fn missing_band_falls_back_to_profile_band() {
        let other = profile(Sector::Other);
        assert!(!other.has_band(Scale::Enterprise));
        assert_eq!(other.band(Scale::Enterprise), other.fallback_band);
    }

    #[test]
    fn construction_design_practice_table_applies_first() {
        let construction = profile(Sector::Construction);
        let anteproyecto = construction.project_type_multiplier("anteproyecto");
        assert_eq!(anteproyecto, Some(0.6));
        // A works sub-type resolves from the second table.
        assert_eq!(construction.project_type_multiplier("obra nueva"), Some(1.3));
    }
}
