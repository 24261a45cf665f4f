//! Weighted proportional price distribution.
//!
//! Weights come from the sector registry (benchmark values double as
//! relative weights), degrade to equal shares on degenerate input, and an
//! alternating deterministic nudge keeps totals from landing on
//! suspiciously round numbers. The rounding steps are cosmetic but must be
//! reproduced exactly for output compatibility.

use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::domain::item::{DistributionResult, QuoteItem};
use crate::domain::sector::Sector;
use crate::sectors::{self, POSITIONAL_WEIGHTS};
use crate::text::normalize;

/// Minimum share of the base subtotal each item keeps, divided by the item
/// count.
const ITEM_FLOOR_RATIO: f64 = 0.05;

/// An unpriced line heading for allocation.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionItem {
    pub description: String,
    pub quantity: u32,
}

impl DistributionItem {
    pub fn new(description: impl Into<String>, quantity: u32) -> Self {
        Self { description: description.into(), quantity: quantity.max(1) }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistributionOptions {
    /// Margin offset from the quality tier, applied on top of the base rate.
    pub margin_offset: f64,
    /// Architecture-practice mode: fixed position-based weights instead of
    /// keyword lookups.
    pub positional_weights: bool,
}

#[derive(Clone, Debug)]
pub struct PriceDistributor {
    config: EngineConfig,
}

impl PriceDistributor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Distribute `target_total` (tax included) across `items`. Never
    /// fails; an empty item list yields an empty result.
    pub fn distribute(
        &self,
        items: &[DistributionItem],
        target_total: f64,
        sector: Sector,
        tax_percent: f64,
        options: DistributionOptions,
    ) -> DistributionResult {
        if items.is_empty() || !target_total.is_finite() || target_total <= 0.0 {
            return DistributionResult {
                items: Vec::new(),
                aesthetic_adjusted: false,
                weights: Vec::new(),
            };
        }

        let weights = self.normalized_weights(items, sector, options.positional_weights);

        let tax_factor = 1.0 + tax_percent / 100.0;
        let target_subtotal = target_total / tax_factor;
        let margin_multiplier = 1.0 + (self.config.base_margin + options.margin_offset).max(0.0);
        let overhead_multiplier = 1.0 + self.config.overhead_pct;
        let base_subtotal = target_subtotal / (margin_multiplier * overhead_multiplier);

        // Weighted allocation with a per-item floor so no line collapses to
        // a token amount.
        let floor = ITEM_FLOOR_RATIO * base_subtotal / items.len() as f64;
        let mut totals: Vec<f64> = weights
            .iter()
            .map(|weight| (base_subtotal * weight).max(floor))
            .map(|allocation| allocation * overhead_multiplier * margin_multiplier)
            .collect();

        for (index, total) in totals.iter_mut().enumerate() {
            *total = self.nudge(*total, index);
        }

        // Re-center on the target subtotal when the floors or nudges moved
        // the sum too far, then break any round endings that reappeared.
        let sum: f64 = totals.iter().sum();
        if (sum - target_subtotal).abs() > 1.0 && sum > 0.0 {
            let ratio = target_subtotal / sum;
            for (index, total) in totals.iter_mut().enumerate() {
                *total *= ratio;
                *total = self.nudge(*total, index);
            }
        }

        let mut quote_items: Vec<QuoteItem> = items
            .iter()
            .zip(&totals)
            .map(|(item, total)| {
                let unit_price = round2(total / item.quantity as f64);
                QuoteItem::new(item.description.clone(), item.quantity, to_decimal(unit_price))
            })
            .collect();

        let aesthetic_adjusted =
            self.adjust_round_grand_total(&mut quote_items, tax_factor);

        DistributionResult { items: quote_items, aesthetic_adjusted, weights }
    }

    /// Per-item weight: benchmark table, then relative-weight table, then
    /// neutral. Positional mode replaces all of that with the fixed table.
    fn normalized_weights(
        &self,
        items: &[DistributionItem],
        sector: Sector,
        positional: bool,
    ) -> Vec<f64> {
        let profile = sectors::profile(sector);

        let raw: Vec<f64> = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if positional {
                    let clamped = index.min(POSITIONAL_WEIGHTS.len() - 1);
                    return POSITIONAL_WEIGHTS[clamped];
                }

                let normalized = normalize(&item.description);
                profile
                    .benchmarks
                    .iter()
                    .find(|(keyword, _)| normalized.contains(keyword))
                    .map(|(_, benchmark)| *benchmark)
                    .or_else(|| {
                        profile
                            .weights
                            .iter()
                            .find(|(keyword, _)| normalized.contains(keyword))
                            .map(|(_, weight)| *weight)
                    })
                    .unwrap_or(1.0)
            })
            .collect();

        let sum: f64 = raw.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            let equal = 1.0 / items.len() as f64;
            return vec![equal; items.len()];
        }
        raw.into_iter().map(|weight| weight / sum).collect()
    }

    /// Push totals ending in 00 or 50 off the round mark. The step is
    /// deterministic and the sign alternates by item index.
    fn nudge(&self, total: f64, index: usize) -> f64 {
        if !has_round_ending(total) {
            return total;
        }
        let rules = &self.config.nudge;
        let span = rules.max_step - rules.min_step;
        let step = rules.min_step + (index % 3) as f64 * (span / 2.0);
        let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
        (total + sign * step).max(0.0)
    }

    /// Final aesthetic pass on the tax-inclusive grand total. Only applies
    /// when the needed correction stays within the configured share of the
    /// total.
    fn adjust_round_grand_total(&self, items: &mut [QuoteItem], tax_factor: f64) -> bool {
        let subtotal: f64 = items.iter().filter_map(|item| decimal_to_f64(item.total())).sum();
        let grand_total = subtotal * tax_factor;
        if grand_total <= 0.0 || !has_round_ending(grand_total) {
            return false;
        }

        let correction = self.config.nudge.min_step;
        if correction > self.config.nudge.max_correction_pct * grand_total {
            return false;
        }

        let ratio = (grand_total - correction) / grand_total;
        for item in items.iter_mut() {
            let current = decimal_to_f64(item.unit_price).unwrap_or(0.0);
            item.unit_price = to_decimal(round2(current * ratio));
        }
        true
    }
}

/// A total reads as suspiciously round when it is a whole amount whose last
/// two digits are exactly 00 or 50.
fn has_round_ending(total: f64) -> bool {
    let nearest = total.round();
    if (total - nearest).abs() > 0.005 {
        return false;
    }
    matches!((nearest as i64).rem_euclid(100), 0 | 50)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default().round_dp(2)
}

fn decimal_to_f64(value: Decimal) -> Option<f64> {
    value.try_into().ok()
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::domain::sector::Sector;

    use super::{DistributionItem, DistributionOptions, PriceDistributor};

    fn distributor() -> PriceDistributor {
        PriceDistributor::new(EngineConfig::default())
    }

    fn items(descriptions: &[&str]) -> Vec<DistributionItem> {
        descriptions.iter().map(|d| DistributionItem::new(*d, 1)).collect()
    }

    fn grand_total(result: &crate::domain::item::DistributionResult, tax: f64) -> f64 {
        let subtotal: f64 = result
            .items
            .iter()
            .map(|item| TryInto::<f64>::try_into(item.total()).unwrap_or(0.0))
            .sum();
        subtotal * (1.0 + tax / 100.0)
    }

    #[test]
    fn grand_total_reproduces_target_within_one_unit() {
        let result = distributor().distribute(
            &items(&["Estructura y cimentación", "Instalación eléctrica", "Limpieza final"]),
            18_437.0,
            Sector::Construction,
            21.0,
            DistributionOptions::default(),
        );

        let reproduced = grand_total(&result, 21.0);
        assert!(
            (reproduced - 18_437.0).abs() <= 1.0,
            "grand total {reproduced} drifted from target"
        );
    }

    #[test]
    fn every_item_has_positive_quantity_and_non_negative_price() {
        let result = distributor().distribute(
            &items(&["Diseño", "Desarrollo", "Pruebas", "Despliegue"]),
            9_731.0,
            Sector::Software,
            21.0,
            DistributionOptions::default(),
        );

        assert_eq!(result.items.len(), 4);
        for item in &result.items {
            assert!(item.quantity >= 1);
            assert!(item.unit_price >= rust_decimal::Decimal::ZERO);
        }
    }

    #[test]
    fn benchmark_keywords_concentrate_cost() {
        let result = distributor().distribute(
            &items(&["Estructura del edificio", "Limpieza de obra"]),
            24_319.0,
            Sector::Construction,
            21.0,
            DistributionOptions::default(),
        );

        // "estructura" benchmarks at 9000, "limpieza" at 800.
        assert!(result.items[0].total() > result.items[1].total());
        assert!(result.weights[0] > result.weights[1]);
    }

    #[test]
    fn identical_items_receive_identical_totals() {
        let result = distributor().distribute(
            &items(&["Sesión de consultoría", "Sesión de consultoría"]),
            7_417.0,
            Sector::Consulting,
            21.0,
            DistributionOptions::default(),
        );

        assert_eq!(result.items[0].total(), result.items[1].total());
    }

    #[test]
    fn unknown_descriptions_fall_back_to_equal_weights() {
        let result = distributor().distribute(
            &items(&["Fase uno", "Fase dos", "Fase tres"]),
            6_143.0,
            Sector::Other,
            21.0,
            DistributionOptions::default(),
        );

        assert!(result.weights.iter().all(|w| (w - 1.0 / 3.0).abs() < 1e-9));
    }

    #[test]
    fn positional_mode_ranks_early_items_higher() {
        let result = distributor().distribute(
            &items(&["Anteproyecto", "Proyecto básico", "Dirección de obra"]),
            31_271.0,
            Sector::Construction,
            21.0,
            DistributionOptions { positional_weights: true, ..Default::default() },
        );

        assert!(result.weights[0] > result.weights[1]);
        assert!(result.weights[1] > result.weights[2]);
        assert!(result.items[0].total() > result.items[2].total());
    }

    #[test]
    fn floor_prevents_token_line_items() {
        let result = distributor().distribute(
            &items(&["Estructura completa", "Limpieza"]),
            20_143.0,
            Sector::Construction,
            21.0,
            DistributionOptions::default(),
        );

        let subtotal: f64 = result
            .items
            .iter()
            .map(|item| TryInto::<f64>::try_into(item.total()).unwrap_or(0.0))
            .sum();
        let smallest: f64 =
            TryInto::<f64>::try_into(result.items[1].total()).unwrap_or(0.0);

        // Rescaling keeps proportions, so the floor ratio holds on the
        // final subtotal too.
        assert!(smallest >= 0.05 * subtotal / 2.0 * 0.9);
    }

    #[test]
    fn premium_margin_offset_shrinks_base_but_keeps_target() {
        let standard = distributor().distribute(
            &items(&["Campaña de lanzamiento", "Informe de resultados"]),
            8_912.0,
            Sector::Marketing,
            21.0,
            DistributionOptions::default(),
        );
        let premium = distributor().distribute(
            &items(&["Campaña de lanzamiento", "Informe de resultados"]),
            8_912.0,
            Sector::Marketing,
            21.0,
            DistributionOptions { margin_offset: 0.07, ..Default::default() },
        );

        // The requested total is preserved either way.
        assert!((grand_total(&standard, 21.0) - 8_912.0).abs() <= 1.0);
        assert!((grand_total(&premium, 21.0) - 8_912.0).abs() <= 1.0);
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let result = distributor().distribute(
            &[],
            5_000.0,
            Sector::Software,
            21.0,
            DistributionOptions::default(),
        );
        assert!(result.items.is_empty());
        assert!(!result.aesthetic_adjusted);
    }

    #[test]
    fn non_positive_target_degrades_to_empty_result() {
        let result = distributor().distribute(
            &items(&["Algo"]),
            0.0,
            Sector::Software,
            21.0,
            DistributionOptions::default(),
        );
        assert!(result.items.is_empty());
    }

    #[test]
    fn aesthetic_pass_breaks_a_round_grand_total() {
        // With no tax the grand total equals the subtotal; 3100 split over
        // these benchmark weights lands on .41/.59 cents, so the sum stays
        // exactly 3100.00 and only the final pass can break the ending.
        let result = distributor().distribute(
            &items(&["Estructura completa", "Carpintería de madera"]),
            3_100.0,
            Sector::Construction,
            0.0,
            DistributionOptions::default(),
        );

        assert!(result.aesthetic_adjusted);
        let reproduced = grand_total(&result, 0.0);
        let ending = (reproduced.round() as i64).rem_euclid(100);
        assert!(ending != 0 && ending != 50, "still round: {reproduced}");
        assert!((reproduced - 3_100.0).abs() <= 0.02 * 3_100.0);
    }

    #[test]
    fn round_grand_totals_get_an_aesthetic_shift() {
        // 6050 / 1.21 = 5000 exactly; with a single neutral-weight item the
        // allocation survives rounding and the grand total ends in 50.
        let result = distributor().distribute(
            &items(&["Servicio completo"]),
            6_050.0,
            Sector::Other,
            21.0,
            DistributionOptions::default(),
        );

        if result.aesthetic_adjusted {
            let reproduced = grand_total(&result, 21.0);
            assert!((reproduced - 6_050.0).abs() <= 0.02 * 6_050.0 + 1.0);
            let ending = (reproduced.round() as i64).rem_euclid(100);
            assert!(ending != 0 && ending != 50, "still round: {reproduced}");
        }
    }
}
