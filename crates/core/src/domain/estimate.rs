use serde::{Deserialize, Serialize};

use crate::domain::context::Scale;

/// A `[min, max]` currency range configured per sector and scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketBand {
    pub min: f64,
    pub max: f64,
}

impl TicketBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// One multiplicative adjustment actually applied, in application order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedMultiplier {
    pub name: String,
    pub factor: f64,
}

/// Outcome of clamping the adjusted total into the resolved ticket band.
/// When clamping moved the value, the pre-clamp total is kept for audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeValidation {
    pub adjusted: bool,
    pub band: TicketBand,
    pub unclamped: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub scale: Scale,
    pub base_total: f64,
    pub applied_multipliers: Vec<AppliedMultiplier>,
    pub target_total: u64,
    pub range_validation: RangeValidation,
}

impl CostEstimate {
    /// Product of every applied factor, for traceability checks.
    pub fn combined_factor(&self) -> f64 {
        self.applied_multipliers.iter().map(|applied| applied.factor).product()
    }
}

#[cfg(test)]
mod tests {
    use super::TicketBand;

    #[test]
    fn midpoint_is_band_center() {
        let band = TicketBand::new(2_000.0, 6_000.0);
        assert_eq!(band.midpoint(), 4_000.0);
        assert!(band.contains(4_000.0));
        assert!(!band.contains(1_999.0));
    }
}
