//! Profitability sub-score from net margin and return on equity.

use serde::{Deserialize, Serialize};

use crate::{
    registry::SignalCategory,
    score::{ScoreInputs, SubScore, mean_or_neutral, unit},
};

/// Configuration for the profitability sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityConfig {
    /// Score of a zero net margin (default: 0.25)
    pub margin_offset: f64,
    /// Net margin, in percent, that adds a full point (default: 40)
    pub margin_scale: f64,
    /// ROE, in percent, that maps to 1.0 (default: 50)
    pub roe_scale: f64,
}

impl Default for ProfitabilityConfig {
    fn default() -> Self {
        Self {
            margin_offset: 0.25,
            margin_scale: 40.0,
            roe_scale: 50.0,
        }
    }
}

/// Profitability sub-score.
#[derive(Debug, Clone, Default)]
pub struct Profitability {
    config: ProfitabilityConfig,
}

impl Profitability {
    /// Create a profitability sub-score with the given configuration.
    #[must_use]
    pub const fn new(config: ProfitabilityConfig) -> Self {
        Self { config }
    }
}

impl SubScore for Profitability {
    fn name(&self) -> &'static str {
        "profitability"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Profitability
    }

    fn score(&self, inputs: &ScoreInputs<'_>) -> f64 {
        let f = inputs.fundamentals;
        let mut parts = Vec::with_capacity(2);
        if let Some(nm) = f.net_margin {
            parts.push(unit(
                self.config.margin_offset + nm / self.config.margin_scale,
            ));
        }
        if let Some(roe) = f.roe {
            parts.push(unit(roe / self.config.roe_scale));
        }
        unit(mean_or_neutral(&parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use icscore_traits::Fundamentals;

    fn score(f: Fundamentals) -> f64 {
        Profitability::default().score(&ScoreInputs::new(&f, &[]))
    }

    #[test]
    fn test_margin_and_roe() {
        let f = Fundamentals {
            net_margin: Some(10.0),
            roe: Some(40.0),
            ..Default::default()
        };
        assert_relative_eq!(score(f), (0.5 + 0.8) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_loss_maker_floors_at_zero() {
        let f = Fundamentals {
            net_margin: Some(-30.0),
            ..Default::default()
        };
        assert_eq!(score(f), 0.0);
    }

    #[test]
    fn test_neutral_without_data() {
        assert_eq!(score(Fundamentals::default()), 0.5);
    }
}
