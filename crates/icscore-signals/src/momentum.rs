//! Momentum sub-score: 12-month price change net of the most recent month.

use serde::{Deserialize, Serialize};

use crate::{
    registry::SignalCategory,
    score::{NEUTRAL, ScoreInputs, SubScore, unit},
};

/// Configuration for the momentum sub-score.
///
/// Offsets count closes in a newest-first history, so with the defaults the
/// long leg compares the latest close with the 252nd one back and the skip
/// leg with the 21st.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Closes spanned by the long leg (default: 252 ≈ 12 months)
    pub lookback_points: usize,

    /// Offset of the recent-reversal leg (default: 20 ≈ 1 month)
    pub skip_points: usize,

    /// Sub-score change per unit of net momentum (default: 2.5)
    pub sensitivity: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback_points: 252,
            skip_points: 20,
            sensitivity: 2.5,
        }
    }
}

/// Momentum sub-score.
///
/// `0.5 + ((p0/p_long - 1) - (p0/p_skip - 1)) · sensitivity`. Histories
/// shorter than the lookback, or non-positive reference closes, are neutral.
#[derive(Debug, Clone, Default)]
pub struct Momentum {
    config: MomentumConfig,
}

impl Momentum {
    /// Create a momentum sub-score with the given configuration.
    #[must_use]
    pub const fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    /// Number of closes needed for a non-neutral score.
    #[must_use]
    pub const fn lookback_points(&self) -> usize {
        self.config.lookback_points
    }
}

impl SubScore for Momentum {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Momentum
    }

    fn score(&self, inputs: &ScoreInputs<'_>) -> f64 {
        let prices = inputs.prices;
        let lookback = self.config.lookback_points;
        if lookback == 0 || prices.len() < lookback || self.config.skip_points >= prices.len() {
            return NEUTRAL;
        }

        let latest = prices[0];
        let long_ref = prices[lookback - 1];
        let skip_ref = prices[self.config.skip_points];
        if long_ref <= 0.0 || skip_ref <= 0.0 {
            return NEUTRAL;
        }

        let twelve_month = latest / long_ref - 1.0;
        let one_month = latest / skip_ref - 1.0;
        unit(NEUTRAL + (twelve_month - one_month) * self.config.sensitivity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use icscore_traits::Fundamentals;

    fn history(latest: f64, skip: f64, long: f64) -> Vec<f64> {
        let mut prices = vec![100.0; 252];
        prices[0] = latest;
        prices[20] = skip;
        prices[251] = long;
        prices
    }

    fn score(prices: &[f64]) -> f64 {
        let f = Fundamentals::default();
        Momentum::default().score(&ScoreInputs::new(&f, prices))
    }

    #[test]
    fn test_short_history_is_neutral() {
        assert_eq!(score(&[100.0; 100]), 0.5);
    }

    #[test]
    fn test_equal_legs_are_neutral() {
        assert_relative_eq!(score(&history(110.0, 100.0, 100.0)), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_long_leg_without_recent_move() {
        // 12m = 0.2, 1m = 0 -> 0.5 + 0.2 * 2.5
        assert_relative_eq!(score(&history(120.0, 120.0, 100.0)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_recent_move_is_subtracted() {
        let expected = 0.5 + (0.2 - (120.0 / 110.0 - 1.0)) * 2.5;
        assert_relative_eq!(score(&history(120.0, 110.0, 100.0)), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_reference_is_neutral() {
        assert_eq!(score(&history(120.0, 110.0, 0.0)), 0.5);
    }
}
