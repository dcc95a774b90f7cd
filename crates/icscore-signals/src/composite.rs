//! Reduced composite score used when no stored score exists.
//!
//! The full scoring pipeline is not available when replaying history, so the
//! backtest falls back to four sub-scores that only need point-in-time
//! fundamentals and a price history. They are combined with fixed relative
//! weights and rescaled to the 0–100 range of stored scores.

use icscore_traits::{Fundamentals, IcScoreError, Result};
use serde::{Deserialize, Serialize};

use crate::{
    growth::{Growth, GrowthConfig},
    registry::SignalCategory,
    momentum::{Momentum, MomentumConfig},
    profitability::{Profitability, ProfitabilityConfig},
    score::{ScoreInputs, SubScore},
    value::{Value, ValueConfig},
};

/// Relative weights of the sub-scores.
///
/// Only the ratios matter: the composite divides by the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    /// Growth weight (default: 0.12)
    pub growth: f64,
    /// Value weight (default: 0.12)
    pub value: f64,
    /// Profitability weight (default: 0.12)
    pub profitability: f64,
    /// Momentum weight (default: 0.10)
    pub momentum: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            growth: 0.12,
            value: 0.12,
            profitability: 0.12,
            momentum: 0.10,
        }
    }
}

impl FactorWeights {
    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.growth + self.value + self.profitability + self.momentum
    }

    /// Weight of one sub-score category.
    pub const fn of(&self, category: SignalCategory) -> f64 {
        match category {
            SignalCategory::Growth => self.growth,
            SignalCategory::Value => self.value,
            SignalCategory::Profitability => self.profitability,
            SignalCategory::Momentum => self.momentum,
        }
    }

    /// Share of the composite carried by one category; 0 when all weights
    /// are zero.
    pub fn share(&self, category: SignalCategory) -> f64 {
        let total = self.total();
        if total > 0.0 { self.of(category) / total } else { 0.0 }
    }
}

/// Immutable settings of the reduced scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Relative sub-score weights
    pub weights: FactorWeights,
    /// Fewest closes for which a score is produced at all (default: 20)
    pub min_price_points: usize,
    /// Growth sub-score settings
    pub growth: GrowthConfig,
    /// Value sub-score settings
    pub value: ValueConfig,
    /// Profitability sub-score settings
    pub profitability: ProfitabilityConfig,
    /// Momentum sub-score settings
    pub momentum: MomentumConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            min_price_points: 20,
            growth: GrowthConfig::default(),
            value: ValueConfig::default(),
            profitability: ProfitabilityConfig::default(),
            momentum: MomentumConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Check the weights.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidConfiguration`] for a negative weight or
    /// weights that sum to zero.
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        if [w.growth, w.value, w.profitability, w.momentum]
            .iter()
            .any(|x| !x.is_finite() || *x < 0.0)
        {
            return Err(IcScoreError::InvalidConfiguration(
                "factor weights must be finite and non-negative".to_string(),
            ));
        }
        if w.total() <= 0.0 {
            return Err(IcScoreError::InvalidConfiguration(
                "factor weights sum to zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sub-scores and composite for one ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Growth sub-score in [0, 1]
    pub growth: f64,
    /// Value sub-score in [0, 1]
    pub value: f64,
    /// Profitability sub-score in [0, 1]
    pub profitability: f64,
    /// Momentum sub-score in [0, 1]
    pub momentum: f64,
    /// Weighted composite in [0, 100]
    pub composite: f64,
}

/// Computes the reduced score.
///
/// # Example
///
/// ```
/// use icscore_signals::ReducedScorer;
/// use icscore_traits::Fundamentals;
///
/// let scorer = ReducedScorer::default();
/// let prices = vec![100.0; 30];
///
/// // Neutral fundamentals and too little history for momentum: 50.
/// let score = scorer.score(Some(&Fundamentals::default()), Some(prices.as_slice()));
/// assert!((score.unwrap() - 50.0).abs() < 1e-9);
///
/// // Without fundamentals there is nothing to score.
/// assert_eq!(scorer.score(None, Some(prices.as_slice())), None);
/// ```
#[derive(Debug, Clone)]
pub struct ReducedScorer {
    config: ScoringConfig,
    growth: Growth,
    value: Value,
    profitability: Profitability,
    momentum: Momentum,
}

impl Default for ReducedScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ReducedScorer {
    /// Create a scorer from its configuration.
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            growth: Growth::new(config.growth.clone()),
            value: Value::new(config.value.clone()),
            profitability: Profitability::new(config.profitability.clone()),
            momentum: Momentum::new(config.momentum.clone()),
            config,
        }
    }

    /// The scorer's configuration.
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Closes to request from the data layer: enough for momentum.
    pub fn history_points(&self) -> usize {
        self.momentum
            .lookback_points()
            .max(self.config.min_price_points)
    }

    /// Composite score in `[0, 100]`.
    ///
    /// `None` when fundamentals are missing or the price history (newest
    /// first) is shorter than `min_price_points`.
    pub fn score(
        &self,
        fundamentals: Option<&Fundamentals>,
        prices: Option<&[f64]>,
    ) -> Option<f64> {
        self.breakdown(fundamentals, prices).map(|b| b.composite)
    }

    /// Sub-scores and composite, with the same availability rules as
    /// [`Self::score`].
    pub fn breakdown(
        &self,
        fundamentals: Option<&Fundamentals>,
        prices: Option<&[f64]>,
    ) -> Option<ScoreBreakdown> {
        let fundamentals = fundamentals?;
        let prices = prices?;
        if prices.len() < self.config.min_price_points {
            return None;
        }

        let inputs = ScoreInputs::new(fundamentals, prices);
        let growth = self.growth.score(&inputs);
        let value = self.value.score(&inputs);
        let profitability = self.profitability.score(&inputs);
        let momentum = self.momentum.score(&inputs);

        let w = &self.config.weights;
        let total = w.total();
        if total <= 0.0 {
            return None;
        }
        let weighted = growth * w.growth
            + value * w.value
            + profitability * w.profitability
            + momentum * w.momentum;
        let composite = (weighted / total * 100.0).clamp(0.0, 100.0);

        Some(ScoreBreakdown {
            growth,
            value,
            profitability,
            momentum,
            composite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_category_weights() {
        let weights = FactorWeights::default();
        assert_eq!(weights.of(SignalCategory::Momentum), 0.10);
        assert_relative_eq!(weights.share(SignalCategory::Growth), 0.12 / 0.46, epsilon = 1e-12);

        let zero = FactorWeights {
            growth: 0.0,
            value: 0.0,
            profitability: 0.0,
            momentum: 0.0,
        };
        assert_eq!(zero.share(SignalCategory::Value), 0.0);
    }

    #[test]
    fn test_default_weights() {
        let w = FactorWeights::default();
        assert_relative_eq!(w.total(), 0.46, epsilon = 1e-12);
    }

    #[test]
    fn test_requires_minimum_history() {
        let scorer = ReducedScorer::default();
        let f = Fundamentals::default();
        assert_eq!(scorer.score(Some(&f), Some(&[100.0; 19][..])), None);
        assert_eq!(scorer.score(Some(&f), None), None);
        assert!(scorer.score(Some(&f), Some(&[100.0; 20][..])).is_some());
    }

    #[test]
    fn test_weighted_composite() {
        let scorer = ReducedScorer::default();
        let f = Fundamentals {
            revenue_growth_yoy: Some(20.0),
            net_margin: Some(10.0),
            roe: Some(40.0),
            pe_ratio: Some(15.0),
            ..Default::default()
        };
        let b = scorer.breakdown(Some(&f), Some(&[100.0; 40][..])).unwrap();
        assert_relative_eq!(b.growth, 0.8, epsilon = 1e-12);
        assert_relative_eq!(b.value, 1.0, epsilon = 1e-12);
        assert_relative_eq!(b.profitability, 0.65, epsilon = 1e-12);
        assert_relative_eq!(b.momentum, 0.5, epsilon = 1e-12);

        let expected = (0.8 * 0.12 + 1.0 * 0.12 + 0.65 * 0.12 + 0.5 * 0.10) / 0.46 * 100.0;
        assert_relative_eq!(b.composite, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_history_points_covers_momentum() {
        assert_eq!(ReducedScorer::default().history_points(), 252);
    }

    #[test]
    fn test_validate_weights() {
        assert!(ScoringConfig::default().validate().is_ok());

        let zero = ScoringConfig {
            weights: FactorWeights {
                growth: 0.0,
                value: 0.0,
                profitability: 0.0,
                momentum: 0.0,
            },
            ..Default::default()
        };
        assert!(zero.validate().unwrap_err().is_fatal());
    }

    #[test]
    fn test_config_deserializes_partially() {
        let config: ScoringConfig = serde_json::from_str(r#"{"min_price_points": 60}"#).unwrap();
        assert_eq!(config.min_price_points, 60);
        assert_eq!(config.weights, FactorWeights::default());
    }
}
