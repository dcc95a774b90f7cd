//! Holding-weighted style exposures of a bucket portfolio.
//!
//! An exposure is `Σ weight_i · score_i` over the holdings that have a score
//! for the factor. Active exposure is the difference against a benchmark
//! portfolio under the same scores.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    ops::Sub,
    str::FromStr,
};

use icscore_traits::{IcScoreError, Ticker};
use serde::{Deserialize, Serialize};

use crate::holding::Portfolio;

/// Style factors an exposure is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleFactor {
    /// Market beta
    Beta,
    /// Size; positive means large cap
    Size,
    /// Value; positive means cheap
    Value,
    /// Price momentum
    Momentum,
    /// Quality
    Quality,
    /// Volatility
    Volatility,
}

impl StyleFactor {
    /// Every factor, in reporting order.
    pub const ALL: [Self; 6] = [
        Self::Beta,
        Self::Size,
        Self::Value,
        Self::Momentum,
        Self::Quality,
        Self::Volatility,
    ];

    /// Lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::Size => "size",
            Self::Value => "value",
            Self::Momentum => "momentum",
            Self::Quality => "quality",
            Self::Volatility => "volatility",
        }
    }
}

impl fmt::Display for StyleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleFactor {
    type Err = IcScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| IcScoreError::InvalidConfiguration(format!("Unknown style factor: {s}")))
    }
}

/// Per-ticker factor scores, keyed by factor.
pub type FactorScores = BTreeMap<StyleFactor, HashMap<Ticker, f64>>;

/// Exposure of a portfolio to each style factor.
///
/// Factors without scores report 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorExposure {
    /// Market beta exposure
    pub beta: f64,
    /// Size exposure
    pub size: f64,
    /// Value exposure
    pub value: f64,
    /// Momentum exposure
    pub momentum: f64,
    /// Quality exposure
    pub quality: f64,
    /// Volatility exposure
    pub volatility: f64,
}

impl FactorExposure {
    /// Exposure to one factor.
    pub const fn get(&self, factor: StyleFactor) -> f64 {
        match factor {
            StyleFactor::Beta => self.beta,
            StyleFactor::Size => self.size,
            StyleFactor::Value => self.value,
            StyleFactor::Momentum => self.momentum,
            StyleFactor::Quality => self.quality,
            StyleFactor::Volatility => self.volatility,
        }
    }

    const fn slot(&mut self, factor: StyleFactor) -> &mut f64 {
        match factor {
            StyleFactor::Beta => &mut self.beta,
            StyleFactor::Size => &mut self.size,
            StyleFactor::Value => &mut self.value,
            StyleFactor::Momentum => &mut self.momentum,
            StyleFactor::Quality => &mut self.quality,
            StyleFactor::Volatility => &mut self.volatility,
        }
    }
}

impl Sub for FactorExposure {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let mut out = self;
        for factor in StyleFactor::ALL {
            *out.slot(factor) -= rhs.get(factor);
        }
        out
    }
}

impl Portfolio {
    /// Holding-weighted exposure to every scored factor.
    ///
    /// Holdings without a score for a factor contribute nothing to it; the
    /// remaining weights are not renormalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use icscore_portfolio::{
    ///     Candidate, DecileBuilder, FactorScores, StyleFactor, WeightingScheme,
    /// };
    ///
    /// let candidates = vec![Candidate::new("A", 90.0), Candidate::new("B", 80.0)];
    /// let bucket = &DecileBuilder::new(WeightingScheme::Equal).build(&candidates)[0];
    ///
    /// let mut scores = FactorScores::new();
    /// scores.insert(
    ///     StyleFactor::Size,
    ///     [("A".to_string(), 1.0), ("B".to_string(), -0.5)].into_iter().collect(),
    /// );
    /// let exposure = bucket.exposures(&scores);
    /// assert_eq!(exposure.size, 0.25);
    /// assert_eq!(exposure.beta, 0.0);
    /// ```
    pub fn exposures(&self, scores: &FactorScores) -> FactorExposure {
        let mut exposure = FactorExposure::default();
        for (&factor, by_ticker) in scores {
            *exposure.slot(factor) = self
                .holdings
                .iter()
                .filter_map(|h| by_ticker.get(&h.ticker).map(|s| h.weight * s))
                .sum();
        }
        exposure
    }

    /// Exposure relative to `benchmark` under the same scores.
    pub fn active_exposure(&self, benchmark: &Self, scores: &FactorScores) -> FactorExposure {
        self.exposures(scores) - benchmark.exposures(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Candidate, DecileBuilder, Holding, WeightingScheme};
    use approx::assert_relative_eq;

    fn scores(pairs: &[(&str, f64)]) -> HashMap<Ticker, f64> {
        pairs.iter().map(|(t, s)| ((*t).to_string(), *s)).collect()
    }

    fn portfolio(weights: &[(&str, f64)]) -> Portfolio {
        let holdings = weights
            .iter()
            .map(|(t, w)| Holding::from_candidate(&Candidate::new(*t, 50.0), *w))
            .collect();
        Portfolio::new(1, holdings)
    }

    #[test]
    fn test_weighted_exposure() {
        let p = portfolio(&[("A", 0.6), ("B", 0.4)]);
        let mut factor_scores = FactorScores::new();
        factor_scores.insert(StyleFactor::Value, scores(&[("A", 1.0), ("B", -1.0)]));
        factor_scores.insert(StyleFactor::Beta, scores(&[("A", 1.2), ("B", 0.8)]));

        let exposure = p.exposures(&factor_scores);
        assert_relative_eq!(exposure.value, 0.2, epsilon = 1e-12);
        assert_relative_eq!(exposure.beta, 1.04, epsilon = 1e-12);
        assert_eq!(exposure.momentum, 0.0);
    }

    #[test]
    fn test_unscored_holdings_contribute_nothing() {
        let p = portfolio(&[("A", 0.5), ("B", 0.5)]);
        let mut factor_scores = FactorScores::new();
        factor_scores.insert(StyleFactor::Quality, scores(&[("A", 2.0), ("Z", 9.0)]));
        assert_relative_eq!(p.exposures(&factor_scores).quality, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_active_exposure_of_top_bucket() {
        let candidates: Vec<Candidate> =
            (0..20).map(|i| Candidate::new(format!("T{i:02}"), f64::from(i))).collect();
        let deciles = DecileBuilder::new(WeightingScheme::Equal).build(&candidates);
        let universe = DecileBuilder::with_buckets(1, WeightingScheme::Equal)
            .unwrap()
            .build(&candidates);

        // Size rises with score, so the top bucket tilts large against the universe.
        let mut factor_scores = FactorScores::new();
        factor_scores.insert(
            StyleFactor::Size,
            candidates.iter().map(|c| (c.ticker.clone(), c.score / 10.0)).collect(),
        );

        let active = deciles[0].active_exposure(&universe[0], &factor_scores);
        assert_relative_eq!(active.size, 1.85 - 0.95, epsilon = 1e-12);
        assert_eq!(active.value, 0.0);
        assert_eq!(
            deciles[0].active_exposure(&deciles[0], &factor_scores),
            FactorExposure::default()
        );
    }

    #[test]
    fn test_style_factor_names() {
        assert_eq!("Momentum".parse::<StyleFactor>().unwrap(), StyleFactor::Momentum);
        assert!("liquidity".parse::<StyleFactor>().is_err());
        assert_eq!(StyleFactor::Volatility.to_string(), "volatility");
        let json = serde_json::to_string(&StyleFactor::Size).unwrap();
        assert_eq!(json, "\"size\"");
    }
}
