//! Value sub-score from P/E, P/S and P/B multiples.

use serde::{Deserialize, Serialize};

use crate::{
    registry::SignalCategory,
    score::{ScoreInputs, SubScore, mean_or_neutral, unit},
};

/// Anchor and span of one valuation multiple.
///
/// A multiple equal to `fair` maps to 1.0 and one at `fair + span` maps to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipleBand {
    /// Multiple considered fully cheap.
    pub fair: f64,
    /// Distance over which the score falls to zero.
    pub span: f64,
}

impl MultipleBand {
    /// Create a band.
    pub const fn new(fair: f64, span: f64) -> Self {
        Self { fair, span }
    }

    fn map(&self, multiple: f64) -> f64 {
        unit(1.0 - (multiple - self.fair) / self.span)
    }
}

/// Configuration for the value sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConfig {
    /// Price / earnings band (default: 15 ± 30)
    pub pe: MultipleBand,
    /// Price / sales band (default: 2 ± 8)
    pub ps: MultipleBand,
    /// Price / book band (default: 1 ± 5)
    pub pb: MultipleBand,
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            pe: MultipleBand::new(15.0, 30.0),
            ps: MultipleBand::new(2.0, 8.0),
            pb: MultipleBand::new(1.0, 5.0),
        }
    }
}

/// Value sub-score.
///
/// Averages the mapped score of every positive multiple that is present.
/// Non-positive multiples (losses, negative book) carry no information and
/// are skipped.
#[derive(Debug, Clone, Default)]
pub struct Value {
    config: ValueConfig,
}

impl Value {
    /// Create a value sub-score with the given configuration.
    #[must_use]
    pub const fn new(config: ValueConfig) -> Self {
        Self { config }
    }
}

impl SubScore for Value {
    fn name(&self) -> &'static str {
        "value"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Value
    }

    fn score(&self, inputs: &ScoreInputs<'_>) -> f64 {
        let f = inputs.fundamentals;
        let parts: Vec<f64> = [
            (f.pe_ratio, self.config.pe),
            (f.ps_ratio, self.config.ps),
            (f.pb_ratio, self.config.pb),
        ]
        .into_iter()
        .filter_map(|(ratio, band)| ratio.filter(|r| *r > 0.0).map(|r| band.map(r)))
        .collect();
        unit(mean_or_neutral(&parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use icscore_traits::Fundamentals;

    fn score(f: Fundamentals) -> f64 {
        Value::default().score(&ScoreInputs::new(&f, &[]))
    }

    #[test]
    fn test_neutral_without_multiples() {
        assert_eq!(score(Fundamentals::default()), 0.5);
    }

    #[test]
    fn test_mean_of_available_multiples() {
        let f = Fundamentals {
            pe_ratio: Some(15.0),
            ps_ratio: Some(6.0),
            ..Default::default()
        };
        assert_relative_eq!(score(f), (1.0 + 0.5) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_multiples_are_ignored() {
        let f = Fundamentals {
            pe_ratio: Some(-12.0),
            pb_ratio: Some(3.5),
            ..Default::default()
        };
        assert_relative_eq!(score(f), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_expensive_clips_to_zero() {
        let f = Fundamentals {
            pe_ratio: Some(120.0),
            ..Default::default()
        };
        assert_eq!(score(f), 0.0);
    }
}
