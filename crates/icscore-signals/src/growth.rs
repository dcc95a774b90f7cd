//! Growth sub-score from year-over-year revenue and EPS growth.

use serde::{Deserialize, Serialize};

use crate::{
    registry::SignalCategory,
    score::{NEUTRAL, ScoreInputs, SubScore, unit},
};

/// Configuration for the growth sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Sub-score change per 100 percentage points of growth (default: 1.5)
    pub sensitivity: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self { sensitivity: 1.5 }
    }
}

/// Growth sub-score.
///
/// Starts neutral, moves to `0.5 + g/100 · sensitivity` when revenue growth
/// is known, then averages in the EPS-growth equivalent when EPS growth is
/// known.
///
/// # Example
///
/// ```
/// use icscore_signals::{Growth, ScoreInputs, SubScore};
/// use icscore_traits::Fundamentals;
///
/// let f = Fundamentals { revenue_growth_yoy: Some(20.0), ..Default::default() };
/// let score = Growth::default().score(&ScoreInputs::new(&f, &[]));
/// assert!((score - 0.8).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Growth {
    config: GrowthConfig,
}

impl Growth {
    /// Create a growth sub-score with the given configuration.
    #[must_use]
    pub const fn new(config: GrowthConfig) -> Self {
        Self { config }
    }

    fn mapped(&self, growth_pct: f64) -> f64 {
        unit(NEUTRAL + growth_pct / 100.0 * self.config.sensitivity)
    }
}

impl SubScore for Growth {
    fn name(&self) -> &'static str {
        "growth"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::Growth
    }

    fn score(&self, inputs: &ScoreInputs<'_>) -> f64 {
        let f = inputs.fundamentals;
        let mut score = NEUTRAL;
        if let Some(g) = f.revenue_growth_yoy {
            score = self.mapped(g);
        }
        if let Some(e) = f.eps_growth_yoy {
            score = (score + self.mapped(e)) / 2.0;
        }
        unit(score)
    }
}
