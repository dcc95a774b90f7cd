//! The sub-score contract shared by every component of the reduced score.

use icscore_traits::Fundamentals;

use crate::registry::SignalCategory;

/// Neutral sub-score used whenever an input is missing.
pub const NEUTRAL: f64 = 0.5;

/// Point-in-time inputs for one ticker.
///
/// Both pieces must already be filtered to records known on the scoring
/// date; sub-scores never look at dates.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    /// Latest fundamentals record.
    pub fundamentals: &'a Fundamentals,
    /// Closing prices, newest first.
    pub prices: &'a [f64],
}

impl<'a> ScoreInputs<'a> {
    /// Bundle fundamentals and a newest-first price history.
    pub const fn new(fundamentals: &'a Fundamentals, prices: &'a [f64]) -> Self {
        Self {
            fundamentals,
            prices,
        }
    }
}

/// A component of the reduced score, mapping inputs into `[0, 1]`.
pub trait SubScore {
    /// Stable identifier, matching the registry entry.
    fn name(&self) -> &'static str;

    /// Category of the sub-score.
    fn category(&self) -> SignalCategory;

    /// Score in `[0, 1]`; 0.5 when nothing usable is available.
    fn score(&self, inputs: &ScoreInputs<'_>) -> f64;
}

/// Clip into `[0, 1]`, mapping non-finite values to neutral.
pub(crate) fn unit(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { NEUTRAL }
}

/// Mean of the present components, neutral when there are none.
pub(crate) fn mean_or_neutral(parts: &[f64]) -> f64 {
    if parts.is_empty() {
        NEUTRAL
    } else {
        parts.iter().sum::<f64>() / parts.len() as f64
    }
}
