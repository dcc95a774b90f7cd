//! Weighting schemes for bucket portfolios.

use std::{fmt, str::FromStr};

use icscore_traits::{IcScoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::holding::Candidate;

/// Score assumed for a holding without one when weighting by score.
const NEUTRAL_SCORE: f64 = 50.0;

/// How the members of a bucket are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// `1 / n` each.
    #[default]
    Equal,
    /// Proportional to market capitalisation.
    MarketCap,
    /// Proportional to score.
    ScoreWeighted,
    /// Inverse of trailing volatility.
    ///
    /// No volatility estimates are available to the builder, so this falls
    /// back to equal weight.
    InverseVolatility,
}

impl WeightingScheme {
    /// Weights for `members`, in order, summing to 1.
    ///
    /// Empty input yields an empty vector. Schemes whose raw weights are
    /// unusable (no caps, non-positive totals) fall back to equal weight.
    pub fn weights(self, members: &[Candidate]) -> Vec<f64> {
        if members.is_empty() {
            return Vec::new();
        }
        match self {
            Self::Equal => equal(members.len()),
            Self::MarketCap => {
                let caps: Vec<f64> = members
                    .iter()
                    .map(|m| m.market_cap.filter(|c| c.is_finite() && *c > 0.0).unwrap_or(0.0))
                    .collect();
                if members.iter().all(|m| m.market_cap.is_none()) {
                    debug!(n = members.len(), "no market caps, using equal weight");
                    return equal(members.len());
                }
                proportional(&caps).unwrap_or_else(|| equal(members.len()))
            }
            Self::ScoreWeighted => {
                let raw: Vec<f64> = members
                    .iter()
                    .map(|m| if m.score.is_finite() { m.score } else { NEUTRAL_SCORE })
                    .collect();
                proportional(&raw).unwrap_or_else(|| equal(members.len()))
            }
            Self::InverseVolatility => {
                debug!("inverse-volatility weighting unavailable, using equal weight");
                equal(members.len())
            }
        }
    }

    /// Name as used in configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::MarketCap => "market_cap",
            Self::ScoreWeighted => "score_weighted",
            Self::InverseVolatility => "inverse_volatility",
        }
    }
}

impl fmt::Display for WeightingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightingScheme {
    type Err = IcScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "equal" => Ok(Self::Equal),
            "market_cap" => Ok(Self::MarketCap),
            "score_weighted" | "score" => Ok(Self::ScoreWeighted),
            "inverse_volatility" | "inverse_vol" => Ok(Self::InverseVolatility),
            other => Err(IcScoreError::InvalidConfiguration(format!(
                "unknown weighting scheme: {other}"
            ))),
        }
    }
}

fn equal(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

fn proportional(raw: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = raw.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    Some(raw.iter().map(|w| w / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn members() -> Vec<Candidate> {
        vec![
            Candidate::new("A", 80.0).with_market_cap(Some(300.0)),
            Candidate::new("B", 60.0).with_market_cap(Some(100.0)),
            Candidate::new("C", 60.0),
        ]
    }

    #[test]
    fn test_equal() {
        let w = WeightingScheme::Equal.weights(&members());
        assert_eq!(w.len(), 3);
        for x in w {
            assert_relative_eq!(x, 1.0 / 3.0);
        }
    }

    #[test]
    fn test_market_cap_missing_counts_zero() {
        let w = WeightingScheme::MarketCap.weights(&members());
        assert_relative_eq!(w[0], 0.75);
        assert_relative_eq!(w[1], 0.25);
        assert_eq!(w[2], 0.0);
    }

    #[test]
    fn test_market_cap_falls_back_without_caps() {
        let plain = vec![Candidate::new("A", 1.0), Candidate::new("B", 2.0)];
        let w = WeightingScheme::MarketCap.weights(&plain);
        assert_eq!(w, vec![0.5, 0.5]);
    }

    #[test]
    fn test_score_weighted() {
        let w = WeightingScheme::ScoreWeighted.weights(&members());
        assert_relative_eq!(w[0], 0.4);
        assert_relative_eq!(w[1], 0.3);
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

        let zeros = vec![Candidate::new("A", 0.0), Candidate::new("B", 0.0)];
        assert_eq!(WeightingScheme::ScoreWeighted.weights(&zeros), vec![0.5, 0.5]);
    }

    #[test]
    fn test_inverse_volatility_is_equal() {
        let w = WeightingScheme::InverseVolatility.weights(&members());
        assert_eq!(w, WeightingScheme::Equal.weights(&members()));
    }

    #[test]
    fn test_empty_members() {
        assert!(WeightingScheme::MarketCap.weights(&[]).is_empty());
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!(
            "market-cap".parse::<WeightingScheme>().unwrap(),
            WeightingScheme::MarketCap
        );
        assert!("bogus".parse::<WeightingScheme>().unwrap_err().is_fatal());
        let json = serde_json::to_string(&WeightingScheme::ScoreWeighted).unwrap();
        assert_eq!(json, "\"score_weighted\"");
    }
}
