//! Ranked candidates, holdings and bucket portfolios.

use std::collections::BTreeMap;

use icscore_traits::{ScoreSnapshot, Ticker};
use serde::{Deserialize, Serialize};

/// Sector label used when a company's sector is unknown.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// A scored ticker waiting to be assigned to a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Score in [0, 100]
    pub score: f64,
    /// Market capitalisation, if known
    pub market_cap: Option<f64>,
    /// Sector, if known
    pub sector: Option<String>,
}

impl Candidate {
    /// A candidate with only a score.
    pub fn new(ticker: impl Into<Ticker>, score: f64) -> Self {
        Self {
            ticker: ticker.into(),
            score,
            market_cap: None,
            sector: None,
        }
    }

    /// Attach a market cap.
    #[must_use]
    pub const fn with_market_cap(mut self, market_cap: Option<f64>) -> Self {
        self.market_cap = market_cap;
        self
    }

    /// Attach a sector.
    #[must_use]
    pub fn with_sector(mut self, sector: Option<String>) -> Self {
        self.sector = sector;
        self
    }

    /// Candidates in snapshot order, without caps or sectors.
    pub fn from_snapshot(snapshot: &ScoreSnapshot) -> Vec<Self> {
        snapshot.iter().map(|(t, s)| Self::new(t, s)).collect()
    }

    /// Sector name, falling back to [`UNKNOWN_SECTOR`].
    pub fn sector_or_unknown(&self) -> &str {
        self.sector.as_deref().unwrap_or(UNKNOWN_SECTOR)
    }
}

/// One position of a bucket portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Portfolio weight; a portfolio's weights sum to 1
    pub weight: f64,
    /// Score at formation
    pub score: Option<f64>,
    /// Market capitalisation at formation
    pub market_cap: Option<f64>,
    /// Sector at formation
    pub sector: Option<String>,
}

impl Holding {
    /// Build a holding from a candidate and its weight.
    pub fn from_candidate(candidate: &Candidate, weight: f64) -> Self {
        Self {
            ticker: candidate.ticker.clone(),
            weight,
            score: Some(candidate.score),
            market_cap: candidate.market_cap,
            sector: candidate.sector.clone(),
        }
    }
}

/// Composition of one score bucket at a rebalance date.
///
/// Bucket 1 holds the highest scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// 1-based bucket number
    pub bucket: usize,
    /// Positions, in rank order
    pub holdings: Vec<Holding>,
}

impl Portfolio {
    /// Create a portfolio.
    pub const fn new(bucket: usize, holdings: Vec<Holding>) -> Self {
        Self { bucket, holdings }
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Whether the portfolio holds nothing.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Tickers in rank order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    /// Sum of weights.
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }

    /// Whether weights sum to 1 within `tolerance`.
    pub fn is_normalized(&self, tolerance: f64) -> bool {
        !self.is_empty() && (self.total_weight() - 1.0).abs() <= tolerance
    }

    /// Weight of a ticker, 0 when not held.
    pub fn weight_of(&self, ticker: &str) -> f64 {
        self.holdings
            .iter()
            .find(|h| h.ticker == ticker)
            .map_or(0.0, |h| h.weight)
    }

    /// Simple average of the known scores.
    pub fn average_score(&self) -> Option<f64> {
        let scores: Vec<f64> = self.holdings.iter().filter_map(|h| h.score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Total weight per sector.
    pub fn sector_weights(&self) -> BTreeMap<String, f64> {
        let mut weights = BTreeMap::new();
        for h in &self.holdings {
            let sector = h.sector.clone().unwrap_or_else(|| UNKNOWN_SECTOR.to_string());
            *weights.entry(sector).or_insert(0.0) += h.weight;
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use icscore_traits::Date;

    fn holding(ticker: &str, weight: f64, score: Option<f64>, sector: Option<&str>) -> Holding {
        Holding {
            ticker: ticker.to_string(),
            weight,
            score,
            market_cap: None,
            sector: sector.map(str::to_string),
        }
    }

    #[test]
    fn test_portfolio_helpers() {
        let p = Portfolio::new(
            1,
            vec![
                holding("AAPL", 0.5, Some(90.0), Some("Technology")),
                holding("XOM", 0.3, Some(80.0), Some("Energy")),
                holding("JPM", 0.2, None, None),
            ],
        );
        assert_eq!(p.len(), 3);
        assert!(p.is_normalized(1e-9));
        assert_eq!(p.tickers(), vec!["AAPL", "XOM", "JPM"]);
        assert_relative_eq!(p.weight_of("XOM"), 0.3);
        assert_eq!(p.weight_of("MSFT"), 0.0);
        assert_relative_eq!(p.average_score().unwrap(), 85.0);

        let sectors = p.sector_weights();
        assert_relative_eq!(sectors["Technology"], 0.5);
        assert_relative_eq!(sectors[UNKNOWN_SECTOR], 0.2);
    }

    #[test]
    fn test_empty_portfolio() {
        let p = Portfolio::new(3, Vec::new());
        assert!(p.is_empty());
        assert!(!p.is_normalized(1e-9));
        assert_eq!(p.average_score(), None);
    }

    #[test]
    fn test_candidates_follow_snapshot_order() {
        let date = Date::from_ymd_opt(2024, 3, 1).unwrap();
        let snap = ScoreSnapshot::from_pairs(date, vec![("B", 40.0), ("A", 60.0)]);
        let candidates = Candidate::from_snapshot(&snap);
        assert_eq!(candidates[0].ticker, "B");
        assert_eq!(candidates[1].score, 60.0);
        assert_eq!(candidates[0].sector_or_unknown(), UNKNOWN_SECTOR);
    }
}
