//! Turnover between consecutive compositions of the same bucket.

use std::collections::HashSet;

use icscore_traits::Ticker;
use serde::{Deserialize, Serialize};

use crate::holding::Portfolio;

/// Name turnover between two holdings lists.
///
/// `1 - |prev ∩ curr| / max(|prev|, |curr|)`. A bucket with no prior
/// holdings turns over fully; two empty lists do not turn over at all.
///
/// # Examples
///
/// ```
/// use icscore_portfolio::turnover;
///
/// let prev = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
/// let curr = vec!["A".to_string(), "B".to_string(), "E".to_string(), "F".to_string()];
/// assert_eq!(turnover(&prev, &curr), 0.5);
/// assert_eq!(turnover(&[], &curr), 1.0);
/// ```
pub fn turnover(prev: &[Ticker], curr: &[Ticker]) -> f64 {
    if prev.is_empty() && curr.is_empty() {
        return 0.0;
    }
    if prev.is_empty() {
        return 1.0;
    }
    let prev: HashSet<&str> = prev.iter().map(String::as_str).collect();
    let curr: HashSet<&str> = curr.iter().map(String::as_str).collect();
    let common = prev.intersection(&curr).count();
    let larger = prev.len().max(curr.len());
    1.0 - common as f64 / larger as f64
}

/// Trades implied by moving from one composition to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTransition {
    /// Names entering the bucket
    pub buys: Vec<Ticker>,
    /// Names leaving the bucket
    pub sells: Vec<Ticker>,
    /// Names kept
    pub holds: Vec<Ticker>,
    /// `(buys + sells) / |prev ∪ curr|`
    pub turnover: f64,
}

impl PortfolioTransition {
    /// Diff two compositions. Ticker lists follow the portfolios' rank order.
    pub fn between(prev: &Portfolio, curr: &Portfolio) -> Self {
        let prev_set: HashSet<&str> = prev.holdings.iter().map(|h| h.ticker.as_str()).collect();
        let curr_set: HashSet<&str> = curr.holdings.iter().map(|h| h.ticker.as_str()).collect();

        let buys: Vec<Ticker> = curr
            .tickers()
            .into_iter()
            .filter(|t| !prev_set.contains(t.as_str()))
            .collect();
        let sells: Vec<Ticker> = prev
            .tickers()
            .into_iter()
            .filter(|t| !curr_set.contains(t.as_str()))
            .collect();
        let holds: Vec<Ticker> = curr
            .tickers()
            .into_iter()
            .filter(|t| prev_set.contains(t.as_str()))
            .collect();

        let union = prev_set.union(&curr_set).count();
        let turnover = if union == 0 {
            0.0
        } else {
            (buys.len() + sells.len()) as f64 / union as f64
        };

        Self {
            buys,
            sells,
            holds,
            turnover,
        }
    }

    /// Whether nothing changed.
    pub fn is_unchanged(&self) -> bool {
        self.buys.is_empty() && self.sells.is_empty()
    }
}
