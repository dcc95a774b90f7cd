//! Rank-bucket portfolio construction.
//!
//! Candidates are sorted by score, highest first, and cut into equally
//! sized buckets. The last bucket absorbs the remainder, so with 10 buckets
//! and `n >= 10` candidates, bucket 10 holds `n - 9·(n/10)` names. When
//! there are fewer candidates than buckets, everything lands in bucket 1.

use std::ops::Range;

use icscore_traits::{IcScoreError, Result};
use serde::{Deserialize, Serialize};

use crate::{
    holding::{Candidate, Holding, Portfolio},
    weighting::WeightingScheme,
};

/// Number of buckets in a decile split.
pub const DECILES: usize = 10;

/// Number of buckets in a quintile split.
pub const QUINTILES: usize = 5;

/// Index ranges of each non-empty bucket over `n` ranked items.
///
/// Returns `(bucket, range)` pairs in bucket order.
///
/// # Examples
///
/// ```
/// use icscore_portfolio::bucket_ranges;
///
/// let ranges = bucket_ranges(25, 10);
/// assert_eq!(ranges.len(), 10);
/// assert_eq!(ranges[0], (1, 0..2));
/// assert_eq!(ranges[9], (10, 18..25));
///
/// // Fewer items than buckets: a single bucket.
/// assert_eq!(bucket_ranges(7, 10), vec![(1, 0..7)]);
/// ```
pub fn bucket_ranges(n: usize, n_buckets: usize) -> Vec<(usize, Range<usize>)> {
    if n == 0 || n_buckets == 0 {
        return Vec::new();
    }
    let size = n / n_buckets;
    if size == 0 {
        return vec![(1, 0..n)];
    }
    (1..=n_buckets)
        .map(|k| {
            let start = (k - 1) * size;
            let end = if k == n_buckets { n } else { k * size };
            (k, start..end)
        })
        .collect()
}

/// Stable sort by score, highest first; ties keep their input order.
pub(crate) fn rank(candidates: &[Candidate]) -> Vec<&Candidate> {
    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Weight one bucket's members into a portfolio.
pub(crate) fn weigh(bucket: usize, members: &[Candidate], scheme: WeightingScheme) -> Portfolio {
    let weights = scheme.weights(members);
    let holdings = members
        .iter()
        .zip(weights)
        .map(|(c, w)| Holding::from_candidate(c, w))
        .collect();
    Portfolio::new(bucket, holdings)
}

/// Builds score-ranked bucket portfolios.
///
/// # Example
///
/// ```
/// use icscore_portfolio::{Candidate, DecileBuilder};
///
/// let candidates: Vec<Candidate> = (0..20)
///     .map(|i| Candidate::new(format!("T{i}"), i as f64))
///     .collect();
///
/// let deciles = DecileBuilder::default().build(&candidates);
/// assert_eq!(deciles.len(), 10);
/// assert_eq!(deciles[0].tickers(), vec!["T19", "T18"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecileBuilder {
    n_buckets: usize,
    weighting: WeightingScheme,
}

impl Default for DecileBuilder {
    fn default() -> Self {
        Self {
            n_buckets: DECILES,
            weighting: WeightingScheme::Equal,
        }
    }
}

impl DecileBuilder {
    /// Decile builder with the given weighting.
    pub const fn new(weighting: WeightingScheme) -> Self {
        Self {
            n_buckets: DECILES,
            weighting,
        }
    }

    /// Quintile builder with the given weighting.
    pub const fn quintiles(weighting: WeightingScheme) -> Self {
        Self {
            n_buckets: QUINTILES,
            weighting,
        }
    }

    /// Builder with an arbitrary bucket count.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidConfiguration`] for zero buckets.
    pub fn with_buckets(n_buckets: usize, weighting: WeightingScheme) -> Result<Self> {
        if n_buckets == 0 {
            return Err(IcScoreError::InvalidConfiguration(
                "bucket count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            n_buckets,
            weighting,
        })
    }

    /// Number of buckets.
    pub const fn n_buckets(&self) -> usize {
        self.n_buckets
    }

    /// Weighting scheme applied to each bucket.
    pub const fn weighting(&self) -> WeightingScheme {
        self.weighting
    }

    /// Assign every candidate to exactly one bucket, without weights.
    ///
    /// Returns the members of each non-empty bucket in rank order.
    pub fn assign(&self, candidates: &[Candidate]) -> Vec<(usize, Vec<Candidate>)> {
        let ranked = rank(candidates);
        bucket_ranges(ranked.len(), self.n_buckets)
            .into_iter()
            .map(|(bucket, range)| {
                let members = ranked[range].iter().copied().cloned().collect();
                (bucket, members)
            })
            .collect()
    }

    /// Ranked, weighted portfolios, one per non-empty bucket, bucket 1 first.
    pub fn build(&self, candidates: &[Candidate]) -> Vec<Portfolio> {
        self.assign(candidates)
            .into_iter()
            .map(|(bucket, members)| weigh(bucket, &members, self.weighting))
            .collect()
    }

    /// Long the top bucket, short the bottom one.
    ///
    /// `None` unless both extreme buckets are populated.
    pub fn long_short(&self, candidates: &[Candidate]) -> Option<LongShortPair> {
        if self.n_buckets < 2 {
            return None;
        }
        let mut portfolios = self.build(candidates);
        let short_idx = portfolios.iter().position(|p| p.bucket == self.n_buckets)?;
        let short = portfolios.swap_remove(short_idx);
        let long = portfolios.into_iter().find(|p| p.bucket == 1)?;
        Some(LongShortPair { long, short })
    }
}

/// Top and bottom bucket of one rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongShortPair {
    /// Highest-scored bucket, held long
    pub long: Portfolio,
    /// Lowest-scored bucket, held short
    pub short: Portfolio,
}

impl LongShortPair {
    /// Net weight of a ticker: long weight minus short weight.
    pub fn net_weight(&self, ticker: &str) -> f64 {
        self.long.weight_of(ticker) - self.short.weight_of(ticker)
    }
}
