//! Sector-neutral bucket construction.
//!
//! Each sector is ranked and cut on its own, so every bucket carries a slice
//! of every sector large enough to be split. A sector with fewer names than
//! buckets contributes one name per bucket from bucket 1 down.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{
    decile::{DecileBuilder, rank, weigh},
    holding::{Candidate, Portfolio},
    weighting::WeightingScheme,
};

/// Slices of a ranked sector of `n` names: `max(1, n / n_buckets)` per
/// bucket, the last bucket taking the remainder. Empty slices are dropped.
fn sector_ranges(n: usize, n_buckets: usize) -> Vec<(usize, Range<usize>)> {
    if n == 0 || n_buckets == 0 {
        return Vec::new();
    }
    let size = (n / n_buckets).max(1);
    (1..=n_buckets)
        .filter_map(|k| {
            let start = ((k - 1) * size).min(n);
            let end = if k == n_buckets { n } else { (k * size).min(n) };
            (start < end).then_some((k, start..end))
        })
        .collect()
}

/// Builds buckets by splitting within sectors and merging across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectorNeutralBuilder {
    inner: DecileBuilder,
}

impl SectorNeutralBuilder {
    /// Wrap a plain builder; its bucket count and weighting are reused.
    pub const fn new(inner: DecileBuilder) -> Self {
        Self { inner }
    }

    /// Decile builder with the given weighting.
    pub const fn deciles(weighting: WeightingScheme) -> Self {
        Self::new(DecileBuilder::new(weighting))
    }

    /// Group candidates by sector, keeping first-appearance order of sectors
    /// and input order within each.
    fn group(candidates: &[Candidate]) -> Vec<Vec<Candidate>> {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: Vec<Vec<Candidate>> = Vec::new();
        for c in candidates {
            let sector = c.sector_or_unknown();
            match order.iter().position(|s| *s == sector) {
                Some(i) => groups[i].push(c.clone()),
                None => {
                    order.push(sector);
                    groups.push(vec![c.clone()]);
                }
            }
        }
        groups
    }

    /// Weighted portfolios, one per non-empty bucket, bucket 1 first.
    ///
    /// Within a merged bucket, holdings are ordered by sector first
    /// appearance, then by rank.
    pub fn build(&self, candidates: &[Candidate]) -> Vec<Portfolio> {
        let n_buckets = self.inner.n_buckets();
        let mut merged: Vec<Vec<Candidate>> = vec![Vec::new(); n_buckets];
        for group in Self::group(candidates) {
            let ranked = rank(&group);
            for (bucket, range) in sector_ranges(ranked.len(), n_buckets) {
                merged[bucket - 1].extend(ranked[range].iter().copied().cloned());
            }
        }
        merged
            .into_iter()
            .enumerate()
            .filter(|(_, members)| !members.is_empty())
            .map(|(i, members)| weigh(i + 1, &members, self.inner.weighting()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sector_candidates(sector: &str, n: usize, offset: f64) -> Vec<Candidate> {
        (0..n)
            .map(|i| {
                Candidate::new(format!("{sector}{i}"), offset + i as f64)
                    .with_sector(Some(sector.to_string()))
            })
            .collect()
    }

    #[test]
    fn test_each_bucket_gets_each_sector() {
        let mut input = sector_candidates("Tech", 20, 50.0);
        input.extend(sector_candidates("Energy", 10, 0.0));

        let buckets = SectorNeutralBuilder::default().build(&input);
        assert_eq!(buckets.len(), 10);
        for p in &buckets {
            let sectors = p.sector_weights();
            assert_eq!(sectors.len(), 2, "bucket {} lacks a sector", p.bucket);
            assert_relative_eq!(p.total_weight(), 1.0, epsilon = 1e-12);
        }
        // Energy's best name sits in bucket 1 despite a low absolute score.
        assert!(buckets[0].tickers().contains(&"Energy9".to_string()));
    }

    #[test]
    fn test_small_sector_spreads_one_per_bucket() {
        let mut input = sector_candidates("Tech", 10, 0.0);
        input.extend(sector_candidates("Utilities", 3, 0.0));

        let buckets = SectorNeutralBuilder::default().build(&input);
        let total: usize = buckets.iter().map(Portfolio::len).sum();
        assert_eq!(total, 13);
        assert_eq!(buckets[0].tickers(), vec!["Tech9", "Utilities2"]);
        assert_eq!(buckets[1].tickers(), vec!["Tech8", "Utilities1"]);
        assert_eq!(buckets[2].tickers(), vec!["Tech7", "Utilities0"]);
        assert_eq!(buckets[3].tickers(), vec!["Tech6"]);
        assert_relative_eq!(buckets[0].sector_weights()["Utilities"], 0.5);
    }

    #[test]
    fn test_small_sector_worst_name_stays_out_of_top_bucket() {
        let mut input = sector_candidates("Tech", 20, 50.0);
        input.extend(sector_candidates("Utilities", 5, 0.0));

        let buckets = SectorNeutralBuilder::default().build(&input);
        assert_eq!(buckets[0].tickers(), vec!["Tech19", "Tech18", "Utilities4"]);
        let home = buckets
            .iter()
            .find(|p| p.tickers().contains(&"Utilities0".to_string()))
            .map(|p| p.bucket);
        assert_eq!(home, Some(5));
    }

    #[test]
    fn test_sector_ranges() {
        assert_eq!(sector_ranges(3, 10), vec![(1, 0..1), (2, 1..2), (3, 2..3)]);
        assert_eq!(sector_ranges(10, 10).len(), 10);
        // Remainder beyond the per-bucket slices goes to the last bucket.
        let ranges = sector_ranges(15, 10);
        assert_eq!(ranges[0], (1, 0..1));
        assert_eq!(ranges[9], (10, 9..15));
        assert!(sector_ranges(0, 10).is_empty());
    }

    #[test]
    fn test_unknown_sector_grouped() {
        let input: Vec<Candidate> =
            (0..10).map(|i| Candidate::new(format!("X{i}"), i as f64)).collect();
        let buckets = SectorNeutralBuilder::default().build(&input);
        assert_eq!(buckets.len(), 10);
        assert_eq!(buckets[0].tickers(), vec!["X9"]);
    }
}
