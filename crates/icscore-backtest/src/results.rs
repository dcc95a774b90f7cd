//! Per-period rows, period outcomes and the aggregate of a run.

use std::collections::BTreeMap;

use icscore_traits::{Date, Period, Ticker};
use serde::{Deserialize, Serialize};

use crate::config::BacktestConfig;

/// One bucket over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    /// Rebalance date
    pub period_start: Date,
    /// Exit date
    pub period_end: Date,
    /// 1-based bucket; 1 holds the highest scores
    pub decile: usize,
    /// Tickers held, in rank order
    pub holdings: Vec<Ticker>,
    /// `holdings.len()`
    pub num_holdings: usize,
    /// Net return after costs
    pub period_return: f64,
    /// Benchmark return over the same period
    pub benchmark_return: f64,
    /// `period_return - benchmark_return`
    pub excess_return: f64,
    /// Mean score of the holdings at formation
    pub avg_score: f64,
    /// Name turnover against the same bucket's previous composition
    pub turnover: f64,
    /// Gross mean return of the holdings in each known sector
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sector_returns: BTreeMap<String, f64>,
}

impl PeriodResult {
    /// The period this row covers.
    pub const fn period(&self) -> Period {
        Period::new(self.period_start, self.period_end)
    }
}

/// What happened to one rebalance period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodOutcome {
    /// Buckets were formed and their returns recorded.
    Completed {
        /// The period
        period: Period,
        /// Tickers with a score
        scored: usize,
        /// Buckets emitted
        buckets: usize,
    },
    /// Nothing could be formed; no rows were recorded.
    Skipped {
        /// The period
        period: Period,
        /// Why
        reason: String,
    },
    /// The data layer failed for the whole period.
    Failed {
        /// The period
        period: Period,
        /// The error, rendered
        error: String,
    },
}

impl PeriodOutcome {
    /// The period this outcome describes.
    pub const fn period(&self) -> Period {
        match self {
            Self::Completed { period, .. }
            | Self::Skipped { period, .. }
            | Self::Failed { period, .. } => *period,
        }
    }

    /// Whether rows were recorded for the period.
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Everything a run produced.
///
/// Built once at the end of [`crate::Backtester::run`] and read-only after.
/// Bucket-keyed maps only contain buckets that produced at least one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResults {
    /// The configuration that was run
    pub config: BacktestConfig,
    /// Number of buckets the universe was cut into
    pub n_buckets: usize,
    /// Rows, in period order then bucket order
    pub period_results: Vec<PeriodResult>,
    /// One outcome per generated period
    pub outcomes: Vec<PeriodOutcome>,

    /// Compounded return per bucket
    pub total_return_by_decile: BTreeMap<usize, f64>,
    /// Annualized return per bucket, over the configured date range
    pub annualized_return_by_decile: BTreeMap<usize, f64>,
    /// Annualized mean-over-volatility per bucket
    pub sharpe_ratio_by_decile: BTreeMap<usize, f64>,
    /// Maximum drawdown per bucket
    pub max_drawdown_by_decile: BTreeMap<usize, f64>,

    /// Top minus bottom annualized return
    pub top_bottom_spread: f64,
    /// Top annualized return minus annualized benchmark return
    pub top_vs_benchmark: f64,
    /// Information ratio of the top bucket against the benchmark
    pub information_ratio: f64,
    /// Share of paired periods where the top bucket beat the bottom one
    pub hit_rate: f64,
    /// Periods where the top bucket beat the bottom one
    pub hit_count: usize,
    /// Periods where both extreme buckets have a row
    pub paired_periods: usize,
    /// Fraction of bucket pairs ordered by annualized return
    pub monotonicity_score: f64,

    /// Compounded gross return per sector and bucket
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sector_results: BTreeMap<String, BTreeMap<usize, f64>>,
}

impl BacktestResults {
    /// Bucket holding the lowest scores.
    pub const fn bottom_bucket(&self) -> usize {
        self.n_buckets
    }

    /// Rows of one bucket, in period order.
    pub fn rows(&self, bucket: usize) -> impl Iterator<Item = &PeriodResult> {
        self.period_results.iter().filter(move |r| r.decile == bucket)
    }

    /// Net returns of one bucket, in period order.
    pub fn bucket_returns(&self, bucket: usize) -> Vec<f64> {
        self.rows(bucket).map(|r| r.period_return).collect()
    }

    /// Rebalance dates of one bucket, in period order.
    pub fn bucket_dates(&self, bucket: usize) -> Vec<Date> {
        self.rows(bucket).map(|r| r.period_start).collect()
    }

    /// Return series of every bucket that has rows.
    pub fn returns_by_bucket(&self) -> BTreeMap<usize, Vec<f64>> {
        let mut by_bucket: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for row in &self.period_results {
            by_bucket.entry(row.decile).or_default().push(row.period_return);
        }
        by_bucket
    }

    /// One benchmark return per period with rows, in period order.
    pub fn benchmark_returns(&self) -> Vec<(Date, f64)> {
        let mut by_period: BTreeMap<Date, f64> = BTreeMap::new();
        for row in &self.period_results {
            by_period.entry(row.period_start).or_insert(row.benchmark_return);
        }
        by_period.into_iter().collect()
    }

    /// `(a, b)` returns for every period where both buckets have a row.
    pub fn paired_returns(&self, a: usize, b: usize) -> Vec<(f64, f64)> {
        paired(&self.period_results, a, b)
            .into_iter()
            .map(|(_, ra, rb)| (ra, rb))
            .collect()
    }

    /// Number of periods that completed.
    pub fn completed_periods(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }
}

/// `(date, a, b)` for every period start where both buckets have a row.
pub(crate) fn paired(rows: &[PeriodResult], a: usize, b: usize) -> Vec<(Date, f64, f64)> {
    let mut by_period: BTreeMap<Date, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for row in rows {
        let slot = by_period.entry(row.period_start).or_default();
        if row.decile == a {
            slot.0 = Some(row.period_return);
        }
        if row.decile == b {
            slot.1 = Some(row.period_return);
        }
    }
    by_period
        .into_iter()
        .filter_map(|(date, (ra, rb))| Some((date, ra?, rb?)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    pub(crate) fn row(start: Date, decile: usize, ret: f64, bench: f64) -> PeriodResult {
        PeriodResult {
            period_start: start,
            period_end: start,
            decile,
            holdings: vec![format!("T{decile}")],
            num_holdings: 1,
            period_return: ret,
            benchmark_return: bench,
            excess_return: ret - bench,
            avg_score: 100.0 - decile as f64 * 10.0,
            turnover: 1.0,
            sector_returns: BTreeMap::new(),
        }
    }

    #[test]
    fn test_paired_skips_incomplete_periods() {
        let rows = vec![
            row(d(2024, 1, 1), 1, 0.05, 0.01),
            row(d(2024, 1, 1), 10, 0.01, 0.01),
            row(d(2024, 2, 1), 1, 0.02, 0.00),
            row(d(2024, 3, 1), 10, 0.03, 0.02),
            row(d(2024, 3, 1), 1, 0.04, 0.02),
        ];
        let pairs = paired(&rows, 1, 10);
        assert_eq!(
            pairs,
            vec![(d(2024, 1, 1), 0.05, 0.01), (d(2024, 3, 1), 0.04, 0.03)]
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let period = Period::new(d(2024, 1, 1), d(2024, 1, 31));
        let skipped = PeriodOutcome::Skipped {
            period,
            reason: "no scores".to_string(),
        };
        assert_eq!(skipped.period(), period);
        assert!(!skipped.is_completed());

        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "no scores");
    }
}
