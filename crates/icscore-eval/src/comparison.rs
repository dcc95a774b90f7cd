//! Cross-bucket comparison of performance metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::{BacktestMetrics, PerformanceCalculator};

/// Fraction of ordered bucket pairs `(i, j)`, `i < j`, where bucket `i`
/// scores strictly higher than bucket `j`.
///
/// 1.0 means perfectly ordered, 0.0 fully inverted. Fewer than two buckets
/// give 0.
///
/// # Examples
///
/// ```
/// use icscore_eval::monotonicity;
///
/// assert_eq!(monotonicity(&[(1, 0.3), (2, 0.2), (3, 0.1)]), 1.0);
/// assert_eq!(monotonicity(&[(1, 0.1), (2, 0.2), (3, 0.3)]), 0.0);
/// assert_eq!(monotonicity(&[(1, 0.1)]), 0.0);
/// ```
pub fn monotonicity(values: &[(usize, f64)]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|(bucket, _)| *bucket);

    let mut correct = 0usize;
    let mut total = 0usize;
    for (i, (_, hi)) in sorted.iter().enumerate() {
        for (_, lo) in &sorted[i + 1..] {
            total += 1;
            if hi > lo {
                correct += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Top-minus-bottom differences of the headline metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadMetrics {
    /// Total return spread
    pub return_spread: f64,
    /// CAGR spread
    pub cagr_spread: f64,
    /// Sharpe ratio spread
    pub sharpe_spread: f64,
    /// Annualized volatility spread
    pub volatility_spread: f64,
    /// Max drawdown spread
    pub max_dd_spread: f64,
}

/// How monotonically each headline metric falls across buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricMonotonicity {
    /// Over CAGR
    pub cagr: f64,
    /// Over Sharpe ratio
    pub sharpe_ratio: f64,
    /// Over total return
    pub total_return: f64,
}

/// Per-bucket metrics and their comparison.
#[derive(Debug, Clone, Copy)]
pub struct DecileComparison {
    calc: PerformanceCalculator,
    bottom_bucket: usize,
}

impl Default for DecileComparison {
    fn default() -> Self {
        Self::new(PerformanceCalculator::default())
    }
}

impl DecileComparison {
    /// Compare decile 1 against decile 10 with the given calculator.
    pub const fn new(calc: PerformanceCalculator) -> Self {
        Self {
            calc,
            bottom_bucket: 10,
        }
    }

    /// Use a different bottom bucket (5 for quintiles).
    #[must_use]
    pub const fn with_bottom_bucket(mut self, bottom_bucket: usize) -> Self {
        self.bottom_bucket = bottom_bucket;
        self
    }

    /// Metrics for every bucket's return series.
    pub fn bucket_metrics(
        &self,
        bucket_returns: &BTreeMap<usize, Vec<f64>>,
        benchmark: Option<&[f64]>,
    ) -> BTreeMap<usize, BacktestMetrics> {
        bucket_returns
            .iter()
            .map(|(bucket, returns)| (*bucket, self.calc.calculate(returns, benchmark)))
            .collect()
    }

    /// Top minus bottom; `None` unless both are present.
    pub fn spread(&self, metrics: &BTreeMap<usize, BacktestMetrics>) -> Option<SpreadMetrics> {
        let top = metrics.get(&1)?;
        let bottom = metrics.get(&self.bottom_bucket)?;
        Some(SpreadMetrics {
            return_spread: top.total_return - bottom.total_return,
            cagr_spread: top.cagr - bottom.cagr,
            sharpe_spread: top.sharpe_ratio - bottom.sharpe_ratio,
            volatility_spread: top.annualized_volatility - bottom.annualized_volatility,
            max_dd_spread: top.max_drawdown - bottom.max_drawdown,
        })
    }

    /// Monotonicity of CAGR, Sharpe and total return across buckets.
    pub fn monotonicity(&self, metrics: &BTreeMap<usize, BacktestMetrics>) -> MetricMonotonicity {
        let over = |f: fn(&BacktestMetrics) -> f64| {
            let values: Vec<(usize, f64)> = metrics.iter().map(|(b, m)| (*b, f(m))).collect();
            monotonicity(&values)
        };
        MetricMonotonicity {
            cagr: over(|m| m.cagr),
            sharpe_ratio: over(|m| m.sharpe_ratio),
            total_return: over(|m| m.total_return),
        }
    }
}
