//! Report summaries derived from [`BacktestResults`].
//!
//! Everything here is computed from the results alone and serializes with
//! serde. Rendering is left to the caller.

use std::collections::{BTreeMap, BTreeSet};

use icscore_eval::{
    BacktestMetrics, BinomialTestResult, DEFAULT_RISK_FREE_RATE, DecileComparison, DrawdownInfo,
    MetricMonotonicity, PerformanceCalculator, SpreadMetrics, TTestResult, WilcoxonResult,
    analyze_drawdowns, binomial_test, welch_t_test, wilcoxon_signed_rank,
};
use icscore_traits::{Date, RebalanceFrequency, Result, stats::mean};
use serde::{Deserialize, Serialize};

use crate::results::{BacktestResults, PeriodOutcome, PeriodResult};

/// Default rolling window, in periods.
pub const DEFAULT_ROLLING_WINDOW: usize = 12;

/// Key of the benchmark series in keyed report maps.
pub const BENCHMARK_KEY: &str = "benchmark";

/// Key of a bucket's series in keyed report maps: `d1`, `d2`, ...
pub fn bucket_key(bucket: usize) -> String {
    format!("d{bucket}")
}

/// Performance of one bucket over the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecilePerformance {
    /// Bucket number
    pub decile: usize,
    /// Compounded return
    pub total_return: f64,
    /// Compound annual growth rate over the bucket's periods
    pub annualized_return: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Sharpe ratio
    pub sharpe_ratio: f64,
    /// Maximum drawdown
    pub max_drawdown: f64,
    /// Mean of the per-period average scores
    pub avg_score: f64,
    /// Mean number of holdings
    pub avg_holdings: f64,
    /// Mean turnover
    pub avg_turnover: f64,
    /// Periods with a row for this bucket
    pub num_periods: usize,
}

impl DecilePerformance {
    fn empty(decile: usize) -> Self {
        Self {
            decile,
            total_return: 0.0,
            annualized_return: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            avg_score: 0.0,
            avg_holdings: 0.0,
            avg_turnover: 0.0,
            num_periods: 0,
        }
    }
}

/// Headline numbers of a run.
///
/// Growth rates here are annualized over the number of periods each series
/// covers (`n / periods_per_year` years). The same-named fields of
/// [`BacktestResults`] are annualized over the configured calendar span, so
/// the two differ when a bucket misses periods or the last period is short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// First rebalance date
    pub start_date: Date,
    /// Last day of the simulation
    pub end_date: Date,
    /// Rebalance cadence
    pub rebalance_frequency: RebalanceFrequency,
    /// Universe name
    pub universe: String,
    /// Benchmark ticker
    pub benchmark: String,
    /// Periods with at least one row
    pub num_periods: usize,
    /// Periods skipped for lack of data
    pub skipped_periods: usize,
    /// Periods lost to data-layer failures
    pub failed_periods: usize,

    /// CAGR of bucket 1 over its own periods
    pub top_decile_cagr: f64,
    /// CAGR of the bottom bucket
    pub bottom_decile_cagr: f64,
    /// `top_decile_cagr - bottom_decile_cagr`
    pub spread_cagr: f64,
    /// CAGR of the benchmark over the periods with rows
    pub benchmark_cagr: f64,
    /// `top_decile_cagr - benchmark_cagr`, both over their own periods
    pub top_vs_benchmark: f64,

    /// Share of paired periods where the top bucket beat the bottom one
    pub hit_rate: f64,
    /// Fraction of bucket pairs ordered by annualized return
    pub monotonicity_score: f64,
    /// Information ratio of the top bucket against the benchmark
    pub information_ratio: f64,

    /// Sharpe ratio of bucket 1
    pub top_decile_sharpe: f64,
    /// Maximum drawdown of bucket 1
    pub top_decile_max_dd: f64,
    /// Sharpe ratio of the bottom bucket
    pub bottom_decile_sharpe: f64,
    /// Maximum drawdown of the bottom bucket
    pub bottom_decile_max_dd: f64,

    /// Per-bucket breakdown, bucket 1 first
    pub decile_performance: Vec<DecilePerformance>,
}

/// Returns of every bucket and the benchmark over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    /// Rebalance date
    pub date: Date,
    /// Benchmark return
    pub benchmark: f64,
    /// Net return by bucket
    pub returns: BTreeMap<usize, f64>,
}

/// One point of a compounded series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    /// Rebalance date
    pub date: Date,
    /// Growth of 1 through this period
    pub value: f64,
    /// Return of this period
    #[serde(rename = "return")]
    pub period_return: f64,
}

/// Metrics over the window ending at `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Rebalance date of the last period in the window
    pub date: Date,
    /// Compounded return over the window
    pub rolling_return: f64,
    /// Sharpe ratio over the window
    pub rolling_sharpe: f64,
    /// Annualized volatility over the window
    pub rolling_volatility: f64,
}

/// Significance of the top bucket's lead over the bottom one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTests {
    /// Welch t-test on the full top and bottom return series
    pub t_test: TTestResult,
    /// Wilcoxon signed-rank test; absent for small samples
    pub wilcoxon: Option<WilcoxonResult>,
    /// Binomial test of the hit rate against a coin flip
    pub binomial: BinomialTestResult,
}

/// Detailed analysis of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Headline numbers
    pub summary: BacktestSummary,
    /// One row per period with rows, in date order
    pub period_data: Vec<PeriodRow>,
    /// Compounded series keyed `d1`..`dN` and `benchmark`
    pub cumulative_returns: BTreeMap<String, Vec<CumulativePoint>>,
    /// Rolling metrics for the top, middle and bottom buckets
    pub rolling_metrics: BTreeMap<String, Vec<RollingPoint>>,
    /// Top versus bottom significance tests
    pub statistical_tests: StatisticalTests,
    /// Drawdown episodes of bucket 1
    pub top_drawdowns: Vec<DrawdownInfo>,
    /// Full metrics per bucket
    pub decile_metrics: BTreeMap<usize, BacktestMetrics>,
    /// Top minus bottom metric spreads
    pub spread: Option<SpreadMetrics>,
    /// Monotonicity of several metrics across buckets
    pub metric_monotonicity: MetricMonotonicity,
    /// Compounded gross return per sector and bucket
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sector_analysis: BTreeMap<String, BTreeMap<usize, f64>>,
}

/// Builds summaries and detailed reports.
///
/// Metrics are annualized with the run's rebalance frequency.
///
/// # Example
///
/// ```
/// use icscore_backtest::{ReportGenerator, aggregate, BacktestConfig, EngineSettings};
/// use icscore_traits::Date;
///
/// let config = BacktestConfig::new(
///     Date::from_ymd_opt(2024, 1, 1).unwrap(),
///     Date::from_ymd_opt(2024, 12, 31).unwrap(),
/// );
/// let results = aggregate(&config, &EngineSettings::default(), Vec::new(), Vec::new());
///
/// let summary = ReportGenerator::default().summary(&results);
/// assert_eq!(summary.num_periods, 0);
/// assert_eq!(summary.top_decile_cagr, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportGenerator {
    risk_free_rate: f64,
    window: usize,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE)
    }
}

impl ReportGenerator {
    /// Create a generator with an annual risk-free rate.
    pub const fn new(risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            window: DEFAULT_ROLLING_WINDOW,
        }
    }

    /// Use a different rolling window.
    #[must_use]
    pub const fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    fn calculator(&self, results: &BacktestResults) -> PerformanceCalculator {
        let ppy = results.config.rebalance_frequency.periods_per_year();
        PerformanceCalculator::new(self.risk_free_rate, ppy)
    }

    /// Per-bucket performance, bucket 1 first.
    pub fn decile_performance(&self, results: &BacktestResults) -> Vec<DecilePerformance> {
        let calc = self.calculator(results);
        results
            .returns_by_bucket()
            .into_iter()
            .map(|(bucket, returns)| {
                let m = calc.calculate(&returns, None);
                let rows: Vec<_> = results.rows(bucket).collect();
                let avg = |f: fn(&PeriodResult) -> f64| {
                    let values: Vec<f64> = rows.iter().map(|r| f(r)).collect();
                    mean(&values).unwrap_or(0.0)
                };
                DecilePerformance {
                    decile: bucket,
                    total_return: m.total_return,
                    annualized_return: m.cagr,
                    volatility: m.annualized_volatility,
                    sharpe_ratio: m.sharpe_ratio,
                    max_drawdown: m.max_drawdown,
                    avg_score: avg(|r| r.avg_score),
                    avg_holdings: avg(|r| r.num_holdings as f64),
                    avg_turnover: avg(|r| r.turnover),
                    num_periods: returns.len(),
                }
            })
            .collect()
    }

    /// Headline numbers.
    pub fn summary(&self, results: &BacktestResults) -> BacktestSummary {
        let calc = self.calculator(results);
        let config = &results.config;
        let performance = self.decile_performance(results);
        let find = |bucket: usize| {
            performance
                .iter()
                .find(|p| p.decile == bucket)
                .cloned()
                .unwrap_or_else(|| DecilePerformance::empty(bucket))
        };
        let top = find(1);
        let bottom = find(results.bottom_bucket());

        let benchmark: Vec<f64> = results.benchmark_returns().into_iter().map(|(_, r)| r).collect();
        let benchmark_cagr = calc.cagr(&benchmark);

        let num_periods = results
            .period_results
            .iter()
            .map(|r| r.period_start)
            .collect::<BTreeSet<_>>()
            .len();
        let failed_periods = results
            .outcomes
            .iter()
            .filter(|o| matches!(o, PeriodOutcome::Failed { .. }))
            .count();
        let skipped_periods = results
            .outcomes
            .iter()
            .filter(|o| matches!(o, PeriodOutcome::Skipped { .. }))
            .count();

        BacktestSummary {
            start_date: config.start_date,
            end_date: config.end_date,
            rebalance_frequency: config.rebalance_frequency,
            universe: config.universe.name.clone(),
            benchmark: config.benchmark.clone(),
            num_periods,
            skipped_periods,
            failed_periods,
            top_decile_cagr: top.annualized_return,
            bottom_decile_cagr: bottom.annualized_return,
            spread_cagr: top.annualized_return - bottom.annualized_return,
            benchmark_cagr,
            top_vs_benchmark: top.annualized_return - benchmark_cagr,
            hit_rate: results.hit_rate,
            monotonicity_score: results.monotonicity_score,
            information_ratio: results.information_ratio,
            top_decile_sharpe: top.sharpe_ratio,
            top_decile_max_dd: top.max_drawdown,
            bottom_decile_sharpe: bottom.sharpe_ratio,
            bottom_decile_max_dd: bottom.max_drawdown,
            decile_performance: performance,
        }
    }

    /// Returns of every bucket and the benchmark, one row per period.
    pub fn period_data(&self, results: &BacktestResults) -> Vec<PeriodRow> {
        let mut by_date: BTreeMap<Date, PeriodRow> = BTreeMap::new();
        for row in &results.period_results {
            by_date
                .entry(row.period_start)
                .or_insert_with(|| PeriodRow {
                    date: row.period_start,
                    benchmark: row.benchmark_return,
                    returns: BTreeMap::new(),
                })
                .returns
                .insert(row.decile, row.period_return);
        }
        by_date.into_values().collect()
    }

    /// Compounded series of every bucket and the benchmark.
    pub fn cumulative_returns(
        &self,
        results: &BacktestResults,
    ) -> BTreeMap<String, Vec<CumulativePoint>> {
        let mut series = BTreeMap::new();
        for bucket in results.returns_by_bucket().into_keys() {
            let points = results.rows(bucket).map(|r| (r.period_start, r.period_return));
            series.insert(bucket_key(bucket), compound(points));
        }
        series.insert(
            BENCHMARK_KEY.to_string(),
            compound(results.benchmark_returns()),
        );
        series
    }

    /// Rolling metrics for the top, middle and bottom buckets.
    ///
    /// A bucket with fewer periods than the window has no series.
    pub fn rolling_metrics(
        &self,
        results: &BacktestResults,
    ) -> BTreeMap<String, Vec<RollingPoint>> {
        let calc = self.calculator(results);
        let bottom = results.bottom_bucket();
        let buckets: BTreeSet<usize> = [1, bottom.div_ceil(2), bottom].into_iter().collect();

        let mut rolling = BTreeMap::new();
        if self.window == 0 {
            return rolling;
        }
        for bucket in buckets {
            let returns = results.bucket_returns(bucket);
            let dates = results.bucket_dates(bucket);
            if returns.len() < self.window {
                continue;
            }
            let points = returns
                .windows(self.window)
                .zip(dates.iter().skip(self.window - 1))
                .map(|(window, &date)| {
                    let m = calc.calculate(window, None);
                    RollingPoint {
                        date,
                        rolling_return: m.total_return,
                        rolling_sharpe: m.sharpe_ratio,
                        rolling_volatility: m.annualized_volatility,
                    }
                })
                .collect();
            rolling.insert(bucket_key(bucket), points);
        }
        rolling
    }

    /// Top versus bottom significance tests.
    ///
    /// The t-test compares the full return series of both buckets; the
    /// Wilcoxon test only uses periods where both have a row.
    pub fn statistical_tests(&self, results: &BacktestResults) -> StatisticalTests {
        let bottom = results.bottom_bucket();
        let pairs = results.paired_returns(1, bottom);
        StatisticalTests {
            t_test: welch_t_test(&results.bucket_returns(1), &results.bucket_returns(bottom)),
            wilcoxon: wilcoxon_signed_rank(&pairs),
            binomial: binomial_test(results.hit_count, results.paired_periods),
        }
    }

    /// The full report.
    ///
    /// # Errors
    ///
    /// Returns [`icscore_traits::IcScoreError::InvalidData`] if the top
    /// bucket's returns and dates disagree in length, which a well-formed
    /// result never does.
    pub fn generate(&self, results: &BacktestResults) -> Result<BacktestReport> {
        let calc = self.calculator(results);
        let comparison = DecileComparison::new(calc).with_bottom_bucket(results.bottom_bucket());

        // Metrics against the benchmark are only filled for buckets present
        // in every period.
        let benchmark: Vec<f64> = results.benchmark_returns().into_iter().map(|(_, r)| r).collect();
        let decile_metrics =
            comparison.bucket_metrics(&results.returns_by_bucket(), Some(benchmark.as_slice()));

        let top_drawdowns =
            analyze_drawdowns(&results.bucket_returns(1), &results.bucket_dates(1))?;

        Ok(BacktestReport {
            summary: self.summary(results),
            period_data: self.period_data(results),
            cumulative_returns: self.cumulative_returns(results),
            rolling_metrics: self.rolling_metrics(results),
            statistical_tests: self.statistical_tests(results),
            top_drawdowns,
            spread: comparison.spread(&decile_metrics),
            metric_monotonicity: comparison.monotonicity(&decile_metrics),
            decile_metrics,
            sector_analysis: results.sector_results.clone(),
        })
    }
}

fn compound(returns: impl IntoIterator<Item = (Date, f64)>) -> Vec<CumulativePoint> {
    let mut value = 1.0;
    returns
        .into_iter()
        .map(|(date, r)| {
            value *= 1.0 + r;
            CumulativePoint {
                date,
                value,
                period_return: r,
            }
        })
        .collect()
}
