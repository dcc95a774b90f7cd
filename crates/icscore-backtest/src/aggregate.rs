//! Summary statistics over the rows of a run.

use std::collections::BTreeMap;

use icscore_eval::{PerformanceCalculator, max_drawdown, monotonicity};
use icscore_traits::stats::{growth_factor, mean, sample_std};

use crate::{
    config::{BacktestConfig, EngineSettings},
    results::{BacktestResults, PeriodOutcome, PeriodResult, paired},
};

/// Annualize a compounded growth factor over `years`.
///
/// `None` for a non-positive horizon. A wiped-out basket (growth at or below
/// zero) annualizes to -100%.
///
/// # Examples
///
/// ```
/// use icscore_backtest::annualize;
///
/// assert!((annualize(1.21, 2.0).unwrap() - 0.1).abs() < 1e-12);
/// assert_eq!(annualize(1.1, 0.0), None);
/// assert_eq!(annualize(-0.2, 1.0), Some(-1.0));
/// ```
pub fn annualize(growth: f64, years: f64) -> Option<f64> {
    if years <= 0.0 {
        return None;
    }
    if growth <= 0.0 {
        return Some(-1.0);
    }
    Some(growth.powf(1.0 / years) - 1.0)
}

/// Mean over sample volatility, scaled by `√periods_per_year`.
///
/// 0 with fewer than two returns or zero volatility.
pub fn annualized_sharpe(returns: &[f64], periods_per_year: usize) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = sample_std(returns);
    match mean(returns) {
        Some(m) if std > 0.0 => m * (periods_per_year as f64).sqrt() / std,
        _ => 0.0,
    }
}

/// Hit count and number of paired periods where `top` beat `bottom`.
pub fn hit_rate(rows: &[PeriodResult], top: usize, bottom: usize) -> (usize, usize) {
    let pairs = paired(rows, top, bottom);
    let hits = pairs.iter().filter(|(_, t, b)| t > b).count();
    (hits, pairs.len())
}

/// Fold the rows of a run into [`BacktestResults`].
pub fn aggregate(
    config: &BacktestConfig,
    settings: &EngineSettings,
    period_results: Vec<PeriodResult>,
    outcomes: Vec<PeriodOutcome>,
) -> BacktestResults {
    let years = config.years();
    let ppy = config.rebalance_frequency.periods_per_year();
    let top = 1;
    let bottom = settings.bottom_bucket();

    let mut by_bucket: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for row in &period_results {
        by_bucket.entry(row.decile).or_default().push(row.period_return);
    }

    let mut total_return_by_decile = BTreeMap::new();
    let mut annualized_return_by_decile = BTreeMap::new();
    let mut sharpe_ratio_by_decile = BTreeMap::new();
    let mut max_drawdown_by_decile = BTreeMap::new();
    for (&bucket, returns) in &by_bucket {
        let growth = growth_factor(returns);
        total_return_by_decile.insert(bucket, growth - 1.0);
        if let Some(annualized) = annualize(growth, years) {
            annualized_return_by_decile.insert(bucket, annualized);
        }
        sharpe_ratio_by_decile.insert(bucket, annualized_sharpe(returns, ppy));
        max_drawdown_by_decile.insert(bucket, max_drawdown(returns));
    }

    let top_annualized = annualized_return_by_decile.get(&top).copied().unwrap_or(0.0);
    let bottom_annualized = annualized_return_by_decile
        .get(&bottom)
        .copied()
        .unwrap_or(0.0);

    // The benchmark is read off the top bucket's rows so both series cover
    // the same periods.
    let top_rows: Vec<&PeriodResult> =
        period_results.iter().filter(|r| r.decile == top).collect();
    let top_returns: Vec<f64> = top_rows.iter().map(|r| r.period_return).collect();
    let benchmark: Vec<f64> = top_rows.iter().map(|r| r.benchmark_return).collect();
    let top_vs_benchmark = if benchmark.is_empty() {
        0.0
    } else {
        top_annualized - annualize(growth_factor(&benchmark), years).unwrap_or(0.0)
    };

    let information_ratio = PerformanceCalculator::new(settings.risk_free_rate, ppy)
        .calculate(&top_returns, Some(benchmark.as_slice()))
        .information_ratio;

    let (hit_count, paired_periods) = hit_rate(&period_results, top, bottom);
    let hit_rate = if paired_periods > 0 {
        hit_count as f64 / paired_periods as f64
    } else {
        0.0
    };

    let annualized: Vec<(usize, f64)> = annualized_return_by_decile
        .iter()
        .map(|(b, r)| (*b, *r))
        .collect();
    let monotonicity_score = monotonicity(&annualized);

    let sector_results = sector_totals(&period_results);

    BacktestResults {
        config: config.clone(),
        n_buckets: settings.buckets,
        period_results,
        outcomes,
        total_return_by_decile,
        annualized_return_by_decile,
        sharpe_ratio_by_decile,
        max_drawdown_by_decile,
        top_bottom_spread: top_annualized - bottom_annualized,
        top_vs_benchmark,
        information_ratio,
        hit_rate,
        hit_count,
        paired_periods,
        monotonicity_score,
        sector_results,
    }
}

/// Compound each sector's per-bucket slice returns.
fn sector_totals(rows: &[PeriodResult]) -> BTreeMap<String, BTreeMap<usize, f64>> {
    let mut growth: BTreeMap<String, BTreeMap<usize, f64>> = BTreeMap::new();
    for row in rows {
        for (sector, r) in &row.sector_returns {
            *growth
                .entry(sector.clone())
                .or_default()
                .entry(row.decile)
                .or_insert(1.0) *= 1.0 + r;
        }
    }
    for by_bucket in growth.values_mut() {
        for g in by_bucket.values_mut() {
            *g -= 1.0;
        }
    }
    growth
}
