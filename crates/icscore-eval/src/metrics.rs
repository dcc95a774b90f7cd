//! Performance and risk metrics for a periodic return series.
//!
//! This module provides:
//! - Return metrics: total return, CAGR
//! - Risk metrics: volatility, downside deviation, drawdowns
//! - Risk-adjusted ratios: Sharpe, Sortino, Calmar, Treynor, information ratio
//! - Benchmark-relative statistics: alpha, beta, correlation, tracking error
//! - Win/loss and distribution statistics
//!
//! Every statistic degrades to 0 on an undersized sample or a zero
//! denominator. Profit factor and payoff ratio are the only exceptions and
//! report `+∞` when there are gains but no losses.

use icscore_traits::stats::{
    MIN_STD_THRESHOLD, correlation, covariance, growth_factor, mean, population_variance,
    sample_std, standardized_moment,
};
use serde::{Deserialize, Serialize};

use crate::drawdown::{average_drawdown, max_drawdown, max_drawdown_duration};

/// Default annual risk-free rate.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Summary statistics of one return series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    /// Compounded return over the whole series
    pub total_return: f64,
    /// Equal to `cagr`
    pub annualized_return: f64,
    /// Compound annual growth rate
    pub cagr: f64,

    /// Per-period sample standard deviation
    pub volatility: f64,
    /// Volatility scaled by √periods-per-year
    pub annualized_volatility: f64,
    /// RMS of returns below zero
    pub downside_deviation: f64,
    /// Largest peak-to-trough loss
    pub max_drawdown: f64,
    /// Mean per-period drawdown
    pub avg_drawdown: f64,
    /// Longest stretch below a prior peak, in periods
    pub max_drawdown_duration: usize,

    /// Sharpe ratio, annualized
    pub sharpe_ratio: f64,
    /// Sortino ratio, annualized
    pub sortino_ratio: f64,
    /// CAGR over max drawdown
    pub calmar_ratio: f64,
    /// Annualized active return over tracking error
    pub information_ratio: f64,
    /// Annualized excess return over beta
    pub treynor_ratio: f64,

    /// Annualized Jensen's alpha
    pub alpha: f64,
    /// Beta against the benchmark
    pub beta: f64,
    /// Pearson correlation with the benchmark
    pub correlation: f64,
    /// Annualized standard deviation of active returns
    pub tracking_error: f64,
    /// Total return minus benchmark total return
    pub excess_return: f64,

    /// Fraction of periods with a positive return
    pub win_rate: f64,
    /// Mean positive return
    pub avg_win: f64,
    /// Mean negative return (negative)
    pub avg_loss: f64,
    /// Sum of gains over absolute sum of losses
    pub profit_factor: f64,
    /// Absolute average win over average loss
    pub payoff_ratio: f64,
    /// Best single-period return
    pub best_period: f64,
    /// Worst single-period return
    pub worst_period: f64,

    /// Periods with a positive return
    pub positive_periods: usize,
    /// Periods with a negative return
    pub negative_periods: usize,
    /// Longest run of positive periods
    pub consecutive_wins: usize,
    /// Longest run of negative periods
    pub consecutive_losses: usize,
    /// Population skewness
    pub skewness: f64,
    /// Population excess kurtosis
    pub kurtosis: f64,
}

/// Computes [`BacktestMetrics`] for a given annualization and risk-free rate.
///
/// # Example
///
/// ```
/// use icscore_eval::PerformanceCalculator;
///
/// let calc = PerformanceCalculator::new(0.0, 12);
/// let m = calc.calculate(&[0.02, 0.03, 0.01, 0.04], None);
/// assert!((m.sharpe_ratio - 6.708).abs() < 1e-3);
/// assert_eq!(m.beta, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCalculator {
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// Periods in a year (252 daily, 52 weekly, 12 monthly, 4 quarterly)
    pub periods_per_year: usize,
}

impl Default for PerformanceCalculator {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: 12,
        }
    }
}

impl PerformanceCalculator {
    /// Create a calculator.
    pub const fn new(risk_free_rate: f64, periods_per_year: usize) -> Self {
        Self {
            risk_free_rate,
            periods_per_year,
        }
    }

    fn ppy(&self) -> f64 {
        self.periods_per_year.max(1) as f64
    }

    /// Risk-free rate per period.
    pub fn rf_period(&self) -> f64 {
        self.risk_free_rate / self.ppy()
    }

    /// Compute every metric.
    ///
    /// Benchmark statistics are filled only when `benchmark` has the same
    /// length as `returns`; otherwise beta stays at its neutral 1 and the
    /// rest at 0.
    pub fn calculate(&self, returns: &[f64], benchmark: Option<&[f64]>) -> BacktestMetrics {
        if returns.is_empty() {
            return BacktestMetrics {
                beta: 1.0,
                ..Default::default()
            };
        }

        let mut m = BacktestMetrics {
            beta: 1.0,
            ..Default::default()
        };

        m.total_return = total_return(returns);
        m.cagr = self.cagr(returns);
        m.annualized_return = m.cagr;

        m.volatility = sample_std(returns);
        m.annualized_volatility = m.volatility * self.ppy().sqrt();
        m.downside_deviation = downside_deviation(returns, 0.0);

        m.max_drawdown = max_drawdown(returns);
        m.avg_drawdown = average_drawdown(returns);
        m.max_drawdown_duration = max_drawdown_duration(returns);

        m.sharpe_ratio = self.sharpe_ratio(returns);
        m.sortino_ratio = self.sortino_ratio(returns);
        m.calmar_ratio = if m.max_drawdown > 0.0 {
            m.cagr / m.max_drawdown
        } else {
            0.0
        };

        self.fill_win_loss(returns, &mut m);

        m.skewness = if returns.len() >= 3 {
            standardized_moment(returns, 3)
        } else {
            0.0
        };
        let has_spread = population_variance(returns).sqrt() >= MIN_STD_THRESHOLD;
        m.kurtosis = if returns.len() >= 4 && has_spread {
            standardized_moment(returns, 4) - 3.0
        } else {
            0.0
        };

        if let Some(bench) = benchmark.filter(|b| b.len() == returns.len()) {
            self.fill_benchmark(returns, bench, &mut m);
        }

        m
    }

    /// `Π(1+r)^(ppy/n) - 1`; 0 when the growth factor is not positive.
    pub fn cagr(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let growth = growth_factor(returns);
        let years = returns.len() as f64 / self.ppy();
        if growth <= 0.0 || years <= 0.0 {
            return 0.0;
        }
        growth.powf(1.0 / years) - 1.0
    }

    /// Annualized Sharpe ratio of returns in excess of the risk-free rate.
    pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let rf = self.rf_period();
        let excess: Vec<f64> = returns.iter().map(|r| r - rf).collect();
        let std = sample_std(&excess);
        if std < MIN_STD_THRESHOLD {
            return 0.0;
        }
        mean(&excess).unwrap_or(0.0) * self.ppy().sqrt() / std
    }

    /// Annualized Sortino ratio: the Sharpe numerator over the downside
    /// deviation of excess returns.
    pub fn sortino_ratio(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let rf = self.rf_period();
        let excess: Vec<f64> = returns.iter().map(|r| r - rf).collect();
        let downside = downside_deviation(&excess, 0.0);
        if downside < MIN_STD_THRESHOLD {
            return 0.0;
        }
        mean(&excess).unwrap_or(0.0) * self.ppy().sqrt() / downside
    }

    fn fill_win_loss(&self, returns: &[f64], m: &mut BacktestMetrics) {
        let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();

        m.positive_periods = wins.len();
        m.negative_periods = losses.len();
        m.win_rate = wins.len() as f64 / returns.len() as f64;
        m.avg_win = mean(&wins).unwrap_or(0.0);
        m.avg_loss = mean(&losses).unwrap_or(0.0);
        m.best_period = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        m.worst_period = returns.iter().copied().fold(f64::INFINITY, f64::min);

        let total_wins: f64 = wins.iter().sum();
        let total_losses = losses.iter().sum::<f64>().abs();
        m.profit_factor = guarded_ratio(total_wins, total_losses);
        m.payoff_ratio = guarded_ratio(m.avg_win.abs(), m.avg_loss.abs());

        let (wins, losses) = streaks(returns);
        m.consecutive_wins = wins;
        m.consecutive_losses = losses;
    }

    fn fill_benchmark(&self, returns: &[f64], bench: &[f64], m: &mut BacktestMetrics) {
        let ppy = self.ppy();
        let rf = self.rf_period();

        if returns.len() >= 2 {
            let var_b = population_variance(bench);
            let beta = if var_b > 0.0 {
                covariance(returns, bench) / var_b
            } else {
                1.0
            };
            let mean_r = mean(returns).unwrap_or(0.0);
            let mean_b = mean(bench).unwrap_or(0.0);
            m.beta = beta;
            m.alpha = (mean_r - (rf + beta * (mean_b - rf))) * ppy;
            m.correlation = correlation(returns, bench);
        }

        let active: Vec<f64> = returns.iter().zip(bench).map(|(r, b)| r - b).collect();
        m.tracking_error = if active.len() < 2 {
            0.0
        } else {
            sample_std(&active) * ppy.sqrt()
        };
        m.information_ratio = if m.tracking_error > 0.0 {
            mean(&active).unwrap_or(0.0) * ppy / m.tracking_error
        } else {
            0.0
        };

        m.excess_return = m.total_return - total_return(bench);

        if m.beta != 0.0 {
            let avg_excess = mean(returns).unwrap_or(0.0) - rf;
            m.treynor_ratio = avg_excess * ppy / m.beta;
        }
    }
}

/// `Π(1+r) - 1`.
///
/// # Examples
///
/// ```
/// use icscore_eval::total_return;
///
/// assert!((total_return(&[0.10, -0.05, 0.02]) - 0.0659).abs() < 1e-12);
/// ```
pub fn total_return(returns: &[f64]) -> f64 {
    growth_factor(returns) - 1.0
}

/// Root mean square of `r - target` over the returns below `target`.
pub fn downside_deviation(returns: &[f64], target: f64) -> f64 {
    let below: Vec<f64> = returns
        .iter()
        .filter(|r| **r < target)
        .map(|r| (r - target).powi(2))
        .collect();
    if below.is_empty() {
        return 0.0;
    }
    (below.iter().sum::<f64>() / below.len() as f64).sqrt()
}

/// Longest positive and negative runs; a zero return breaks both.
pub fn streaks(returns: &[f64]) -> (usize, usize) {
    let (mut max_wins, mut max_losses) = (0, 0);
    let (mut wins, mut losses) = (0, 0);
    for r in returns {
        if *r > 0.0 {
            wins += 1;
            losses = 0;
            max_wins = max_wins.max(wins);
        } else if *r < 0.0 {
            losses += 1;
            wins = 0;
            max_losses = max_losses.max(losses);
        } else {
            wins = 0;
            losses = 0;
        }
    }
    (max_wins, max_losses)
}

fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else if numerator > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_total_return_and_cagr() {
        let calc = PerformanceCalculator::default();
        let returns = [0.10, -0.05, 0.02];
        assert_relative_eq!(total_return(&returns), 1.1 * 0.95 * 1.02 - 1.0, epsilon = 1e-12);

        // Twelve monthly returns span one year, so CAGR equals total return.
        let year = [0.01, 0.02, -0.01, 0.03, 0.0, 0.01, -0.02, 0.02, 0.01, 0.0, 0.015, 0.005];
        let m = calc.calculate(&year, None);
        assert_relative_eq!(m.cagr, m.total_return, epsilon = 1e-12);
        assert_eq!(m.annualized_return, m.cagr);
    }

    #[test]
    fn test_cagr_non_positive_growth() {
        let calc = PerformanceCalculator::default();
        assert_eq!(calc.cagr(&[-1.0, 0.5]), 0.0);
        assert_eq!(calc.cagr(&[]), 0.0);
    }

    #[test]
    fn test_sharpe_example() {
        let calc = PerformanceCalculator::new(0.0, 12);
        let sharpe = calc.sharpe_ratio(&[0.02, 0.03, 0.01, 0.04]);
        let expected = 0.025 / (0.0005_f64 / 3.0).sqrt() * 12.0_f64.sqrt();
        assert_relative_eq!(sharpe, expected, epsilon = 1e-9);
        assert_relative_eq!(sharpe, 6.708, epsilon = 1e-3);
    }

    #[test]
    fn test_sharpe_degenerate() {
        let calc = PerformanceCalculator::default();
        assert_eq!(calc.sharpe_ratio(&[0.05]), 0.0);
        assert_eq!(calc.sharpe_ratio(&[0.01, 0.01, 0.01]), 0.0);
        assert_eq!(calc.sortino_ratio(&[0.05, 0.06]), 0.0);
    }

    #[test]
    fn test_profit_factor_example() {
        let calc = PerformanceCalculator::default();
        let m = calc.calculate(&[0.05, -0.02, 0.03], None);
        assert_relative_eq!(m.profit_factor, 4.0, epsilon = 1e-12);
        assert_relative_eq!(m.payoff_ratio, 0.04 / 0.02, epsilon = 1e-12);
        assert_eq!(m.positive_periods, 2);
        assert_eq!(m.negative_periods, 1);
        assert_relative_eq!(m.win_rate, 2.0 / 3.0);
        assert_eq!(m.best_period, 0.05);
        assert_eq!(m.worst_period, -0.02);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let calc = PerformanceCalculator::default();
        let m = calc.calculate(&[0.01, 0.02], None);
        assert!(m.profit_factor.is_infinite());
        assert!(m.payoff_ratio.is_infinite());

        let flat = calc.calculate(&[0.0, 0.0], None);
        assert_eq!(flat.profit_factor, 0.0);
        assert_eq!(flat.payoff_ratio, 0.0);
    }

    #[test]
    fn test_streaks_reset_on_zero() {
        assert_eq!(streaks(&[0.1, 0.2, 0.0, 0.1, -0.1, -0.2, -0.3, 0.0, -0.1]), (2, 3));
        assert_eq!(streaks(&[]), (0, 0));
    }

    #[test]
    fn test_downside_deviation() {
        assert_relative_eq!(
            downside_deviation(&[0.05, -0.03, -0.04], 0.0),
            (0.0025_f64 / 2.0).sqrt()
        );
        assert_eq!(downside_deviation(&[0.01, 0.02], 0.0), 0.0);
    }

    #[test]
    fn test_benchmark_statistics() {
        let calc = PerformanceCalculator::new(0.0, 12);
        let bench = [0.01, -0.02, 0.03, 0.00, 0.02];
        let returns: Vec<f64> = bench.iter().map(|b| 2.0 * b + 0.001).collect();
        let m = calc.calculate(&returns, Some(&bench[..]));
        assert_relative_eq!(m.beta, 2.0, epsilon = 1e-9);
        assert_relative_eq!(m.correlation, 1.0, epsilon = 1e-9);
        let mean_b = bench.iter().sum::<f64>() / 5.0;
        let mean_r = 2.0 * mean_b + 0.001;
        assert_relative_eq!(m.alpha, (mean_r - 2.0 * mean_b) * 12.0, epsilon = 1e-9);
        assert!(m.tracking_error > 0.0);
        assert_relative_eq!(m.treynor_ratio, mean_r * 12.0 / 2.0, epsilon = 1e-9);
        assert_relative_eq!(
            m.excess_return,
            total_return(&returns) - total_return(&bench),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_benchmark_fallbacks() {
        let calc = PerformanceCalculator::default();
        let m = calc.calculate(&[0.01, 0.02, 0.03], Some(&[0.01, 0.02][..]));
        assert_eq!(m.beta, 1.0);
        assert_eq!(m.alpha, 0.0);
        assert_eq!(m.tracking_error, 0.0);

        let flat = calc.calculate(&[0.01, 0.02, 0.03], Some(&[0.01, 0.01, 0.01][..]));
        assert_eq!(flat.beta, 1.0);
        assert_eq!(flat.correlation, 0.0);

        let single = calc.calculate(&[0.01], Some(&[0.02][..]));
        assert_eq!(single.beta, 1.0);
        assert_eq!(single.alpha, 0.0);
    }

    #[test]
    fn test_moments_need_samples() {
        let calc = PerformanceCalculator::default();
        let m = calc.calculate(&[0.01, 0.05], None);
        assert_eq!(m.skewness, 0.0);
        assert_eq!(m.kurtosis, 0.0);

        let m = calc.calculate(&[-0.02, -0.01, 0.0, 0.01, 0.02], None);
        assert_relative_eq!(m.skewness, 0.0, epsilon = 1e-9);
        assert_relative_eq!(m.kurtosis, 1.7 - 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_series() {
        let m = PerformanceCalculator::default().calculate(&[], None);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.beta, 1.0);
    }

    #[test]
    fn test_calmar() {
        let calc = PerformanceCalculator::default();
        let returns = [0.1, -0.1, 0.05, 0.02];
        let m = calc.calculate(&returns, None);
        assert_relative_eq!(m.calmar_ratio, m.cagr / m.max_drawdown, epsilon = 1e-12);
    }
}
