//! Run parameters and engine settings.
//!
//! [`BacktestConfig`] describes *what* to simulate: the date range, the
//! rebalance cadence, the universe and the cost model. [`EngineSettings`]
//! describes *how* the engine runs it: fan-out width, portfolio construction
//! and the fallback scorer. Both validate before any period is processed.

use icscore_portfolio::WeightingScheme;
use icscore_signals::ScoringConfig;
use icscore_traits::{Date, IcScoreError, RebalanceFrequency, Result, UniverseFilter};
use serde::{Deserialize, Serialize};

/// Default transaction cost per rebalance, in basis points.
pub const DEFAULT_TRANSACTION_COST_BPS: f64 = 10.0;

/// Default slippage per rebalance, in basis points.
pub const DEFAULT_SLIPPAGE_BPS: f64 = 5.0;

/// Default benchmark ticker.
pub const DEFAULT_BENCHMARK: &str = "SPY";

fn default_transaction_cost_bps() -> f64 {
    DEFAULT_TRANSACTION_COST_BPS
}

fn default_slippage_bps() -> f64 {
    DEFAULT_SLIPPAGE_BPS
}

fn default_benchmark() -> String {
    DEFAULT_BENCHMARK.to_string()
}

/// Immutable parameters of one backtest run.
///
/// # Example
///
/// ```
/// use icscore_backtest::BacktestConfig;
/// use icscore_traits::{Date, RebalanceFrequency};
///
/// let config = BacktestConfig::new(
///     Date::from_ymd_opt(2020, 1, 1).unwrap(),
///     Date::from_ymd_opt(2023, 12, 31).unwrap(),
/// )
/// .with_frequency(RebalanceFrequency::Quarterly);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.benchmark, "SPY");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// First rebalance date
    pub start_date: Date,
    /// Last day of the simulation
    pub end_date: Date,
    /// Rebalance cadence
    #[serde(default)]
    pub rebalance_frequency: RebalanceFrequency,
    /// Universe selection
    #[serde(default)]
    pub universe: UniverseFilter,
    /// Commission per rebalance, in basis points
    #[serde(default = "default_transaction_cost_bps")]
    pub transaction_cost_bps: f64,
    /// Slippage per rebalance, in basis points
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: f64,
    /// Benchmark ticker
    #[serde(default = "default_benchmark")]
    pub benchmark: String,
}

impl BacktestConfig {
    /// Monthly S&P 500 backtest with default costs over a date range.
    pub fn new(start_date: Date, end_date: Date) -> Self {
        Self {
            start_date,
            end_date,
            rebalance_frequency: RebalanceFrequency::default(),
            universe: UniverseFilter::default(),
            transaction_cost_bps: DEFAULT_TRANSACTION_COST_BPS,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            benchmark: default_benchmark(),
        }
    }

    /// Set the rebalance frequency.
    #[must_use]
    pub const fn with_frequency(mut self, frequency: RebalanceFrequency) -> Self {
        self.rebalance_frequency = frequency;
        self
    }

    /// Set the universe filter.
    #[must_use]
    pub fn with_universe(mut self, universe: UniverseFilter) -> Self {
        self.universe = universe;
        self
    }

    /// Set both cost components, in basis points.
    #[must_use]
    pub const fn with_costs(mut self, transaction_cost_bps: f64, slippage_bps: f64) -> Self {
        self.transaction_cost_bps = transaction_cost_bps;
        self.slippage_bps = slippage_bps;
        self
    }

    /// Set the benchmark ticker.
    #[must_use]
    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = benchmark.into();
        self
    }

    /// The cost model implied by this configuration.
    pub const fn costs(&self) -> TradingCosts {
        TradingCosts::new(self.transaction_cost_bps, self.slippage_bps)
    }

    /// Length of the run in years of 365.25 days.
    pub fn years(&self) -> f64 {
        (self.end_date - self.start_date).num_days() as f64 / 365.25
    }

    /// Check the configuration before a run.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidConfiguration`] when the date range is
    /// empty or inverted, a cost is negative or not finite, the benchmark is
    /// blank, or the universe filter is inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.start_date >= self.end_date {
            return Err(IcScoreError::InvalidConfiguration(format!(
                "start date {} must be before end date {}",
                self.start_date, self.end_date
            )));
        }
        self.costs().validate()?;
        if self.benchmark.trim().is_empty() {
            return Err(IcScoreError::InvalidConfiguration(
                "benchmark ticker must not be empty".to_string(),
            ));
        }
        self.universe.validate()
    }
}

/// Per-rebalance trading frictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingCosts {
    /// Commission, in basis points
    pub transaction_cost_bps: f64,
    /// Slippage, in basis points
    pub slippage_bps: f64,
}

impl Default for TradingCosts {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSACTION_COST_BPS, DEFAULT_SLIPPAGE_BPS)
    }
}

impl TradingCosts {
    /// Create a cost model.
    pub const fn new(transaction_cost_bps: f64, slippage_bps: f64) -> Self {
        Self {
            transaction_cost_bps,
            slippage_bps,
        }
    }

    /// Frictionless trading.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Return drag charged once per period, assuming full turnover.
    ///
    /// ```
    /// use icscore_backtest::TradingCosts;
    ///
    /// assert!((TradingCosts::default().per_period() - 0.0015).abs() < 1e-12);
    /// ```
    pub fn per_period(&self) -> f64 {
        (self.transaction_cost_bps + self.slippage_bps) / 10_000.0
    }

    fn validate(&self) -> Result<()> {
        for (name, bps) in [
            ("transaction_cost_bps", self.transaction_cost_bps),
            ("slippage_bps", self.slippage_bps),
        ] {
            if !bps.is_finite() || bps < 0.0 {
                return Err(IcScoreError::InvalidConfiguration(format!(
                    "{name} must be a non-negative number, got {bps}"
                )));
            }
        }
        Ok(())
    }
}

/// How the engine executes a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Most per-ticker lookups in flight at once within a period
    pub max_concurrency: usize,
    /// Number of score buckets (10 for deciles, 5 for quintiles)
    pub buckets: usize,
    /// Weighting applied within each bucket
    pub weighting: WeightingScheme,
    /// Cut buckets within each sector instead of across the universe
    pub sector_neutral: bool,
    /// Weight constituent returns by holding weight instead of equally
    pub weighted_returns: bool,
    /// Annual risk-free rate used by the summary statistics
    pub risk_free_rate: f64,
    /// Fallback scorer configuration
    pub scoring: ScoringConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            buckets: icscore_portfolio::DECILES,
            weighting: WeightingScheme::Equal,
            sector_neutral: false,
            weighted_returns: false,
            risk_free_rate: icscore_eval::DEFAULT_RISK_FREE_RATE,
            scoring: ScoringConfig::default(),
        }
    }
}

impl EngineSettings {
    /// Check the settings before a run.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidConfiguration`] for zero concurrency,
    /// fewer than two buckets, a non-finite risk-free rate or an invalid
    /// scoring configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(IcScoreError::InvalidConfiguration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.buckets < 2 {
            return Err(IcScoreError::InvalidConfiguration(format!(
                "at least two buckets are needed to compare top and bottom, got {}",
                self.buckets
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(IcScoreError::InvalidConfiguration(
                "risk_free_rate must be finite".to_string(),
            ));
        }
        self.scoring.validate()
    }

    /// Bucket holding the lowest scores.
    pub const fn bottom_bucket(&self) -> usize {
        self.buckets
    }
}
