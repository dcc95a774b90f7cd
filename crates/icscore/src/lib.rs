#![doc(issue_tracker_base_url = "https://github.com/factordynamics/icscore/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # icscore
//!
//! Point-in-time decile backtesting of IC Scores.
//!
//! icscore is an umbrella crate that re-exports all icscore sub-crates for
//! convenience. It answers one question: did higher scores lead to higher
//! subsequent returns, once look-ahead bias is ruled out?
//!
//! ## Quick Start
//!
//! ```
//! use icscore::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> icscore::Result<()> {
//! let store = MemoryStore::new();
//! let config = BacktestConfig::new(
//!     Date::from_ymd_opt(2023, 1, 1).unwrap(),
//!     Date::from_ymd_opt(2023, 12, 31).unwrap(),
//! )
//! .with_frequency(RebalanceFrequency::Quarterly);
//!
//! let results = Backtester::with_defaults(store).run(&config).await?;
//! let summary = ReportGenerator::default().summary(&results);
//! assert_eq!(results.outcomes.len(), 4);
//! assert_eq!(summary.skipped_periods, 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Error type, core types and the [`DataSource`] contract
//! - [`signals`] - Reduced fallback score built from fundamentals and prices
//! - [`portfolio`] - Decile, quintile and sector-neutral bucket construction
//! - [`eval`] - Performance metrics, drawdowns and significance tests
//! - [`backtest`] - The engine, its results and reports
//!
//! ## Architecture
//!
//! Each rebalance period runs the same pipeline:
//!
//! 1. **Universe** is read as of the period start
//! 2. **Scores** are looked up point in time, falling back to a reduced score
//! 3. **Buckets** are formed by ranking the scores
//! 4. **Returns** are measured over the period, net of costs
//!
//! The rows are then folded into per-bucket statistics, the top-minus-bottom
//! spread, hit rate and monotonicity.

/// Version information for the icscore crate.
///
/// This constant contains the current version of icscore as specified in Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core Types
// ============================================================================

/// Core types and the data-source contract.
///
/// - [`DataSource`] - Async, point-in-time access to historical data
/// - [`Period`], [`RebalanceFrequency`], [`UniverseFilter`] - run vocabulary
/// - [`IcScoreError`] - The error type shared by every crate
pub mod traits {
    pub use icscore_traits::*;
}

pub use icscore_traits::{DataSource, IcScoreError, Result};
pub use icscore_traits::{Date, Period, RebalanceFrequency, Ticker, UniverseFilter};

// ============================================================================
// Fallback Score
// ============================================================================

/// Reduced fallback score.
///
/// Used when no stored score exists for a ticker on a rebalance date. Four
/// components are mapped into `[0, 1]` and weighted into a 0–100 composite:
///
/// | Component     | Inputs                        | Default weight |
/// |---------------|-------------------------------|----------------|
/// | Growth        | revenue and EPS growth        | 0.12           |
/// | Value         | P/E, P/S, P/B                 | 0.12           |
/// | Profitability | net margin, ROE               | 0.12           |
/// | Momentum      | twelve-month minus one-month  | 0.10           |
///
/// Weights are renormalized over their sum.
pub mod signals {
    pub use icscore_signals::*;
}

// ============================================================================
// Portfolio Construction
// ============================================================================

/// Bucket portfolio construction.
///
/// Scores are ranked highest first with a stable sort and cut into equally
/// sized buckets; the last bucket absorbs the remainder. Sector-neutral
/// construction applies the same cut within each sector.
///
/// ### Turnover
///
/// ```text
/// turnover = 1 - |prev ∩ curr| / max(|prev|, |curr|)
/// ```
pub mod portfolio {
    pub use icscore_portfolio::*;
}

// ============================================================================
// Evaluation
// ============================================================================

/// Performance evaluation.
///
/// ### Sharpe Ratio
///
/// ```text
/// sharpe = mean(r - rf/ppy) · √ppy / std(r - rf/ppy)
/// ```
///
/// ### Monotonicity
///
/// Share of bucket pairs `(i, j)`, `i < j`, where bucket `i` returned more
/// than bucket `j`. A perfectly ordered score gives 1.
pub mod eval {
    pub use icscore_eval::*;
}

// ============================================================================
// Backtesting
// ============================================================================

/// The backtest engine, results and reports.
pub mod backtest {
    pub use icscore_backtest::*;
}

pub use icscore_backtest::{
    BacktestConfig, BacktestResults, Backtester, EngineSettings, MemoryStore, ReportGenerator,
};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```
/// use icscore::prelude::*;
/// ```
///
/// This brings into scope:
/// - Core types: [`Date`], [`Period`], [`RebalanceFrequency`], [`UniverseFilter`]
/// - The engine: [`Backtester`], [`BacktestConfig`], [`EngineSettings`]
/// - Data: [`DataSource`], [`MemoryStore`]
/// - Reporting: [`ReportGenerator`]
/// - Error types: [`Result`], [`IcScoreError`]
pub mod prelude {
    pub use crate::{
        BacktestConfig, BacktestResults, Backtester, DataSource, Date, EngineSettings,
        IcScoreError, MemoryStore, Period, RebalanceFrequency, ReportGenerator, Result, Ticker,
        UniverseFilter,
    };
    pub use icscore_portfolio::WeightingScheme;
}

// ============================================================================
// Tests
// ============================================================================
