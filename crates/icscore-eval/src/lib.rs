//! Performance evaluation for icscore backtests.
//!
//! This crate turns periodic return series into the statistics used to judge
//! a scoring model:
//! - [`PerformanceCalculator`]: return, risk and risk-adjusted metrics, with
//!   optional benchmark-relative statistics
//! - Drawdown analysis: per-point drawdowns, maximum drawdown and dated
//!   peak-to-trough episodes
//! - [`significance`]: Welch t-test, Wilcoxon signed-rank and binomial
//!   hit-rate tests of top versus bottom buckets
//! - [`DecileComparison`]: per-bucket metrics, spreads and monotonicity
//!
//! # Example
//!
//! ```
//! use icscore_eval::{PerformanceCalculator, max_drawdown, significance::welch_t_test};
//!
//! let top = [0.03, 0.01, 0.04, 0.02];
//! let bottom = [-0.01, 0.00, 0.01, -0.02];
//!
//! let metrics = PerformanceCalculator::default().calculate(&top, Some(&bottom[..]));
//! assert!(metrics.excess_return > 0.0);
//! assert_eq!(max_drawdown(&top), 0.0);
//!
//! let t = welch_t_test(&top, &bottom);
//! assert!(t.t_statistic > 0.0);
//! ```

pub mod comparison;
pub mod drawdown;
pub mod metrics;
pub mod significance;

// Re-export main types
pub use comparison::{DecileComparison, MetricMonotonicity, SpreadMetrics, monotonicity};
pub use drawdown::{
    DrawdownInfo, analyze_drawdowns, average_drawdown, drawdown_series, max_drawdown,
    max_drawdown_duration,
};
pub use metrics::{
    BacktestMetrics, DEFAULT_RISK_FREE_RATE, PerformanceCalculator, downside_deviation, streaks,
    total_return,
};
pub use significance::{
    BinomialTestResult, TTestResult, WilcoxonResult, binomial_test, welch_t_test,
    wilcoxon_signed_rank,
};
