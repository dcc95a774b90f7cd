#![doc(issue_tracker_base_url = "https://github.com/factordynamics/icscore/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Point-in-time bucket backtests of IC Scores.
//!
//! At every rebalance date the engine scores the universe using only data
//! known on that date, ranks the scores into buckets (deciles by default),
//! and holds each bucket until the next rebalance:
//! - [`BacktestConfig`] and [`EngineSettings`]: what to simulate and how
//! - [`generate_periods`]: contiguous rebalance periods over a date range
//! - [`PointInTimeProvider`] and [`PriceBook`]: memoized as-of lookups
//! - [`Backtester`]: the per-period loop
//! - [`aggregate`] and [`BacktestResults`]: per-bucket and headline statistics
//! - [`ReportGenerator`]: summaries, rolling metrics and significance tests
//! - [`MemoryStore`]: an in-memory [`icscore_traits::DataSource`]
//!
//! # Example
//!
//! ```
//! use icscore_backtest::{BacktestConfig, Backtester, CompanyRecord, MemoryStore};
//! use icscore_traits::Date;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> icscore_traits::Result<()> {
//! let d = |m, day| Date::from_ymd_opt(2024, m, day).unwrap();
//!
//! let mut store = MemoryStore::new();
//! for (i, ticker) in ["AAA", "BBB", "CCC"].into_iter().enumerate() {
//!     store.add_company(CompanyRecord::new(ticker).in_index("sp500"));
//!     store.add_score(ticker, d(1, 1), 90.0 - 10.0 * i as f64);
//!     store.add_price(ticker, d(1, 1), 100.0);
//!     store.add_price(ticker, d(1, 31), 100.0 + 5.0 - 5.0 * i as f64);
//! }
//!
//! let config = BacktestConfig::new(d(1, 1), d(1, 31)).with_costs(0.0, 0.0);
//! let results = Backtester::with_defaults(store).run(&config).await?;
//!
//! // Fewer names than buckets: everything lands in bucket 1.
//! assert_eq!(results.period_results.len(), 1);
//! assert_eq!(results.period_results[0].num_holdings, 3);
//! # Ok(())
//! # }
//! ```

/// The version of the icscore-backtest crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod aggregate;
pub mod config;
pub mod engine;
pub mod period;
pub mod provider;
pub mod report;
pub mod results;
pub mod returns;
pub mod store;

// Re-exports
pub use aggregate::{aggregate, annualize, annualized_sharpe, hit_rate};
pub use config::{
    BacktestConfig, DEFAULT_BENCHMARK, DEFAULT_SLIPPAGE_BPS, DEFAULT_TRANSACTION_COST_BPS,
    EngineSettings, TradingCosts,
};
pub use engine::Backtester;
pub use period::generate_periods;
pub use provider::PointInTimeProvider;
pub use report::{
    BENCHMARK_KEY, BacktestReport, BacktestSummary, CumulativePoint, DEFAULT_ROLLING_WINDOW,
    DecilePerformance, PeriodRow, ReportGenerator, RollingPoint, StatisticalTests, bucket_key,
};
pub use results::{BacktestResults, PeriodOutcome, PeriodResult};
pub use returns::{PriceBook, basket_return, simple_return};
pub use store::{
    CompanyRecord, FundamentalsRecord, MemoryStore, PRICE_RECENCY_DAYS, PriceRecord, ScoreRecord,
    Snapshot,
};
