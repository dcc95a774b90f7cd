//! Portfolio construction for the icscore backtest.
//!
//! This crate turns a cross-section of scores into ranked bucket portfolios
//! and measures how those portfolios change between rebalances:
//! - [`DecileBuilder`]: stable descending ranking cut into deciles (or any
//!   bucket count), with a long/short pair of the extremes
//! - [`SectorNeutralBuilder`]: the same split applied within each sector
//! - [`WeightingScheme`]: equal, market-cap, score and inverse-volatility
//!   weights
//! - [`turnover`] and [`PortfolioTransition`]: churn between compositions
//! - [`FactorExposure`]: holding-weighted style exposures, absolute or
//!   against a benchmark portfolio
//!
//! # Examples
//!
//! ```
//! use icscore_portfolio::{Candidate, DecileBuilder, WeightingScheme, turnover};
//!
//! let candidates: Vec<Candidate> = (0..30)
//!     .map(|i| Candidate::new(format!("T{i}"), f64::from(i)))
//!     .collect();
//!
//! let builder = DecileBuilder::new(WeightingScheme::ScoreWeighted);
//! let deciles = builder.build(&candidates);
//! assert_eq!(deciles.len(), 10);
//! assert!(deciles.iter().all(|p| p.is_normalized(1e-9)));
//!
//! let churn = turnover(&deciles[0].tickers(), &deciles[1].tickers());
//! assert_eq!(churn, 1.0);
//! ```

mod decile;
mod exposure;
mod holding;
mod sector_neutral;
mod turnover;
mod weighting;

pub use decile::{DECILES, DecileBuilder, LongShortPair, QUINTILES, bucket_ranges};
pub use exposure::{FactorExposure, FactorScores, StyleFactor};
pub use holding::{Candidate, Holding, Portfolio, UNKNOWN_SECTOR};
pub use sector_neutral::SectorNeutralBuilder;
pub use turnover::{PortfolioTransition, turnover};
pub use weighting::WeightingScheme;
