//! Reduced fallback score for the icscore backtest.
//!
//! When no stored score exists for a ticker on a rebalance date, the backtest
//! rebuilds an approximation from data that was known at the time. This crate
//! provides the four components and their combination:
//! - Growth: year-over-year revenue and EPS growth
//! - Value: P/E, P/S and P/B relative to fair anchors
//! - Profitability: net margin and return on equity
//! - Momentum: twelve-month return net of the latest month
//!
//! Each component maps its inputs into `[0, 1]`; [`ReducedScorer`] weights
//! them into a 0–100 composite.
//!
//! # Example
//!
//! ```
//! use icscore_signals::{ReducedScorer, registry::available_signals};
//! use icscore_traits::Fundamentals;
//!
//! let scorer = ReducedScorer::default();
//! let fundamentals = Fundamentals { pe_ratio: Some(15.0), ..Default::default() };
//! let score = scorer.score(Some(&fundamentals), Some(&[50.0; 25][..])).unwrap();
//! assert!(score > 50.0);
//!
//! assert_eq!(available_signals().len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod composite;
pub mod growth;
pub mod momentum;
pub mod profitability;
pub mod registry;
pub mod score;
pub mod value;

// Re-export key types
pub use composite::{FactorWeights, ReducedScorer, ScoreBreakdown, ScoringConfig};
pub use growth::{Growth, GrowthConfig};
pub use momentum::{Momentum, MomentumConfig};
pub use profitability::{Profitability, ProfitabilityConfig};
pub use registry::{SignalCategory, SignalInfo};
pub use score::{ScoreInputs, SubScore};
pub use value::{MultipleBand, Value, ValueConfig};
