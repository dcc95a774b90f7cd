#![doc(issue_tracker_base_url = "https://github.com/factordynamics/icscore/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and data-source contract for the icscore backtesting engine.
//!
//! This crate provides the foundational pieces every other icscore crate
//! builds on: the error type, point-in-time value types (periods, snapshots,
//! universe filters), the [`DataSource`] trait through which historical data
//! is read, and small statistical helpers.

/// The version of the icscore-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod source;
pub mod stats;
pub mod types;

// Re-exports
pub use error::{IcScoreError, Result};
pub use source::DataSource;
pub use types::{
    AsOfKey, CE_TO_UNIX_EPOCH_DAYS, CompanyProfile, Date, Fundamentals, Period,
    RebalanceFrequency, ScoreSnapshot, Ticker, UniverseFilter,
};
