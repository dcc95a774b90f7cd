//! Error types for the icscore workspace.
//!
//! Configuration problems are fatal and surface before a backtest starts.
//! Everything else (missing scores, missing prices, a failing data source for
//! one period) is recoverable and is reported through these variants so the
//! engine can log it and move on.

use thiserror::Error;

/// The main error type for icscore operations.
#[derive(Debug, Error)]
pub enum IcScoreError {
    /// Invalid run parameters (unknown frequency, empty date range, ...).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when a required column is missing from a DataFrame.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error when a date is out of range or invalid.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error reported by the external data layer.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl IcScoreError {
    /// Returns `true` for errors that must abort a run before it starts.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

impl From<String> for IcScoreError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for IcScoreError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for icscore operations.
pub type Result<T> = std::result::Result<T, IcScoreError>;
