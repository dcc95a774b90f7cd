//! Input loading for the icscore CLI.

use std::{fs, path::Path};

use chrono::NaiveDate;
use icscore_backtest::{BacktestConfig, EngineSettings, MemoryStore};
use icscore_traits::{IcScoreError, Result};
use serde::Deserialize;

/// A run configuration file: the backtest parameters plus an optional
/// `engine` section.
///
/// ```json
/// {
///   "start_date": "2020-01-01",
///   "end_date": "2023-12-31",
///   "rebalance_frequency": "quarterly",
///   "universe": { "name": "sp500", "exclude_sectors": ["Utilities"] },
///   "engine": { "buckets": 5 }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub(crate) struct RunFile {
    #[serde(flatten)]
    pub(crate) backtest: BacktestConfig,
    #[serde(default)]
    pub(crate) engine: EngineSettings,
}

impl RunFile {
    /// Parse a run configuration.
    pub(crate) fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| IcScoreError::InvalidConfiguration(format!("Invalid run config: {e}")))
    }
}

/// Load a run configuration file.
pub(crate) fn load_run(path: &Path) -> Result<RunFile> {
    let json = fs::read_to_string(path).map_err(|e| {
        IcScoreError::InvalidConfiguration(format!("Cannot read {}: {e}", path.display()))
    })?;
    RunFile::from_json(&json)
}

/// Load a data snapshot into an in-memory store.
pub(crate) fn load_store(path: &Path) -> Result<MemoryStore> {
    MemoryStore::from_path(path)
}

/// Parse a date string in YYYY-MM-DD format.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| IcScoreError::InvalidDate(format!("Invalid date format: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use icscore_traits::RebalanceFrequency;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_date_invalid() {
        let result = parse_date("invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_run_file_defaults() {
        let run = RunFile::from_json(r#"{"start_date": "2020-01-01", "end_date": "2020-12-31"}"#)
            .unwrap();
        assert_eq!(run.backtest.rebalance_frequency, RebalanceFrequency::Monthly);
        assert_eq!(run.backtest.benchmark, "SPY");
        assert_eq!(run.engine, EngineSettings::default());
    }

    #[test]
    fn test_run_file_with_engine_section() {
        let json = r#"{
            "start_date": "2020-01-01",
            "end_date": "2023-12-31",
            "rebalance_frequency": "quarterly",
            "transaction_cost_bps": 0,
            "universe": {"name": "all", "exclude_sectors": ["Utilities"]},
            "engine": {"buckets": 5, "sector_neutral": true}
        }"#;
        let run = RunFile::from_json(json).unwrap();
        assert_eq!(run.backtest.rebalance_frequency, RebalanceFrequency::Quarterly);
        assert_eq!(run.backtest.transaction_cost_bps, 0.0);
        assert_eq!(run.backtest.universe.name, "all");
        assert_eq!(run.engine.buckets, 5);
        assert!(run.engine.sector_neutral);
        assert_eq!(run.engine.max_concurrency, 16);
    }

    #[test]
    fn test_run_file_rejects_garbage() {
        let err = RunFile::from_json("{").unwrap_err();
        assert!(err.is_fatal());
    }
}
