//! Common types used throughout the icscore workspace.
//!
//! This module defines the value types shared by every stage of a backtest:
//! tickers and dates, rebalance frequencies and periods, score snapshots, and
//! the records exchanged with the data layer.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days};
use serde::{Deserialize, Serialize};

use crate::{IcScoreError, Result};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// A ticker symbol such as "AAPL".
pub type Ticker = String;

/// Offset between the polars date epoch (1970-01-01) and chrono's
/// day-from-CE numbering.
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// Portfolio rebalance frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    /// Rebalance every calendar day.
    Daily,
    /// Rebalance every seven days.
    Weekly,
    /// Rebalance on the first of every month.
    #[default]
    Monthly,
    /// Rebalance on the first of every calendar quarter.
    Quarterly,
}

impl RebalanceFrequency {
    /// Number of rebalance periods in a year, used for annualization.
    pub const fn periods_per_year(self) -> usize {
        match self {
            Self::Daily => 252,
            Self::Weekly => 52,
            Self::Monthly => 12,
            Self::Quarterly => 4,
        }
    }

    /// First day of the period following the one that contains `current`.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidDate`] when the boundary falls outside
    /// the representable calendar.
    pub fn next_boundary(self, current: Date) -> Result<Date> {
        let next = match self {
            Self::Daily => current.checked_add_days(Days::new(1)),
            Self::Weekly => current.checked_add_days(Days::new(7)),
            Self::Monthly => {
                if current.month() == 12 {
                    Date::from_ymd_opt(current.year() + 1, 1, 1)
                } else {
                    Date::from_ymd_opt(current.year(), current.month() + 1, 1)
                }
            }
            Self::Quarterly => {
                let quarter_month = ((current.month() - 1) / 3 + 1) * 3 + 1;
                if quarter_month > 12 {
                    Date::from_ymd_opt(current.year() + 1, quarter_month - 12, 1)
                } else {
                    Date::from_ymd_opt(current.year(), quarter_month, 1)
                }
            }
        };

        next.ok_or_else(|| IcScoreError::InvalidDate(format!("no {self} boundary after {current}")))
    }

    /// Lowercase name, as used in configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalanceFrequency {
    type Err = IcScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(IcScoreError::InvalidConfiguration(format!(
                "unknown rebalance frequency: {other}"
            ))),
        }
    }
}

/// One rebalance period.
///
/// `end` is the last calendar day that belongs to the period; the next period
/// starts on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    /// First day of the period; scores are taken as of this date.
    pub start: Date,
    /// Last day of the period; exit prices are taken as of this date.
    pub end: Date,
}

impl Period {
    /// Create a new period.
    pub const fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Calendar days between start and end.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Composite cache key: a ticker observed as of a date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AsOfKey {
    /// Ticker symbol.
    pub ticker: Ticker,
    /// Point-in-time date.
    pub as_of: Date,
}

impl AsOfKey {
    /// Create a new key.
    pub fn new(ticker: impl Into<Ticker>, as_of: Date) -> Self {
        Self {
            ticker: ticker.into(),
            as_of,
        }
    }
}

/// Cross-section of scores valid as of one date.
///
/// Entries keep the order they were inserted in. Decile assignment sorts
/// stably, so this order breaks ties between equal scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    /// Date the scores are valid for.
    pub as_of: Date,
    entries: Vec<(Ticker, f64)>,
}

impl ScoreSnapshot {
    /// Create an empty snapshot.
    pub const fn new(as_of: Date) -> Self {
        Self {
            as_of,
            entries: Vec::new(),
        }
    }

    /// Build a snapshot from `(ticker, score)` pairs, dropping non-finite scores.
    pub fn from_pairs<I, T>(as_of: Date, pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Into<Ticker>,
    {
        let entries = pairs
            .into_iter()
            .filter(|(_, s)| s.is_finite())
            .map(|(t, s)| (t.into(), s))
            .collect();
        Self { as_of, entries }
    }

    /// Append a score. Non-finite scores are ignored.
    pub fn push(&mut self, ticker: impl Into<Ticker>, score: f64) {
        if score.is_finite() {
            self.entries.push((ticker.into(), score));
        }
    }

    /// Number of scored tickers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no ticker has a score.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(ticker, score)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(t, s)| (t.as_str(), *s))
    }

    /// Score of a ticker, if present.
    pub fn get(&self, ticker: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, s)| *s)
    }

    /// Tickers in insertion order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.entries.iter().map(|(t, _)| t.clone()).collect()
    }

    /// Borrow the raw entries.
    pub fn entries(&self) -> &[(Ticker, f64)] {
        &self.entries
    }
}

/// Universe selection applied by the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseFilter {
    /// Universe name: `all`, an index name such as `sp500`, or `sp1500`.
    pub name: String,
    /// Minimum market capitalisation (inclusive).
    pub min_market_cap: Option<f64>,
    /// Maximum market capitalisation (inclusive).
    pub max_market_cap: Option<f64>,
    /// Only these sectors, when set.
    pub sectors: Option<Vec<String>>,
    /// Sectors to leave out.
    pub exclude_sectors: Vec<String>,
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self {
            name: "sp500".to_string(),
            min_market_cap: None,
            max_market_cap: None,
            sectors: None,
            exclude_sectors: Vec::new(),
        }
    }
}

impl UniverseFilter {
    /// A filter that admits every active company.
    pub fn all() -> Self {
        Self {
            name: "all".to_string(),
            ..Default::default()
        }
    }

    /// Check the filter for contradictory bounds.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidConfiguration`] for a negative or
    /// inverted market-cap range.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_market_cap, self.max_market_cap) {
            if min > max {
                return Err(IcScoreError::InvalidConfiguration(format!(
                    "min_market_cap {min} exceeds max_market_cap {max}"
                )));
            }
        }
        if self.min_market_cap.is_some_and(|m| m < 0.0) {
            return Err(IcScoreError::InvalidConfiguration(
                "min_market_cap must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a company listed in `indices` belongs to the named universe.
    pub fn includes_membership(&self, indices: &[String]) -> bool {
        let member = |index: &str| indices.iter().any(|i| i.eq_ignore_ascii_case(index));
        match self.name.to_ascii_lowercase().as_str() {
            "all" | "" => true,
            "sp1500" => member("sp500") || member("sp400") || member("sp600"),
            name => member(name),
        }
    }

    /// Whether a company with the given cap and sector passes the filter.
    ///
    /// A company with an unknown cap fails any cap bound, and one with an
    /// unknown sector fails an include list.
    pub fn admits(&self, market_cap: Option<f64>, sector: Option<&str>) -> bool {
        if let Some(min) = self.min_market_cap {
            if !market_cap.is_some_and(|c| c >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_market_cap {
            if !market_cap.is_some_and(|c| c <= max) {
                return false;
            }
        }
        if let Some(sectors) = &self.sectors {
            if !sector.is_some_and(|s| sectors.iter().any(|x| x == s)) {
                return false;
            }
        }
        if let Some(s) = sector {
            if self.exclude_sectors.iter().any(|x| x == s) {
                return false;
            }
        }
        true
    }
}

/// Trailing-twelve-month fundamentals known as of a date.
///
/// Growth and margin figures are in percent (20.0 means 20%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fundamentals {
    /// Year-over-year revenue growth, percent.
    pub revenue_growth_yoy: Option<f64>,
    /// Year-over-year EPS growth, percent.
    pub eps_growth_yoy: Option<f64>,
    /// Net margin, percent.
    pub net_margin: Option<f64>,
    /// Return on equity, percent.
    pub roe: Option<f64>,
    /// Price / earnings.
    pub pe_ratio: Option<f64>,
    /// Price / sales.
    pub ps_ratio: Option<f64>,
    /// Price / book.
    pub pb_ratio: Option<f64>,
}

/// Descriptive company data used for weighting and sector grouping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Market capitalisation.
    pub market_cap: Option<f64>,
    /// Sector name.
    pub sector: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(RebalanceFrequency::Daily.periods_per_year(), 252);
        assert_eq!(RebalanceFrequency::Weekly.periods_per_year(), 52);
        assert_eq!(RebalanceFrequency::Monthly.periods_per_year(), 12);
        assert_eq!(RebalanceFrequency::Quarterly.periods_per_year(), 4);
    }

    #[test]
    fn test_next_boundary() {
        let f = RebalanceFrequency::Monthly;
        assert_eq!(f.next_boundary(d(2023, 1, 15)).unwrap(), d(2023, 2, 1));
        assert_eq!(f.next_boundary(d(2023, 12, 1)).unwrap(), d(2024, 1, 1));

        let q = RebalanceFrequency::Quarterly;
        assert_eq!(q.next_boundary(d(2023, 2, 10)).unwrap(), d(2023, 4, 1));
        assert_eq!(q.next_boundary(d(2023, 11, 30)).unwrap(), d(2024, 1, 1));

        assert_eq!(
            RebalanceFrequency::Weekly.next_boundary(d(2023, 1, 1)).unwrap(),
            d(2023, 1, 8)
        );
        assert_eq!(
            RebalanceFrequency::Daily.next_boundary(d(2023, 2, 28)).unwrap(),
            d(2023, 3, 1)
        );
    }

    #[test]
    fn test_frequency_from_str() {
        assert_eq!(
            "Quarterly".parse::<RebalanceFrequency>().unwrap(),
            RebalanceFrequency::Quarterly
        );
        let err = "hourly".parse::<RebalanceFrequency>().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_frequency_serde_lowercase() {
        let json = serde_json::to_string(&RebalanceFrequency::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
    }

    #[test]
    fn test_snapshot_keeps_order_and_drops_nan() {
        let snap = ScoreSnapshot::from_pairs(
            d(2024, 1, 1),
            vec![("B", 10.0), ("A", f64::NAN), ("C", 30.0)],
        );
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.tickers(), vec!["B".to_string(), "C".to_string()]);
        assert_eq!(snap.get("C"), Some(30.0));
        assert_eq!(snap.get("A"), None);
    }

    #[test]
    fn test_universe_membership() {
        let sp = UniverseFilter::default();
        assert!(sp.includes_membership(&["sp500".to_string()]));
        assert!(!sp.includes_membership(&["sp400".to_string()]));

        let wide = UniverseFilter {
            name: "sp1500".to_string(),
            ..Default::default()
        };
        assert!(wide.includes_membership(&["sp600".to_string()]));
        assert!(UniverseFilter::all().includes_membership(&[]));
    }

    #[test]
    fn test_universe_admits() {
        let filter = UniverseFilter {
            min_market_cap: Some(1e9),
            exclude_sectors: vec!["Utilities".to_string()],
            ..UniverseFilter::all()
        };
        assert!(filter.admits(Some(2e9), Some("Technology")));
        assert!(!filter.admits(Some(5e8), Some("Technology")));
        assert!(!filter.admits(None, Some("Technology")));
        assert!(!filter.admits(Some(2e9), Some("Utilities")));

        let include = UniverseFilter {
            sectors: Some(vec!["Energy".to_string()]),
            ..UniverseFilter::all()
        };
        assert!(include.admits(None, Some("Energy")));
        assert!(!include.admits(None, None));
    }

    #[test]
    fn test_universe_validate() {
        let bad = UniverseFilter {
            min_market_cap: Some(10.0),
            max_market_cap: Some(1.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(UniverseFilter::default().validate().is_ok());
    }
}
