//! In-memory, point-in-time data store.
//!
//! [`MemoryStore`] keeps every series sorted by effective date and answers
//! each query with a binary search bounded by the `as_of` date, so nothing
//! dated after the as-of date can ever be returned. It is filled from a JSON
//! [`Snapshot`] or from polars DataFrames.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use async_trait::async_trait;
use chrono::Days;
use icscore_traits::{
    CE_TO_UNIX_EPOCH_DAYS, CompanyProfile, DataSource, Date, Fundamentals, IcScoreError, Result,
    Ticker, UniverseFilter,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A company needs a close within this many days before the as-of date to be
/// part of the universe.
pub const PRICE_RECENCY_DAYS: u64 = 7;

const fn active_by_default() -> bool {
    true
}

/// Static description of a listed company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Whether the company is still listed
    #[serde(default = "active_by_default")]
    pub active: bool,
    /// Index memberships, e.g. `sp500`
    #[serde(default)]
    pub indices: Vec<String>,
    /// Sector name
    #[serde(default)]
    pub sector: Option<String>,
    /// Market capitalisation
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl CompanyRecord {
    /// An active company with no index memberships.
    pub fn new(ticker: impl Into<Ticker>) -> Self {
        Self {
            ticker: ticker.into(),
            active: true,
            indices: Vec::new(),
            sector: None,
            market_cap: None,
        }
    }

    /// Add an index membership.
    #[must_use]
    pub fn in_index(mut self, index: impl Into<String>) -> Self {
        self.indices.push(index.into());
        self
    }

    /// Set the sector.
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Set the market cap.
    #[must_use]
    pub const fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Mark the company delisted.
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A daily close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Trading day
    pub date: Date,
    /// Closing price
    pub close: f64,
}

/// A stored score, effective from its calculation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Calculation date
    pub date: Date,
    /// Score in [0, 100]
    pub score: f64,
}

/// A fundamentals record, effective from its calculation date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Calculation date
    pub date: Date,
    /// The figures
    #[serde(flatten)]
    pub values: Fundamentals,
}

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Company master data
    pub companies: Vec<CompanyRecord>,
    /// Daily closes
    pub prices: Vec<PriceRecord>,
    /// Stored scores
    pub scores: Vec<ScoreRecord>,
    /// Fundamentals
    pub fundamentals: Vec<FundamentalsRecord>,
}

/// Date-sorted series per ticker. Records sharing a date keep insertion
/// order, so the last one inserted wins.
type DatedSeries<T> = HashMap<Ticker, Vec<(Date, T)>>;

fn insert_sorted<T>(series: &mut DatedSeries<T>, ticker: Ticker, date: Date, value: T) {
    let entries = series.entry(ticker).or_default();
    let at = entries.partition_point(|(d, _)| *d <= date);
    entries.insert(at, (date, value));
}

/// Entries of `ticker` effective on or before `as_of`.
fn known_as_of<'a, T>(series: &'a DatedSeries<T>, ticker: &str, as_of: Date) -> &'a [(Date, T)] {
    let Some(entries) = series.get(ticker) else {
        return &[];
    };
    let end = entries.partition_point(|(d, _)| *d <= as_of);
    &entries[..end]
}

fn latest<'a, T>(series: &'a DatedSeries<T>, ticker: &str, as_of: Date) -> Option<&'a T> {
    known_as_of(series, ticker, as_of).last().map(|(_, v)| v)
}

/// In-memory [`DataSource`] with a built-in look-ahead guard.
///
/// # Example
///
/// ```
/// use icscore_backtest::{CompanyRecord, MemoryStore};
/// use icscore_traits::{DataSource, Date};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut store = MemoryStore::new();
/// store.add_company(CompanyRecord::new("AAPL").in_index("sp500"));
/// let jan = Date::from_ymd_opt(2024, 1, 2).unwrap();
/// let feb = Date::from_ymd_opt(2024, 2, 1).unwrap();
/// store.add_price("AAPL", jan, 185.0);
/// store.add_price("AAPL", feb, 190.0);
///
/// let as_of = Date::from_ymd_opt(2024, 1, 31).unwrap();
/// assert_eq!(store.price("AAPL", as_of).await.unwrap(), Some(185.0));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    companies: BTreeMap<Ticker, CompanyRecord>,
    prices: DatedSeries<f64>,
    scores: DatedSeries<f64>,
    fundamentals: DatedSeries<Fundamentals>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        for company in snapshot.companies {
            store.add_company(company);
        }
        for p in snapshot.prices {
            store.add_price(p.ticker, p.date, p.close);
        }
        for s in snapshot.scores {
            store.add_score(s.ticker, s.date, s.score);
        }
        for f in snapshot.fundamentals {
            store.add_fundamentals(f.ticker, f.date, f.values);
        }
        store
    }

    /// Parse a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::InvalidData`] when the JSON does not describe a
    /// [`Snapshot`].
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| IcScoreError::InvalidData(format!("invalid snapshot: {e}")))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Read a JSON snapshot from disk.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::DataSource`] when the file cannot be read and
    /// [`IcScoreError::InvalidData`] when it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| IcScoreError::DataSource(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Add or replace a company.
    pub fn add_company(&mut self, company: CompanyRecord) {
        self.companies.insert(company.ticker.clone(), company);
    }

    /// Record a close.
    pub fn add_price(&mut self, ticker: impl Into<Ticker>, date: Date, close: f64) {
        insert_sorted(&mut self.prices, ticker.into(), date, close);
    }

    /// Record a stored score.
    pub fn add_score(&mut self, ticker: impl Into<Ticker>, date: Date, score: f64) {
        insert_sorted(&mut self.scores, ticker.into(), date, score);
    }

    /// Record a fundamentals snapshot.
    pub fn add_fundamentals(
        &mut self,
        ticker: impl Into<Ticker>,
        date: Date,
        values: Fundamentals,
    ) {
        insert_sorted(&mut self.fundamentals, ticker.into(), date, values);
    }

    /// Load closes from a frame with `ticker`, `date` and `close` columns.
    ///
    /// Rows with a null in any of them are skipped. Returns the number of
    /// rows stored.
    ///
    /// # Errors
    ///
    /// Returns [`IcScoreError::MissingColumn`] when a column is absent and
    /// [`IcScoreError::Polars`] when one has an unusable type.
    pub fn insert_price_frame(&mut self, df: &DataFrame) -> Result<usize> {
        let rows = dated_values(df, "close")?;
        let n = rows.len();
        for (ticker, date, close) in rows {
            self.add_price(ticker, date, close);
        }
        Ok(n)
    }

    /// Load stored scores from a frame with `ticker`, `date` and `score`
    /// columns.
    ///
    /// # Errors
    ///
    /// Same as [`Self::insert_price_frame`].
    pub fn insert_score_frame(&mut self, df: &DataFrame) -> Result<usize> {
        let rows = dated_values(df, "score")?;
        let n = rows.len();
        for (ticker, date, score) in rows {
            self.add_score(ticker, date, score);
        }
        Ok(n)
    }

    /// Known companies, in ticker order.
    pub fn companies(&self) -> impl Iterator<Item = &CompanyRecord> {
        self.companies.values()
    }

    /// Whether `ticker` has a close in the recency window ending at `as_of`.
    fn recently_priced(&self, ticker: &str, as_of: Date) -> bool {
        let window_start = as_of
            .checked_sub_days(Days::new(PRICE_RECENCY_DAYS))
            .unwrap_or(Date::MIN);
        known_as_of(&self.prices, ticker, as_of)
            .last()
            .is_some_and(|(d, _)| *d >= window_start)
    }
}

fn required<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| IcScoreError::MissingColumn(name.to_string()))
}

/// `(ticker, date, value)` rows of a frame, skipping rows with nulls.
fn dated_values(df: &DataFrame, value_col: &str) -> Result<Vec<(Ticker, Date, f64)>> {
    let tickers = required(df, "ticker")?.as_materialized_series().str()?;
    let date_col = required(df, "date")?.cast(&DataType::Date)?;
    let value_col = required(df, value_col)?.cast(&DataType::Float64)?;

    let rows = tickers
        .into_iter()
        .zip(date_col.as_materialized_series().date()?.into_iter())
        .zip(value_col.as_materialized_series().f64()?.into_iter())
        .filter_map(|((ticker, days), value): ((Option<&str>, Option<i32>), Option<f64>)| {
            let date = Date::from_num_days_from_ce_opt(days? + CE_TO_UNIX_EPOCH_DAYS)?;
            Some((ticker?.to_string(), date, value?))
        })
        .collect();
    Ok(rows)
}

#[async_trait]
impl DataSource for MemoryStore {
    async fn universe(&self, as_of: Date, filter: &UniverseFilter) -> Result<Vec<String>> {
        Ok(self
            .companies
            .values()
            .filter(|c| c.active)
            .filter(|c| filter.includes_membership(&c.indices))
            .filter(|c| filter.admits(c.market_cap, c.sector.as_deref()))
            .filter(|c| self.recently_priced(&c.ticker, as_of))
            .map(|c| c.ticker.clone())
            .collect())
    }

    async fn stored_score(&self, ticker: &str, as_of: Date) -> Result<Option<f64>> {
        Ok(latest(&self.scores, ticker, as_of).copied())
    }

    async fn price(&self, ticker: &str, as_of: Date) -> Result<Option<f64>> {
        Ok(latest(&self.prices, ticker, as_of).copied())
    }

    async fn fundamentals(&self, ticker: &str, as_of: Date) -> Result<Option<Fundamentals>> {
        Ok(latest(&self.fundamentals, ticker, as_of).copied())
    }

    async fn price_history(
        &self,
        ticker: &str,
        as_of: Date,
        max_points: usize,
    ) -> Result<Option<Vec<f64>>> {
        let history: Vec<f64> = known_as_of(&self.prices, ticker, as_of)
            .iter()
            .rev()
            .take(max_points)
            .map(|(_, close)| *close)
            .collect();
        Ok((!history.is_empty()).then_some(history))
    }

    async fn profile(&self, ticker: &str, _as_of: Date) -> Result<Option<CompanyProfile>> {
        Ok(self.companies.get(ticker).map(|c| CompanyProfile {
            market_cap: c.market_cap,
            sector: c.sector.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_company(
            CompanyRecord::new("AAPL")
                .in_index("sp500")
                .with_sector("Technology")
                .with_market_cap(3.0e12),
        );
        store.add_company(
            CompanyRecord::new("JPM")
                .in_index("sp500")
                .with_sector("Financial Services")
                .with_market_cap(5.0e11),
        );
        store.add_company(CompanyRecord::new("SMID").in_index("sp600").with_sector("Industrials"));
        store.add_company(CompanyRecord::new("GONE").in_index("sp500").inactive());
        for ticker in ["AAPL", "JPM", "SMID", "GONE"] {
            store.add_price(ticker, d(2024, 1, 2), 100.0);
            store.add_price(ticker, d(2024, 1, 31), 110.0);
        }
        store
    }

    #[tokio::test]
    async fn test_no_look_ahead() {
        let mut store = store();
        store.add_score("AAPL", d(2024, 1, 15), 70.0);
        store.add_score("AAPL", d(2024, 2, 15), 90.0);

        assert_eq!(store.stored_score("AAPL", d(2024, 1, 14)).await.unwrap(), None);
        assert_eq!(store.stored_score("AAPL", d(2024, 1, 15)).await.unwrap(), Some(70.0));
        assert_eq!(store.stored_score("AAPL", d(2024, 2, 14)).await.unwrap(), Some(70.0));
        assert_eq!(store.stored_score("AAPL", d(2024, 3, 1)).await.unwrap(), Some(90.0));

        assert_eq!(store.price("AAPL", d(2024, 1, 30)).await.unwrap(), Some(100.0));
        assert_eq!(store.price("AAPL", d(2024, 1, 1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_out_of_order_inserts() {
        let mut store = MemoryStore::new();
        store.add_price("X", d(2024, 3, 1), 3.0);
        store.add_price("X", d(2024, 1, 1), 1.0);
        store.add_price("X", d(2024, 2, 1), 2.0);
        store.add_price("X", d(2024, 2, 1), 2.5);

        assert_eq!(store.price("X", d(2024, 2, 10)).await.unwrap(), Some(2.5));
        let history = store.price_history("X", d(2024, 12, 31), 10).await.unwrap();
        assert_eq!(history, Some(vec![3.0, 2.5, 2.0, 1.0]));
        let capped = store.price_history("X", d(2024, 2, 1), 2).await.unwrap();
        assert_eq!(capped, Some(vec![2.5, 2.0]));
        assert_eq!(store.price_history("X", d(2023, 1, 1), 10).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_universe_membership_and_filters() {
        let store = store();
        let as_of = d(2024, 2, 1);

        let sp500 = store.universe(as_of, &UniverseFilter::default()).await.unwrap();
        assert_eq!(sp500, vec!["AAPL".to_string(), "JPM".to_string()]);

        let sp1500 = UniverseFilter {
            name: "sp1500".to_string(),
            ..Default::default()
        };
        let tickers = store.universe(as_of, &sp1500).await.unwrap();
        assert_eq!(tickers, vec!["AAPL", "JPM", "SMID"]);

        let no_financials = UniverseFilter {
            exclude_sectors: vec!["Financial Services".to_string()],
            ..Default::default()
        };
        assert_eq!(store.universe(as_of, &no_financials).await.unwrap(), vec!["AAPL"]);

        let large = UniverseFilter {
            min_market_cap: Some(1.0e12),
            ..UniverseFilter::all()
        };
        assert_eq!(store.universe(as_of, &large).await.unwrap(), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_universe_requires_recent_price() {
        let store = store();
        // Last close on Jan 31; Feb 7 is still inside the window.
        let inside = store.universe(d(2024, 2, 7), &UniverseFilter::all()).await.unwrap();
        assert_eq!(inside.len(), 3);
        let stale = store.universe(d(2024, 2, 8), &UniverseFilter::all()).await.unwrap();
        assert!(stale.is_empty());
        // Before any close.
        assert!(store.universe(d(2023, 12, 31), &UniverseFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile() {
        let store = store();
        let profile = store.profile("AAPL", d(2024, 1, 2)).await.unwrap().unwrap();
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.market_cap, Some(3.0e12));
        assert_eq!(store.profile("NOPE", d(2024, 1, 2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_from_json_snapshot() {
        let json = r#"{
            "companies": [{ "ticker": "MSFT", "indices": ["sp500"], "sector": "Technology" }],
            "prices": [
                { "ticker": "MSFT", "date": "2024-01-02", "close": 370.0 },
                { "ticker": "MSFT", "date": "2024-01-31", "close": 397.5 }
            ],
            "scores": [{ "ticker": "MSFT", "date": "2023-12-31", "score": 81.0 }],
            "fundamentals": [
                { "ticker": "MSFT", "date": "2023-12-31", "pe_ratio": 35.0, "roe": 38.0 }
            ]
        }"#;
        let store = MemoryStore::from_json(json).unwrap();
        assert_eq!(store.companies().count(), 1);
        assert!(store.companies().all(|c| c.active));

        let as_of = d(2024, 1, 2);
        assert_eq!(store.stored_score("MSFT", as_of).await.unwrap(), Some(81.0));
        let f = store.fundamentals("MSFT", as_of).await.unwrap().unwrap();
        assert_eq!(f.pe_ratio, Some(35.0));
        assert_eq!(f.net_margin, None);

        assert!(matches!(
            MemoryStore::from_json("{ not json"),
            Err(IcScoreError::InvalidData(_))
        ));
        assert!(matches!(
            MemoryStore::from_path("/definitely/not/here.json"),
            Err(IcScoreError::DataSource(_))
        ));
    }

    #[tokio::test]
    async fn test_price_frame() {
        let df = df! {
            "ticker" => ["AAPL", "AAPL", "MSFT"],
            "date" => [d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 2)],
            "close" => [185.0, 184.0, 370.0],
        }
        .unwrap();

        let mut store = MemoryStore::new();
        assert_eq!(store.insert_price_frame(&df).unwrap(), 3);
        assert_eq!(store.price("AAPL", d(2024, 1, 5)).await.unwrap(), Some(184.0));
        assert_eq!(store.price("MSFT", d(2024, 1, 2)).await.unwrap(), Some(370.0));
    }

    #[tokio::test]
    async fn test_score_frame_skips_nulls() {
        let df = df! {
            "ticker" => [Some("AAPL"), None, Some("MSFT")],
            "date" => [d(2024, 1, 2), d(2024, 1, 2), d(2024, 1, 2)],
            "score" => [Some(72.0), Some(50.0), None],
        }
        .unwrap();

        let mut store = MemoryStore::new();
        assert_eq!(store.insert_score_frame(&df).unwrap(), 1);
        assert_eq!(store.stored_score("AAPL", d(2024, 1, 2)).await.unwrap(), Some(72.0));
        assert_eq!(store.stored_score("MSFT", d(2024, 1, 2)).await.unwrap(), None);
    }

    #[test]
    fn test_frame_missing_column() {
        let df = df! {
            "ticker" => ["AAPL"],
            "date" => [d(2024, 1, 2)],
        }
        .unwrap();
        let err = MemoryStore::new().insert_price_frame(&df).unwrap_err();
        assert!(matches!(err, IcScoreError::MissingColumn(c) if c == "close"));
    }
}
