//! Data-source trait for point-in-time market data.
//!
//! The backtest engine never talks to a database directly. Everything it
//! knows about the past comes through [`DataSource`], and every method takes
//! an `as_of` date: implementations must only return records whose effective
//! date is on or before it. That filter is what keeps a backtest free of
//! look-ahead bias, so it belongs in the implementation and not in callers.

use async_trait::async_trait;

use crate::{CompanyProfile, Date, Fundamentals, Result, UniverseFilter};

/// Point-in-time access to the data layer.
///
/// Implementations should be cheap to call concurrently: the engine fans
/// per-ticker lookups out within a period.
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use icscore_traits::{DataSource, Date, Fundamentals, Result, UniverseFilter};
///
/// #[derive(Debug)]
/// struct EmptySource;
///
/// #[async_trait]
/// impl DataSource for EmptySource {
///     async fn universe(&self, _as_of: Date, _filter: &UniverseFilter) -> Result<Vec<String>> {
///         Ok(Vec::new())
///     }
///     async fn stored_score(&self, _ticker: &str, _as_of: Date) -> Result<Option<f64>> {
///         Ok(None)
///     }
///     async fn price(&self, _ticker: &str, _as_of: Date) -> Result<Option<f64>> {
///         Ok(None)
///     }
///     async fn fundamentals(&self, _ticker: &str, _as_of: Date) -> Result<Option<Fundamentals>> {
///         Ok(None)
///     }
///     async fn price_history(
///         &self,
///         _ticker: &str,
///         _as_of: Date,
///         _max_points: usize,
///     ) -> Result<Option<Vec<f64>>> {
///         Ok(None)
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Active tickers that pass `filter` as of a date.
    async fn universe(&self, as_of: Date, filter: &UniverseFilter) -> Result<Vec<String>>;

    /// Newest stored score calculated on or before `as_of`.
    async fn stored_score(&self, ticker: &str, as_of: Date) -> Result<Option<f64>>;

    /// Latest close on or before `as_of`.
    async fn price(&self, ticker: &str, as_of: Date) -> Result<Option<f64>>;

    /// Newest fundamentals record calculated on or before `as_of`.
    async fn fundamentals(&self, ticker: &str, as_of: Date) -> Result<Option<Fundamentals>>;

    /// Up to `max_points` closes on or before `as_of`, newest first.
    async fn price_history(
        &self,
        ticker: &str,
        as_of: Date,
        max_points: usize,
    ) -> Result<Option<Vec<f64>>>;

    /// Market cap and sector as of a date.
    ///
    /// Only needed for cap weighting and sector-neutral portfolios; the
    /// default knows nothing.
    async fn profile(&self, _ticker: &str, _as_of: Date) -> Result<Option<CompanyProfile>> {
        Ok(None)
    }
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for std::sync::Arc<S> {
    async fn universe(&self, as_of: Date, filter: &UniverseFilter) -> Result<Vec<String>> {
        (**self).universe(as_of, filter).await
    }

    async fn stored_score(&self, ticker: &str, as_of: Date) -> Result<Option<f64>> {
        (**self).stored_score(ticker, as_of).await
    }

    async fn price(&self, ticker: &str, as_of: Date) -> Result<Option<f64>> {
        (**self).price(ticker, as_of).await
    }

    async fn fundamentals(&self, ticker: &str, as_of: Date) -> Result<Option<Fundamentals>> {
        (**self).fundamentals(ticker, as_of).await
    }

    async fn price_history(
        &self,
        ticker: &str,
        as_of: Date,
        max_points: usize,
    ) -> Result<Option<Vec<f64>>> {
        (**self).price_history(ticker, as_of, max_points).await
    }

    async fn profile(&self, ticker: &str, as_of: Date) -> Result<Option<CompanyProfile>> {
        (**self).profile(ticker, as_of).await
    }
}
