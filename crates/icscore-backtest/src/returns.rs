//! Prices, period returns and the cost model applied to baskets.

use dashmap::DashMap;
use futures::{StreamExt, stream};
use icscore_portfolio::Portfolio;
use icscore_traits::{AsOfKey, DataSource, Date, Period, Ticker};
use tracing::debug;

use crate::config::TradingCosts;

/// Simple return between two closes.
///
/// `None` when either close is missing or the starting close is not
/// positive.
///
/// # Examples
///
/// ```
/// use icscore_backtest::simple_return;
///
/// assert_eq!(simple_return(Some(100.0), Some(110.0)), Some(0.1));
/// assert_eq!(simple_return(Some(0.0), Some(110.0)), None);
/// assert_eq!(simple_return(Some(100.0), None), None);
/// ```
pub fn simple_return(start: Option<f64>, end: Option<f64>) -> Option<f64> {
    match (start, end) {
        (Some(s), Some(e)) if s > 0.0 && s.is_finite() && e.is_finite() => Some((e - s) / s),
        _ => None,
    }
}

/// Net return of a basket over one period.
///
/// `members` pairs each holding weight with its period return, if any.
/// Holdings without a return are left out. The rest are averaged, equally
/// or by renormalized weight, and the per-period cost is subtracted once.
/// A basket where no holding has a return earns 0 and pays no cost.
///
/// # Examples
///
/// ```
/// use icscore_backtest::{TradingCosts, basket_return};
///
/// let members = [(0.5, Some(0.04)), (0.5, None), (0.0, Some(0.02))];
/// let net = basket_return(&members, false, TradingCosts::new(10.0, 5.0));
/// assert!((net - (0.03 - 0.0015)).abs() < 1e-12);
///
/// assert_eq!(basket_return(&[(1.0, None)], false, TradingCosts::default()), 0.0);
/// ```
pub fn basket_return(
    members: &[(f64, Option<f64>)],
    weighted: bool,
    costs: TradingCosts,
) -> f64 {
    let available: Vec<(f64, f64)> = members
        .iter()
        .filter_map(|(w, r)| r.map(|r| (*w, r)))
        .collect();
    if available.is_empty() {
        return 0.0;
    }

    let equal = || available.iter().map(|(_, r)| r).sum::<f64>() / available.len() as f64;
    let gross = if weighted {
        let total_weight: f64 = available.iter().map(|(w, _)| w).sum();
        if total_weight > 0.0 {
            available.iter().map(|(w, r)| w * r).sum::<f64>() / total_weight
        } else {
            equal()
        }
    } else {
        equal()
    };

    gross - costs.per_period()
}

/// Memoizing close lookups for one run.
#[derive(Debug, Default)]
pub struct PriceBook {
    cache: DashMap<AsOfKey, Option<f64>>,
}

impl PriceBook {
    /// Create an empty price book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every memoized close.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of memoized closes.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Latest close of `ticker` on or before `as_of`.
    ///
    /// Lookup errors are logged and reported as a missing price.
    pub async fn price<S>(&self, source: &S, ticker: &str, as_of: Date) -> Option<f64>
    where
        S: DataSource + ?Sized,
    {
        let key = AsOfKey::new(ticker, as_of);
        if let Some(hit) = self.cache.get(&key) {
            return *hit;
        }
        match source.price(ticker, as_of).await {
            Ok(close) => {
                self.cache.insert(key, close);
                close
            }
            Err(e) => {
                debug!(ticker, %as_of, error = %e, "price lookup failed");
                None
            }
        }
    }

    /// Return of `ticker` from the close as of the period start to the close
    /// as of the period end.
    pub async fn period_return<S>(&self, source: &S, ticker: &str, period: Period) -> Option<f64>
    where
        S: DataSource + ?Sized,
    {
        let start = self.price(source, ticker, period.start).await;
        let end = self.price(source, ticker, period.end).await;
        simple_return(start, end)
    }

    /// Period returns for `tickers`, in order, at most `concurrency` lookups
    /// in flight.
    pub async fn period_returns<S>(
        &self,
        source: &S,
        tickers: &[Ticker],
        period: Period,
        concurrency: usize,
    ) -> Vec<Option<f64>>
    where
        S: DataSource + ?Sized,
    {
        stream::iter(tickers)
            .map(|ticker| self.period_return(source, ticker, period))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Pair each holding's weight with its return from `lookup`.
pub(crate) fn weighted_members(
    portfolio: &Portfolio,
    lookup: impl Fn(&str) -> Option<f64>,
) -> Vec<(f64, Option<f64>)> {
    portfolio
        .holdings
        .iter()
        .map(|h| (h.weight, lookup(&h.ticker)))
        .collect()
}
