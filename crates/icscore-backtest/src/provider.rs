//! Point-in-time score lookup.
//!
//! A score for `(ticker, as_of)` is the newest stored score calculated on or
//! before `as_of`. Without one, the provider rebuilds a reduced score from
//! fundamentals and price history known at the time. Answers are memoized
//! for the duration of a run.

use dashmap::DashMap;
use futures::{StreamExt, stream};
use icscore_signals::ReducedScorer;
use icscore_traits::{AsOfKey, DataSource, Date, Result, ScoreSnapshot, Ticker};
use tracing::debug;

/// Memoizing score provider.
///
/// The cache is shared by concurrent lookups within a period. Failed lookups
/// are not cached, so a transient data-layer error can be retried later.
#[derive(Debug, Default)]
pub struct PointInTimeProvider {
    scorer: ReducedScorer,
    cache: DashMap<AsOfKey, Option<f64>>,
}

impl PointInTimeProvider {
    /// Create a provider using `scorer` as the fallback.
    pub fn new(scorer: ReducedScorer) -> Self {
        Self {
            scorer,
            cache: DashMap::new(),
        }
    }

    /// The fallback scorer.
    pub const fn scorer(&self) -> &ReducedScorer {
        &self.scorer
    }

    /// Forget every memoized score.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of memoized `(ticker, date)` answers.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Score of `ticker` as of a date, or `None` when none can be formed.
    ///
    /// Data-layer errors are logged and reported as `None`.
    pub async fn score_as_of<S>(&self, source: &S, ticker: &str, as_of: Date) -> Option<f64>
    where
        S: DataSource + ?Sized,
    {
        let key = AsOfKey::new(ticker, as_of);
        if let Some(hit) = self.cache.get(&key) {
            return *hit;
        }

        match self.resolve(source, ticker, as_of).await {
            Ok(score) => {
                self.cache.insert(key, score);
                score
            }
            Err(e) => {
                debug!(ticker, %as_of, error = %e, "score lookup failed");
                None
            }
        }
    }

    async fn resolve<S>(&self, source: &S, ticker: &str, as_of: Date) -> Result<Option<f64>>
    where
        S: DataSource + ?Sized,
    {
        if let Some(stored) = source.stored_score(ticker, as_of).await? {
            if stored.is_finite() {
                return Ok(Some(stored));
            }
        }

        let Some(fundamentals) = source.fundamentals(ticker, as_of).await? else {
            return Ok(None);
        };
        let prices = source
            .price_history(ticker, as_of, self.scorer.history_points())
            .await?;
        Ok(self.scorer.score(Some(&fundamentals), prices.as_deref()))
    }

    /// Scores for `tickers` as of a date, at most `concurrency` lookups in
    /// flight.
    ///
    /// The snapshot keeps the order of `tickers` and leaves out tickers
    /// without a score.
    pub async fn snapshot<S>(
        &self,
        source: &S,
        tickers: &[Ticker],
        as_of: Date,
        concurrency: usize,
    ) -> ScoreSnapshot
    where
        S: DataSource + ?Sized,
    {
        let scores: Vec<Option<f64>> = stream::iter(tickers)
            .map(|ticker| self.score_as_of(source, ticker, as_of))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let snapshot = ScoreSnapshot::from_pairs(
            as_of,
            tickers
                .iter()
                .zip(scores)
                .filter_map(|(t, s)| s.map(|s| (t.clone(), s))),
        );
        debug!(%as_of, universe = tickers.len(), scored = snapshot.len(), "scored universe");
        snapshot
    }
}
