//! The backtest driver.
//!
//! For each rebalance period, in order:
//! 1. read the universe as of the period start
//! 2. score it point in time
//! 3. cut the scored names into ranked buckets
//! 4. price every bucket over the period, net of costs, and measure turnover
//!
//! A period with no scores is skipped and a period whose data-layer calls
//! fail is recorded as failed; neither stops the run.

use std::collections::{BTreeMap, HashMap};

use futures::{StreamExt, stream};
use icscore_portfolio::{Candidate, DecileBuilder, Portfolio, SectorNeutralBuilder, turnover};
use icscore_signals::ReducedScorer;
use icscore_traits::{DataSource, Period, Result, ScoreSnapshot, Ticker};
use tracing::{debug, error, info, warn};

use crate::{
    aggregate::aggregate,
    config::{BacktestConfig, EngineSettings},
    period::generate_periods,
    provider::PointInTimeProvider,
    results::{BacktestResults, PeriodOutcome, PeriodResult},
    returns::{PriceBook, basket_return, weighted_members},
};

/// What one period produced.
enum PeriodRun {
    Completed {
        scored: usize,
        rows: Vec<PeriodResult>,
    },
    Skipped(String),
}

/// Runs point-in-time bucket backtests against a [`DataSource`].
///
/// Score and price caches live as long as the backtester but are cleared at
/// the start of every run, so runs never share state. Runs on the same
/// backtester should not overlap.
///
/// # Example
///
/// ```
/// use icscore_backtest::{BacktestConfig, Backtester, MemoryStore};
/// use icscore_traits::Date;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> icscore_traits::Result<()> {
/// let backtester = Backtester::with_defaults(MemoryStore::new());
/// let config = BacktestConfig::new(
///     Date::from_ymd_opt(2024, 1, 1).unwrap(),
///     Date::from_ymd_opt(2024, 3, 31).unwrap(),
/// );
///
/// let results = backtester.run(&config).await?;
/// // An empty store scores nothing, so every period is skipped.
/// assert_eq!(results.outcomes.len(), 3);
/// assert!(results.period_results.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Backtester<S> {
    source: S,
    settings: EngineSettings,
    scores: PointInTimeProvider,
    prices: PriceBook,
}

impl<S: DataSource> Backtester<S> {
    /// Create a backtester over `source`.
    pub fn new(source: S, settings: EngineSettings) -> Self {
        let scorer = ReducedScorer::new(settings.scoring.clone());
        Self {
            source,
            settings,
            scores: PointInTimeProvider::new(scorer),
            prices: PriceBook::new(),
        }
    }

    /// Create a backtester with default settings.
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, EngineSettings::default())
    }

    /// The data source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The engine settings.
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The score provider and its cache.
    pub const fn scores(&self) -> &PointInTimeProvider {
        &self.scores
    }

    /// The price cache.
    pub const fn prices(&self) -> &PriceBook {
        &self.prices
    }

    /// Run a backtest.
    ///
    /// # Errors
    ///
    /// Only configuration problems are returned, before any period runs.
    /// Data problems are recorded per period in
    /// [`BacktestResults::outcomes`].
    pub async fn run(&self, config: &BacktestConfig) -> Result<BacktestResults> {
        config.validate()?;
        self.settings.validate()?;
        let builder = DecileBuilder::with_buckets(self.settings.buckets, self.settings.weighting)?;
        let periods = generate_periods(
            config.start_date,
            config.end_date,
            config.rebalance_frequency,
        )?;

        self.scores.clear();
        self.prices.clear();

        info!(
            start = %config.start_date,
            end = %config.end_date,
            frequency = %config.rebalance_frequency,
            universe = %config.universe.name,
            periods = periods.len(),
            "starting backtest"
        );

        let mut previous: HashMap<usize, Vec<Ticker>> = HashMap::new();
        let mut rows = Vec::new();
        let mut outcomes = Vec::with_capacity(periods.len());

        for period in periods {
            let outcome = match self.run_period(config, builder, period, &previous).await {
                Ok(PeriodRun::Completed {
                    scored,
                    rows: period_rows,
                }) => {
                    for row in &period_rows {
                        previous.insert(row.decile, row.holdings.clone());
                    }
                    let buckets = period_rows.len();
                    rows.extend(period_rows);
                    debug!(%period, scored, buckets, "period complete");
                    PeriodOutcome::Completed {
                        period,
                        scored,
                        buckets,
                    }
                }
                Ok(PeriodRun::Skipped(reason)) => {
                    warn!(%period, %reason, "skipping period");
                    PeriodOutcome::Skipped { period, reason }
                }
                Err(e) => {
                    error!(%period, error = %e, "period failed");
                    PeriodOutcome::Failed {
                        period,
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let results = aggregate(config, &self.settings, rows, outcomes);
        info!(
            completed = results.completed_periods(),
            rows = results.period_results.len(),
            spread = results.top_bottom_spread,
            hit_rate = results.hit_rate,
            monotonicity = results.monotonicity_score,
            "backtest complete"
        );
        Ok(results)
    }

    async fn run_period(
        &self,
        config: &BacktestConfig,
        builder: DecileBuilder,
        period: Period,
        previous: &HashMap<usize, Vec<Ticker>>,
    ) -> Result<PeriodRun> {
        let as_of = period.start;
        let concurrency = self.settings.max_concurrency;

        let universe = self.source.universe(as_of, &config.universe).await?;
        if universe.is_empty() {
            return Ok(PeriodRun::Skipped("empty universe".to_string()));
        }

        let snapshot = self
            .scores
            .snapshot(&self.source, &universe, as_of, concurrency)
            .await;
        if snapshot.is_empty() {
            return Ok(PeriodRun::Skipped(format!(
                "no scores for {} tickers",
                universe.len()
            )));
        }

        let candidates = self.candidates(&snapshot).await;
        let portfolios = if self.settings.sector_neutral {
            SectorNeutralBuilder::new(builder).build(&candidates)
        } else {
            builder.build(&candidates)
        };

        let tickers = snapshot.tickers();
        let returns = self
            .prices
            .period_returns(&self.source, &tickers, period, concurrency)
            .await;
        let by_ticker: HashMap<Ticker, Option<f64>> = tickers.into_iter().zip(returns).collect();
        let lookup = |ticker: &str| by_ticker.get(ticker).copied().flatten();

        let benchmark_return = self
            .prices
            .period_return(&self.source, &config.benchmark, period)
            .await
            .unwrap_or(0.0);
        let costs = config.costs();

        let rows = portfolios
            .iter()
            .map(|portfolio| {
                let members = weighted_members(portfolio, lookup);
                let period_return =
                    basket_return(&members, self.settings.weighted_returns, costs);
                let holdings = portfolio.tickers();
                let prior = previous.get(&portfolio.bucket).map_or(&[][..], Vec::as_slice);
                PeriodResult {
                    period_start: period.start,
                    period_end: period.end,
                    decile: portfolio.bucket,
                    num_holdings: holdings.len(),
                    turnover: turnover(prior, &holdings),
                    holdings,
                    period_return,
                    benchmark_return,
                    excess_return: period_return - benchmark_return,
                    avg_score: portfolio.average_score().unwrap_or(0.0),
                    sector_returns: sector_returns(portfolio, lookup),
                }
            })
            .collect();

        Ok(PeriodRun::Completed {
            scored: snapshot.len(),
            rows,
        })
    }

    /// Attach market caps and sectors to the scored names.
    async fn candidates(&self, snapshot: &ScoreSnapshot) -> Vec<Candidate> {
        let as_of = snapshot.as_of;
        let profiles: Vec<_> = stream::iter(snapshot.iter())
            .map(|(ticker, _)| async move {
                match self.source.profile(ticker, as_of).await {
                    Ok(profile) => profile.unwrap_or_default(),
                    Err(e) => {
                        debug!(ticker, %as_of, error = %e, "profile lookup failed");
                        Default::default()
                    }
                }
            })
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        snapshot
            .iter()
            .zip(profiles)
            .map(|((ticker, score), profile)| {
                Candidate::new(ticker, score)
                    .with_market_cap(profile.market_cap)
                    .with_sector(profile.sector)
            })
            .collect()
    }
}

/// Gross mean return of the holdings in each known sector.
fn sector_returns(
    portfolio: &Portfolio,
    lookup: impl Fn(&str) -> Option<f64>,
) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for holding in &portfolio.holdings {
        let (Some(sector), Some(r)) = (&holding.sector, lookup(&holding.ticker)) else {
            continue;
        };
        let slot = sums.entry(sector.clone()).or_insert((0.0, 0));
        slot.0 += r;
        slot.1 += 1;
    }
    sums.into_iter()
        .map(|(sector, (sum, n))| (sector, sum / n as f64))
        .collect()
}
