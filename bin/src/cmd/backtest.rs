//! Backtest command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use icscore_backtest::{
    BacktestResults, BacktestSummary, Backtester, EngineSettings, PeriodOutcome, ReportGenerator,
    StatisticalTests,
};
use icscore_portfolio::WeightingScheme;
use tracing::info;

use crate::data;

/// Engine settings given on the command line.
#[derive(Debug, Default)]
pub(crate) struct EngineOverrides {
    pub(crate) concurrency: Option<usize>,
    pub(crate) buckets: Option<usize>,
    pub(crate) weighting: Option<String>,
    pub(crate) sector_neutral: bool,
    pub(crate) weighted_returns: bool,
}

impl EngineOverrides {
    /// Apply the overrides on top of the settings from the run file.
    pub(crate) fn apply(self, mut settings: EngineSettings) -> Result<EngineSettings> {
        if let Some(concurrency) = self.concurrency {
            settings.max_concurrency = concurrency;
        }
        if let Some(buckets) = self.buckets {
            settings.buckets = buckets;
        }
        if let Some(weighting) = self.weighting {
            settings.weighting = weighting.parse::<WeightingScheme>()?;
        }
        settings.sector_neutral |= self.sector_neutral;
        settings.weighted_returns |= self.weighted_returns;
        Ok(settings)
    }
}

/// Run a backtest from a run configuration and a data snapshot.
pub(crate) async fn run_backtest(
    config_path: &Path,
    data_path: &Path,
    overrides: EngineOverrides,
    json: bool,
    detailed: bool,
) -> Result<()> {
    let run = data::load_run(config_path)
        .with_context(|| format!("loading run config {}", config_path.display()))?;
    let settings = overrides.apply(run.engine)?;
    let store = data::load_store(data_path)
        .with_context(|| format!("loading data snapshot {}", data_path.display()))?;
    info!(
        companies = store.companies().count(),
        data = %data_path.display(),
        "loaded data snapshot"
    );

    let report = ReportGenerator::new(settings.risk_free_rate);
    let backtester = Backtester::new(store, settings);
    let results = backtester.run(&run.backtest).await?;

    if json {
        let json = if detailed {
            serde_json::to_string_pretty(&report.generate(&results)?)
        } else {
            serde_json::to_string_pretty(&report.summary(&results))
        }
        .context("JSON serialization error")?;
        println!("{json}");
        return Ok(());
    }

    print_summary(&report.summary(&results));
    if detailed {
        print_tests(&report.statistical_tests(&results));
        print_outcomes(&results);
    }
    Ok(())
}

fn print_summary(summary: &BacktestSummary) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    IC Score Backtest                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Period:    {} to {}", summary.start_date, summary.end_date);
    println!("Frequency: {}", summary.rebalance_frequency);
    println!("Universe:  {}", summary.universe);
    println!("Benchmark: {}", summary.benchmark);
    println!(
        "Periods:   {} completed, {} skipped, {} failed",
        summary.num_periods, summary.skipped_periods, summary.failed_periods
    );
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("BACKTEST RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Key Findings:");
    println!("  Top Bucket CAGR:     {:>10.2}%", summary.top_decile_cagr * 100.0);
    println!("  Bottom Bucket CAGR:  {:>10.2}%", summary.bottom_decile_cagr * 100.0);
    println!("  Spread (CAGR):       {:>10.2}%", summary.spread_cagr * 100.0);
    println!("  Benchmark CAGR:      {:>10.2}%", summary.benchmark_cagr * 100.0);
    println!("  Top vs Benchmark:    {:>10.2}%", summary.top_vs_benchmark * 100.0);
    println!();

    println!("Signal Quality:");
    println!("  Hit Rate:            {:>10.2}%", summary.hit_rate * 100.0);
    println!("  Monotonicity:        {:>10.3}", summary.monotonicity_score);
    println!("  Information Ratio:   {:>10.3}", summary.information_ratio);
    println!();

    println!("Risk:");
    println!("  Top Sharpe:          {:>10.2}", summary.top_decile_sharpe);
    println!("  Top Max Drawdown:    {:>10.2}%", summary.top_decile_max_dd * 100.0);
    println!("  Bottom Sharpe:       {:>10.2}", summary.bottom_decile_sharpe);
    println!("  Bottom Max Drawdown: {:>10.2}%", summary.bottom_decile_max_dd * 100.0);
    println!();

    if summary.decile_performance.is_empty() {
        println!("No bucket produced returns.");
        return;
    }
    println!(
        "{:>6} {:>10} {:>10} {:>10} {:>8} {:>10} {:>9} {:>9}",
        "Bucket", "Total", "CAGR", "Vol", "Sharpe", "Max DD", "Score", "Turnover"
    );
    for p in &summary.decile_performance {
        println!(
            "{:>6} {:>9.2}% {:>9.2}% {:>9.2}% {:>8.2} {:>9.2}% {:>9.1} {:>8.1}%",
            p.decile,
            p.total_return * 100.0,
            p.annualized_return * 100.0,
            p.volatility * 100.0,
            p.sharpe_ratio,
            p.max_drawdown * 100.0,
            p.avg_score,
            p.avg_turnover * 100.0
        );
    }
    println!();
}

fn print_tests(tests: &StatisticalTests) {
    println!("Statistical Tests (top vs bottom):");
    println!(
        "  Welch t:             {:>10.3}  (p = {:.4}, exact p = {:.4})",
        tests.t_test.t_statistic, tests.t_test.p_value, tests.t_test.exact_p_value
    );
    match &tests.wilcoxon {
        Some(w) => println!(
            "  Wilcoxon W:          {:>10.1}  (p = {:.4}, n = {})",
            w.w_statistic, w.p_value, w.n
        ),
        None => println!("  Wilcoxon W:                 N/A  (fewer than 12 paired periods)"),
    }
    println!(
        "  Binomial:            {:>6}/{:<3}  (p = {:.4})",
        tests.binomial.n_hits, tests.binomial.n_periods, tests.binomial.p_value
    );
    println!();
}

fn print_outcomes(results: &BacktestResults) {
    let incomplete: Vec<&PeriodOutcome> =
        results.outcomes.iter().filter(|o| !o.is_completed()).collect();
    if incomplete.is_empty() {
        return;
    }
    println!("Incomplete Periods:");
    for outcome in incomplete {
        match outcome {
            PeriodOutcome::Skipped { period, reason } => {
                println!("  {period}  skipped: {reason}");
            }
            PeriodOutcome::Failed { period, error } => {
                println!("  {period}  failed:  {error}");
            }
            PeriodOutcome::Completed { .. } => {}
        }
    }
    println!();
}
