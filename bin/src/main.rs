//! icscore CLI binary.
//!
//! Provides a command-line interface for point-in-time IC Score backtests.

mod cmd;
mod data;
mod logging;

use std::{path::PathBuf, process};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use cmd::backtest::{EngineOverrides, run_backtest};
use cmd::periods::list_periods;
use cmd::signals::list_signals;
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "icscore")]
#[command(about = "Point-in-time decile backtests of IC Scores", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable tables
    Text,
    /// JSON on stdout
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over a data snapshot
    Backtest {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Data snapshot with companies, prices, scores and fundamentals (JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Print the detailed report instead of the summary
        #[arg(long)]
        detailed: bool,

        /// Maximum concurrent data-source lookups
        #[arg(long)]
        concurrency: Option<usize>,

        /// Number of buckets (10 for deciles, 5 for quintiles)
        #[arg(long)]
        buckets: Option<usize>,

        /// Weighting scheme (equal, market-cap, score, inverse-vol)
        #[arg(long)]
        weighting: Option<String>,

        /// Form buckets within each sector
        #[arg(long)]
        sector_neutral: bool,

        /// Compute bucket returns with holding weights
        #[arg(long)]
        weighted_returns: bool,
    },

    /// List the components of the reduced fallback score
    Signals {
        /// Run configuration whose scoring weights to show (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Filter by component name or category
        #[arg(long)]
        category: Option<String>,

        /// Show descriptions and data requirements
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the rebalance periods of a date range
    Periods {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Rebalance frequency (daily, weekly, monthly, quarterly)
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(&cli.log_level, format)?;

    match cli.command {
        Commands::Backtest {
            config,
            data,
            format,
            detailed,
            concurrency,
            buckets,
            weighting,
            sector_neutral,
            weighted_returns,
        } => {
            let overrides = EngineOverrides {
                concurrency,
                buckets,
                weighting,
                sector_neutral,
                weighted_returns,
            };
            run_backtest(&config, &data, overrides, format == OutputFormat::Json, detailed)
                .await?;
        }
        Commands::Signals {
            config,
            category,
            verbose,
        } => {
            list_signals(config.as_deref(), category.as_deref(), verbose)?;
        }
        Commands::Periods {
            start,
            end,
            frequency,
        } => {
            list_periods(&start, &end, &frequency)?;
        }
    }

    Ok(())
}
