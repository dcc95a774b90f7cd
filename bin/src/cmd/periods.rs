//! Periods command implementation.

use anyhow::Result;
use icscore_backtest::generate_periods;
use icscore_traits::RebalanceFrequency;

use crate::data;

/// Print the rebalance periods between two dates.
pub(crate) fn list_periods(start: &str, end: &str, frequency: &str) -> Result<()> {
    let start = data::parse_date(start)?;
    let end = data::parse_date(end)?;
    let frequency: RebalanceFrequency = frequency.parse()?;

    let periods = generate_periods(start, end, frequency)?;

    println!("{} {} periods from {} to {}\n", periods.len(), frequency, start, end);
    println!("{:>4}  {:<10}  {:<10}  {:>5}", "#", "Start", "End", "Days");
    for (i, period) in periods.iter().enumerate() {
        println!(
            "{:>4}  {:<10}  {:<10}  {:>5}",
            i + 1,
            period.start.to_string(),
            period.end.to_string(),
            period.days()
        );
    }
    Ok(())
}
