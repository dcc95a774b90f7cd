//! Signal listing command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use icscore_signals::{FactorWeights, SignalInfo, registry::available_signals};

use crate::data;

/// One line of the listing: a sub-score and its share of the composite.
#[derive(Debug)]
pub(crate) struct SignalLine {
    pub(crate) info: SignalInfo,
    pub(crate) weight: f64,
    pub(crate) share: f64,
}

/// Sub-scores of the reduced score under the given weights, optionally
/// filtered by a case-insensitive name or category fragment.
pub(crate) fn signal_lines(weights: &FactorWeights, filter: Option<&str>) -> Vec<SignalLine> {
    let filter = filter.map(str::to_lowercase);
    available_signals()
        .into_iter()
        .filter(|info| match &filter {
            Some(f) => {
                info.name.contains(f.as_str())
                    || format!("{:?}", info.category).to_lowercase().contains(f.as_str())
            }
            None => true,
        })
        .map(|info| SignalLine {
            weight: weights.of(info.category),
            share: weights.share(info.category),
            info,
        })
        .collect()
}

/// List the reduced-score components, with weights from a run file when given.
pub(crate) fn list_signals(
    config_path: Option<&Path>,
    category: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let weights = match config_path {
        Some(path) => {
            data::load_run(path)
                .with_context(|| format!("loading run config {}", path.display()))?
                .engine
                .scoring
                .weights
        }
        None => FactorWeights::default(),
    };

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Reduced Score Components                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let lines = signal_lines(&weights, category);
    if lines.is_empty() {
        println!("No component matches the filter.\n");
        return Ok(());
    }

    println!("{:<15} {:>8} {:>8}", "Component", "Weight", "Share");
    println!("{}", "-".repeat(60));
    for line in &lines {
        println!(
            "{:<15} {:>8.2} {:>7.1}%",
            line.info.name,
            line.weight,
            line.share * 100.0
        );
        if verbose {
            println!("    {}", line.info.description);
            println!("    category: {}", line.info.category.description());
            let mut needs = Vec::new();
            if line.info.requires_fundamentals {
                needs.push("fundamentals".to_string());
            }
            if line.info.required_price_points > 0 {
                needs.push(format!("{} closes", line.info.required_price_points));
            }
            println!("    needs: {}", needs.join(", "));
        }
    }
    println!();

    if !verbose {
        println!("Use --verbose for descriptions and data requirements.\n");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_all_components_listed() {
        let lines = signal_lines(&FactorWeights::default(), None);
        assert_eq!(lines.len(), 4);
        let total: f64 = lines.iter().map(|l| l.share).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert_eq!(lines[3].info.name, "momentum");
        assert_eq!(lines[3].weight, 0.10);
    }

    #[test]
    fn test_filter_by_name_or_category() {
        let weights = FactorWeights::default();
        let lines = signal_lines(&weights, Some("Profit"));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].info.name, "profitability");
        assert!(signal_lines(&weights, Some("sentiment")).is_empty());
    }

    #[test]
    fn test_custom_weights() {
        let weights = FactorWeights {
            growth: 0.0,
            value: 1.0,
            profitability: 0.0,
            momentum: 1.0,
        };
        let lines = signal_lines(&weights, None);
        assert_eq!(lines[0].share, 0.0);
        assert_relative_eq!(lines[1].share, 0.5, epsilon = 1e-12);
    }
}
