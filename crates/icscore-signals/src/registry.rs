//! Registry of the sub-scores that make up the reduced score.
//!
//! This module provides metadata and discovery for every component the
//! fallback scorer combines.

use serde::{Deserialize, Serialize};

/// Sub-score category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    /// Revenue and earnings growth
    Growth,
    /// Valuation multiples
    Value,
    /// Margins and returns on capital
    Profitability,
    /// Price momentum
    Momentum,
}

impl SignalCategory {
    /// Get a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Growth => "Year-over-year revenue and EPS growth",
            Self::Value => "Valuation multiples relative to fair anchors",
            Self::Profitability => "Net margin and return on equity",
            Self::Momentum => "Twelve-month price momentum net of the latest month",
        }
    }
}

/// Metadata about a sub-score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Unique identifier for the sub-score
    pub name: &'static str,

    /// Category classification
    pub category: SignalCategory,

    /// Human-readable description
    pub description: &'static str,

    /// Closing prices needed for a non-neutral value
    pub required_price_points: usize,

    /// Whether the sub-score reads fundamentals
    pub requires_fundamentals: bool,
}

/// Get information about every sub-score of the reduced score.
#[must_use]
pub fn available_signals() -> Vec<SignalInfo> {
    vec![
        SignalInfo {
            name: "growth",
            category: SignalCategory::Growth,
            description: "Revenue growth, averaged with EPS growth when known",
            required_price_points: 0,
            requires_fundamentals: true,
        },
        SignalInfo {
            name: "value",
            category: SignalCategory::Value,
            description: "Mean of mapped P/E, P/S and P/B",
            required_price_points: 0,
            requires_fundamentals: true,
        },
        SignalInfo {
            name: "profitability",
            category: SignalCategory::Profitability,
            description: "Mean of mapped net margin and ROE",
            required_price_points: 0,
            requires_fundamentals: true,
        },
        SignalInfo {
            name: "momentum",
            category: SignalCategory::Momentum,
            description: "12-month return minus 1-month return",
            required_price_points: 252,
            requires_fundamentals: false,
        },
    ]
}

/// Get information about a specific sub-score by name.
#[must_use]
pub fn get_signal_info(name: &str) -> Option<SignalInfo> {
    available_signals().into_iter().find(|s| s.name == name)
}
