//! Drawdown analysis.
//!
//! All functions compound a return series from a starting value of 1.0,
//! which also serves as the initial peak: a loss in the very first period is
//! already a drawdown.

use icscore_traits::{Date, IcScoreError, Result};
use serde::{Deserialize, Serialize};

/// One peak-to-trough episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownInfo {
    /// Date of the peak the episode fell from
    pub start_date: Date,
    /// Date of the lowest value
    pub trough_date: Date,
    /// Date the previous peak was exceeded; `None` while unrecovered
    pub end_date: Option<Date>,
    /// Cumulative value at the peak
    pub peak_value: f64,
    /// Cumulative value at the trough
    pub trough_value: f64,
    /// `(peak - trough) / peak`
    pub drawdown: f64,
    /// Calendar days from peak to trough
    pub duration_days: i64,
    /// Calendar days from trough to recovery
    pub recovery_days: Option<i64>,
    /// Whether a new peak was reached
    pub recovered: bool,
}

/// Drawdown from the running peak after each period.
///
/// # Examples
///
/// ```
/// use icscore_eval::drawdown_series;
///
/// let dd = drawdown_series(&[0.10, -0.20, 0.05]);
/// assert_eq!(dd[0], 0.0);
/// assert!((dd[1] - 0.2).abs() < 1e-12);
/// ```
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut peak = 1.0_f64;
    let mut value = 1.0_f64;
    returns
        .iter()
        .map(|r| {
            value *= 1.0 + r;
            peak = peak.max(value);
            if peak > 0.0 { (peak - value) / peak } else { 0.0 }
        })
        .collect()
}

/// Largest drawdown of a return series, as a positive fraction.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut value = 1.0_f64;
    let mut max_dd = 0.0_f64;
    for r in returns {
        value *= 1.0 + r;
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }
    max_dd
}

/// Mean of the per-period drawdowns; 0 for an empty series.
pub fn average_drawdown(returns: &[f64]) -> f64 {
    let series = drawdown_series(returns);
    if series.is_empty() {
        0.0
    } else {
        series.iter().sum::<f64>() / series.len() as f64
    }
}

/// Longest run of consecutive periods spent below the running peak.
pub fn max_drawdown_duration(returns: &[f64]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for dd in drawdown_series(returns) {
        if dd > 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Walk a dated return series and record every drawdown episode.
///
/// A value above the running peak closes the open episode as recovered. A
/// value below it opens an episode (dated from the last peak) or deepens the
/// open one. A value equal to the peak changes nothing. An episode still
/// open at the end is returned unrecovered, without an end date.
///
/// # Errors
///
/// Returns [`IcScoreError::InvalidData`] when `returns` and `dates` differ in
/// length.
pub fn analyze_drawdowns(returns: &[f64], dates: &[Date]) -> Result<Vec<DrawdownInfo>> {
    if returns.len() != dates.len() {
        return Err(IcScoreError::InvalidData(format!(
            "{} returns but {} dates",
            returns.len(),
            dates.len()
        )));
    }
    let Some(&first) = dates.first() else {
        return Ok(Vec::new());
    };

    let mut episodes = Vec::new();
    let mut peak = 1.0_f64;
    let mut peak_date = first;
    let mut value = 1.0_f64;
    let mut open: Option<DrawdownInfo> = None;

    for (r, &date) in returns.iter().zip(dates) {
        value *= 1.0 + r;

        if value > peak {
            if let Some(mut episode) = open.take() {
                episode.end_date = Some(date);
                episode.recovered = true;
                episode.recovery_days = Some((date - episode.trough_date).num_days());
                episodes.push(episode);
            }
            peak = value;
            peak_date = date;
        } else if value < peak {
            let depth = (peak - value) / peak;
            match open.as_mut() {
                None => {
                    open = Some(DrawdownInfo {
                        start_date: peak_date,
                        trough_date: date,
                        end_date: None,
                        peak_value: peak,
                        trough_value: value,
                        drawdown: depth,
                        duration_days: (date - peak_date).num_days(),
                        recovery_days: None,
                        recovered: false,
                    });
                }
                Some(episode) if value < episode.trough_value => {
                    episode.trough_date = date;
                    episode.trough_value = value;
                    episode.drawdown = depth;
                    episode.duration_days = (date - episode.start_date).num_days();
                }
                Some(_) => {}
            }
        }
    }

    episodes.extend(open);
    Ok(episodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    /// Returns whose cumulative path is 1.0, 1.1, 0.9, 1.05.
    fn path() -> Vec<f64> {
        vec![0.0, 0.1, 0.9 / 1.1 - 1.0, 1.05 / 0.9 - 1.0]
    }

    #[test]
    fn test_max_drawdown_from_peak() {
        assert_relative_eq!(max_drawdown(&path()), 0.2 / 1.1, epsilon = 1e-12);
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[0.01, 0.02]), 0.0);
    }

    #[test]
    fn test_first_period_loss_counts() {
        assert_relative_eq!(max_drawdown(&[-0.1]), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_unrecovered_episode() {
        let dates = vec![d(2023, 1, 1), d(2023, 2, 1), d(2023, 3, 1), d(2023, 4, 1)];
        let episodes = analyze_drawdowns(&path(), &dates).unwrap();
        assert_eq!(episodes.len(), 1);
        let e = &episodes[0];
        assert_eq!(e.start_date, d(2023, 2, 1));
        assert_eq!(e.trough_date, d(2023, 3, 1));
        assert_eq!(e.end_date, None);
        assert_eq!(e.recovery_days, None);
        assert!(!e.recovered);
        assert_eq!(e.duration_days, 28);
        assert_relative_eq!(e.drawdown, 0.2 / 1.1, epsilon = 1e-12);
    }

    #[test]
    fn test_recovered_then_new_episode() {
        let returns = vec![0.1, -0.1, -0.1, 0.3, -0.05];
        let dates: Vec<Date> = (1..=5).map(|m| d(2023, m, 1)).collect();
        let episodes = analyze_drawdowns(&returns, &dates).unwrap();
        assert_eq!(episodes.len(), 2);

        let first = &episodes[0];
        assert!(first.recovered);
        assert_eq!(first.start_date, d(2023, 1, 1));
        assert_eq!(first.trough_date, d(2023, 3, 1));
        assert_eq!(first.end_date, Some(d(2023, 4, 1)));
        assert_eq!(first.recovery_days, Some(31));
        assert_eq!(first.duration_days, 59);
        assert_relative_eq!(first.drawdown, 0.19, epsilon = 1e-12);

        let second = &episodes[1];
        assert!(!second.recovered);
        assert_eq!(second.start_date, d(2023, 4, 1));
    }

    #[test]
    fn test_equal_to_peak_is_not_recovery() {
        let returns = vec![-0.5, 1.0];
        let dates = vec![d(2023, 1, 1), d(2023, 2, 1)];
        let episodes = analyze_drawdowns(&returns, &dates).unwrap();
        assert_eq!(episodes.len(), 1);
        assert!(!episodes[0].recovered);
    }

    #[test]
    fn test_length_mismatch() {
        let err = analyze_drawdowns(&[0.1, 0.2], &[d(2023, 1, 1)]).unwrap_err();
        assert!(matches!(err, IcScoreError::InvalidData(_)));
        assert!(analyze_drawdowns(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_average_and_duration() {
        let returns = vec![0.1, -0.1, -0.1, 0.3, -0.05];
        assert_eq!(max_drawdown_duration(&returns), 2);
        let series = drawdown_series(&returns);
        assert_relative_eq!(
            average_drawdown(&returns),
            series.iter().sum::<f64>() / 5.0,
            epsilon = 1e-12
        );
        assert_eq!(average_drawdown(&[]), 0.0);
    }
}
