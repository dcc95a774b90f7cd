//! Rebalance period generation.

use chrono::Days;
use icscore_traits::{Date, IcScoreError, Period, RebalanceFrequency, Result};

/// Split `[start, end]` into contiguous rebalance periods.
///
/// Each period runs from the current date to the day before the next
/// frequency boundary, clamped to `end`. A start in the middle of a month or
/// quarter gives a short first period.
///
/// # Errors
///
/// Returns [`IcScoreError::InvalidConfiguration`] when `start >= end`, and
/// [`IcScoreError::InvalidDate`] if a boundary leaves the calendar.
///
/// # Examples
///
/// ```
/// use icscore_backtest::generate_periods;
/// use icscore_traits::{Date, RebalanceFrequency};
///
/// let start = Date::from_ymd_opt(2023, 1, 15).unwrap();
/// let end = Date::from_ymd_opt(2023, 3, 31).unwrap();
/// let periods = generate_periods(start, end, RebalanceFrequency::Monthly).unwrap();
///
/// assert_eq!(periods.len(), 3);
/// assert_eq!(periods[0].end, Date::from_ymd_opt(2023, 1, 31).unwrap());
/// assert_eq!(periods[2].start, Date::from_ymd_opt(2023, 3, 1).unwrap());
/// ```
pub fn generate_periods(
    start: Date,
    end: Date,
    frequency: RebalanceFrequency,
) -> Result<Vec<Period>> {
    if start >= end {
        return Err(IcScoreError::InvalidConfiguration(format!(
            "period range {start} → {end} is empty"
        )));
    }

    let mut periods = Vec::new();
    let mut current = start;
    while current < end {
        let next = frequency.next_boundary(current)?;
        let last_day = next
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| IcScoreError::InvalidDate(format!("no day before {next}")))?;
        periods.push(Period::new(current, last_day.min(end)));
        current = next;
    }
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_monthly_full_year() {
        let periods = generate_periods(d(2023, 1, 1), d(2023, 12, 31), RebalanceFrequency::Monthly)
            .unwrap();
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0], Period::new(d(2023, 1, 1), d(2023, 1, 31)));
        assert_eq!(periods[1], Period::new(d(2023, 2, 1), d(2023, 2, 28)));
        assert_eq!(periods[11], Period::new(d(2023, 12, 1), d(2023, 12, 31)));
    }

    #[test]
    fn test_periods_are_contiguous() {
        for frequency in [
            RebalanceFrequency::Daily,
            RebalanceFrequency::Weekly,
            RebalanceFrequency::Monthly,
            RebalanceFrequency::Quarterly,
        ] {
            let periods = generate_periods(d(2022, 2, 17), d(2023, 5, 9), frequency).unwrap();
            assert_eq!(periods[0].start, d(2022, 2, 17));
            for pair in periods.windows(2) {
                assert_eq!(pair[0].end + Days::new(1), pair[1].start, "{frequency}");
            }
            let last = periods.last().unwrap();
            assert!(last.end <= d(2023, 5, 9));
            assert!(last.start < d(2023, 5, 9));
        }
    }

    #[test]
    fn test_quarterly_partial_first_and_last() {
        let periods =
            generate_periods(d(2023, 2, 15), d(2023, 8, 15), RebalanceFrequency::Quarterly)
                .unwrap();
        assert_eq!(
            periods,
            vec![
                Period::new(d(2023, 2, 15), d(2023, 3, 31)),
                Period::new(d(2023, 4, 1), d(2023, 6, 30)),
                Period::new(d(2023, 7, 1), d(2023, 8, 15)),
            ]
        );
    }

    #[test]
    fn test_quarterly_year_rollover() {
        let periods = generate_periods(d(2023, 11, 1), d(2024, 2, 1), RebalanceFrequency::Quarterly)
            .unwrap();
        assert_eq!(periods[0], Period::new(d(2023, 11, 1), d(2023, 12, 31)));
        assert_eq!(periods[1], Period::new(d(2024, 1, 1), d(2024, 2, 1)));
    }

    #[test]
    fn test_weekly_and_daily() {
        let weekly =
            generate_periods(d(2024, 1, 1), d(2024, 1, 20), RebalanceFrequency::Weekly).unwrap();
        assert_eq!(weekly.len(), 3);
        assert_eq!(weekly[0].end, d(2024, 1, 7));
        assert_eq!(weekly[2], Period::new(d(2024, 1, 15), d(2024, 1, 20)));

        let daily =
            generate_periods(d(2024, 1, 1), d(2024, 1, 4), RebalanceFrequency::Daily).unwrap();
        assert_eq!(daily.len(), 3);
        assert!(daily.iter().all(|p| p.start == p.end));
    }

    #[test]
    fn test_empty_range_rejected() {
        let err = generate_periods(d(2024, 1, 1), d(2024, 1, 1), RebalanceFrequency::Monthly)
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(generate_periods(d(2024, 2, 1), d(2024, 1, 1), RebalanceFrequency::Daily).is_err());
    }
}
