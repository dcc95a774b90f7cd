//! Statistical utility functions shared by the metrics and aggregation code.
//!
//! All helpers return a neutral value (0 or `None`) instead of NaN when the
//! sample is too small, so callers can compose them without extra guards.

use ndarray::ArrayView1;

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-12;

/// Arithmetic mean, `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use icscore_traits::stats::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(values: &[f64]) -> Option<f64> {
    ArrayView1::from(values).mean()
}

/// Sample variance (N-1 denominator); 0 for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    ArrayView1::from(values).var(1.0)
}

/// Sample standard deviation (N-1 denominator); 0 for fewer than two values.
///
/// # Examples
///
/// ```
/// use icscore_traits::stats::sample_std;
///
/// let std = sample_std(&[0.02, 0.03, 0.01, 0.04]);
/// assert!((std - 0.012_909_944).abs() < 1e-9);
/// assert_eq!(sample_std(&[0.05]), 0.0);
/// ```
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Population covariance of two equally long series; 0 when lengths differ
/// or the series are empty.
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    let (Some(mx), Some(my)) = (mean(x), mean(y)) else {
        return 0.0;
    };
    x.iter()
        .zip(y)
        .map(|(a, b)| (a - mx) * (b - my))
        .sum::<f64>()
        / x.len() as f64
}

/// Population variance (N denominator); 0 for an empty slice.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    ArrayView1::from(values).var(0.0)
}

/// Pearson correlation; 0 when either side has no variance.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    let cov = covariance(x, y);
    let denom = (population_variance(x) * population_variance(y)).sqrt();
    if denom < MIN_STD_THRESHOLD {
        0.0
    } else {
        cov / denom
    }
}

/// Growth factor of compounding a return series: `Π(1 + r)`.
///
/// # Examples
///
/// ```
/// use icscore_traits::stats::growth_factor;
///
/// let g = growth_factor(&[0.10, -0.05, 0.02]);
/// assert!((g - 1.0659).abs() < 1e-12);
/// ```
pub fn growth_factor(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r))
}

/// Standardized central moment of order `k` using the population standard
/// deviation; 0 on zero variance.
pub fn standardized_moment(values: &[f64], k: i32) -> f64 {
    let Some(m) = mean(values) else {
        return 0.0;
    };
    let var = population_variance(values);
    if var.sqrt() < MIN_STD_THRESHOLD {
        return 0.0;
    }
    let central = values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64;
    central / var.powf(k as f64 / 2.0)
}
