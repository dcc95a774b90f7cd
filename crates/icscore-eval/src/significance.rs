//! Significance tests comparing the top and bottom score buckets.
//!
//! Three independent views of "is the spread real":
//! - Welch's t-test on the two return samples
//! - Wilcoxon signed-rank test on returns paired by period
//! - Binomial test on the hit rate against a coin flip

use icscore_traits::stats::{mean, sample_variance};
use serde::{Deserialize, Serialize};
use statrs::{
    distribution::{Binomial, ContinuousCDF, DiscreteCDF, StudentsT},
    function::erf::erf,
};

/// Fewest paired periods for which the signed-rank test is reported.
pub const MIN_WILCOXON_PAIRS: usize = 12;

/// Largest sample for which the signed-rank null distribution is enumerated.
pub const EXACT_WILCOXON_MAX_N: usize = 20;

/// Standard normal cumulative distribution function.
///
/// # Examples
///
/// ```
/// use icscore_eval::significance::normal_cdf;
///
/// assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
/// assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
/// ```
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Result of Welch's two-sample t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// `(m1 - m2) / √(v1/n1 + v2/n2)`
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
    /// Two-sided p-value from the normal approximation
    pub p_value: f64,
    /// Two-sided p-value from Student's t with Welch degrees of freedom
    pub exact_p_value: f64,
    /// `p_value < 0.05`
    pub significant_5pct: bool,
    /// `p_value < 0.01`
    pub significant_1pct: bool,
}

impl TTestResult {
    fn neutral() -> Self {
        Self {
            t_statistic: 0.0,
            degrees_of_freedom: 0.0,
            p_value: 1.0,
            exact_p_value: 1.0,
            significant_5pct: false,
            significant_1pct: false,
        }
    }
}

/// Welch's t-test for a difference in means.
///
/// Fewer than two observations on either side, or a zero standard error,
/// gives `t = 0` and `p = 1`. Significance flags use the normal-approximation
/// p-value; the Student-t p-value is reported alongside.
pub fn welch_t_test(sample1: &[f64], sample2: &[f64]) -> TTestResult {
    let (n1, n2) = (sample1.len(), sample2.len());
    if n1 < 2 || n2 < 2 {
        return TTestResult::neutral();
    }
    let (Some(m1), Some(m2)) = (mean(sample1), mean(sample2)) else {
        return TTestResult::neutral();
    };
    let a = sample_variance(sample1) / n1 as f64;
    let b = sample_variance(sample2) / n2 as f64;
    let se = (a + b).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return TTestResult::neutral();
    }

    let t = (m1 - m2) / se;
    let df = (a + b).powi(2) / (a.powi(2) / (n1 - 1) as f64 + b.powi(2) / (n2 - 1) as f64);
    let p_value = (2.0 * (1.0 - normal_cdf(t.abs()))).clamp(0.0, 1.0);
    let exact_p_value = StudentsT::new(0.0, 1.0, df)
        .map(|dist| (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
        .unwrap_or(p_value);

    TTestResult {
        t_statistic: t,
        degrees_of_freedom: df,
        p_value,
        exact_p_value,
        significant_5pct: p_value < 0.05,
        significant_1pct: p_value < 0.01,
    }
}

/// Result of the Wilcoxon signed-rank test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilcoxonResult {
    /// `min(W+, W-)`
    pub w_statistic: f64,
    /// Rank sum of positive differences
    pub w_plus: f64,
    /// Rank sum of negative differences
    pub w_minus: f64,
    /// Non-zero differences ranked
    pub n: usize,
    /// Two-sided p-value
    pub p_value: f64,
    /// Whether the p-value comes from the exact null distribution
    pub exact: bool,
    /// `p_value < 0.05`
    pub significant_5pct: bool,
}

/// Average ranks (1-based) of `values`, ties sharing the mean of their ranks.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j share ranks i+1..=j.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &k in &order[i..j] {
            ranks[k] = avg;
        }
        i = j;
    }
    ranks
}

/// `P(W+ <= w)` under the null, enumerated over doubled ranks so that
/// half-integer tie ranks stay integral.
fn exact_lower_tail(ranks: &[f64], w: f64) -> f64 {
    let doubled: Vec<usize> = ranks.iter().map(|r| (r * 2.0).round() as usize).collect();
    let max_sum: usize = doubled.iter().sum();
    let mut counts = vec![0.0_f64; max_sum + 1];
    counts[0] = 1.0;
    let mut reach = 0;
    for &r in &doubled {
        for s in (0..=reach).rev() {
            if counts[s] > 0.0 {
                counts[s + r] += counts[s];
            }
        }
        reach += r;
    }
    let total = 2.0_f64.powi(ranks.len() as i32);
    let limit = (w * 2.0).round() as usize;
    counts.iter().take(limit + 1).sum::<f64>() / total
}

/// Wilcoxon signed-rank test on `(top, bottom)` pairs.
///
/// Zero differences are discarded. `None` below [`MIN_WILCOXON_PAIRS`]
/// pairs. Up to [`EXACT_WILCOXON_MAX_N`] non-zero differences the p-value is
/// exact; above it the normal approximation with mean `n(n+1)/4` and
/// variance `n(n+1)(2n+1)/24` is used.
pub fn wilcoxon_signed_rank(pairs: &[(f64, f64)]) -> Option<WilcoxonResult> {
    if pairs.len() < MIN_WILCOXON_PAIRS {
        return None;
    }

    let diffs: Vec<f64> = pairs
        .iter()
        .map(|(top, bottom)| top - bottom)
        .filter(|d| *d != 0.0)
        .collect();
    if diffs.is_empty() {
        return Some(WilcoxonResult {
            w_statistic: 0.0,
            w_plus: 0.0,
            w_minus: 0.0,
            n: 0,
            p_value: 1.0,
            exact: true,
            significant_5pct: false,
        });
    }

    let abs: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let ranks = average_ranks(&abs);
    let w_plus: f64 = diffs.iter().zip(&ranks).filter(|(d, _)| **d > 0.0).map(|(_, r)| r).sum();
    let w_minus: f64 = diffs.iter().zip(&ranks).filter(|(d, _)| **d < 0.0).map(|(_, r)| r).sum();
    let w = w_plus.min(w_minus);
    let n = diffs.len();

    let (p_value, exact) = if n <= EXACT_WILCOXON_MAX_N {
        ((2.0 * exact_lower_tail(&ranks, w)).min(1.0), true)
    } else {
        let nf = n as f64;
        let mean_w = nf * (nf + 1.0) / 4.0;
        let std_w = (nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0).sqrt();
        let z = if std_w > 0.0 { (w - mean_w) / std_w } else { 0.0 };
        ((2.0 * normal_cdf(-z.abs())).min(1.0), false)
    };

    Some(WilcoxonResult {
        w_statistic: w,
        w_plus,
        w_minus,
        n,
        p_value,
        exact,
        significant_5pct: p_value < 0.05,
    })
}

/// Result of the binomial hit-rate test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinomialTestResult {
    /// Paired periods
    pub n_periods: usize,
    /// Periods where the top bucket beat the bottom one
    pub n_hits: usize,
    /// `n_hits / n_periods`
    pub hit_rate: f64,
    /// Hit rate under the null
    pub expected_if_random: f64,
    /// `hit_rate - 0.5`
    pub excess_vs_random: f64,
    /// Exact two-sided p-value against p = 0.5
    pub p_value: f64,
}

/// Binomial test of `n_hits` successes in `n_periods` fair trials.
///
/// # Examples
///
/// ```
/// use icscore_eval::significance::binomial_test;
///
/// let test = binomial_test(2, 3);
/// assert!((test.hit_rate - 2.0 / 3.0).abs() < 1e-12);
/// assert!((test.p_value - 1.0).abs() < 1e-12);
/// ```
pub fn binomial_test(n_hits: usize, n_periods: usize) -> BinomialTestResult {
    let n_hits = n_hits.min(n_periods);
    let hit_rate = if n_periods == 0 {
        0.0
    } else {
        n_hits as f64 / n_periods as f64
    };

    let p_value = Binomial::new(0.5, n_periods as u64)
        .map(|dist| {
            let k = n_hits as u64;
            let lower = dist.cdf(k);
            let upper = if k == 0 { 1.0 } else { 1.0 - dist.cdf(k - 1) };
            (2.0 * lower.min(upper)).min(1.0)
        })
        .unwrap_or(1.0);

    BinomialTestResult {
        n_periods,
        n_hits,
        hit_rate,
        expected_if_random: 0.5,
        excess_vs_random: hit_rate - 0.5,
        p_value: if n_periods == 0 { 1.0 } else { p_value },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_t_test_small_samples() {
        let r = welch_t_test(&[0.1], &[0.0, 0.1]);
        assert_eq!(r.t_statistic, 0.0);
        assert_eq!(r.p_value, 1.0);

        let flat = welch_t_test(&[0.1, 0.1], &[0.1, 0.1]);
        assert_eq!(flat.p_value, 1.0);
        assert!(!flat.significant_5pct);
    }

    #[test]
    fn test_t_test_values() {
        let top = [0.05, 0.04, 0.06, 0.05, 0.07, 0.03];
        let bottom = [0.00, 0.01, -0.01, 0.02, 0.00, -0.02];
        let r = welch_t_test(&top, &bottom);

        let a = sample_variance(&top) / 6.0;
        let b = sample_variance(&bottom) / 6.0;
        let expected_t = (0.05 - 0.0) / (a + b).sqrt();
        assert_relative_eq!(r.t_statistic, expected_t, epsilon = 1e-9);
        assert!(r.degrees_of_freedom > 5.0 && r.degrees_of_freedom < 10.0 + 1e-9);
        assert!(r.significant_1pct);
        // Student's t has fatter tails than the normal.
        assert!(r.exact_p_value > r.p_value);
        assert!(r.exact_p_value < 0.01);
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[3.0, 1.0, 2.0, 2.0]), vec![4.0, 1.0, 2.5, 2.5]);
    }

    #[test]
    fn test_wilcoxon_needs_twelve_pairs() {
        let pairs: Vec<(f64, f64)> = (0..11).map(|i| (i as f64, 0.0)).collect();
        assert!(wilcoxon_signed_rank(&pairs).is_none());
    }

    #[test]
    fn test_wilcoxon_exact_all_positive() {
        let pairs: Vec<(f64, f64)> = (1..=12).map(|i| (0.01 * i as f64, 0.0)).collect();
        let r = wilcoxon_signed_rank(&pairs).unwrap();
        assert!(r.exact);
        assert_eq!(r.w_minus, 0.0);
        assert_eq!(r.w_plus, 78.0);
        assert_eq!(r.w_statistic, 0.0);
        // Only the all-positive sign pattern gives W- = 0.
        assert_relative_eq!(r.p_value, 2.0 / 4096.0, epsilon = 1e-15);
        assert!(r.significant_5pct);
    }

    #[test]
    fn test_wilcoxon_drops_zero_differences() {
        let mut pairs: Vec<(f64, f64)> = (1..=12).map(|i| (0.01 * i as f64, 0.0)).collect();
        pairs.push((0.05, 0.05));
        let r = wilcoxon_signed_rank(&pairs).unwrap();
        assert_eq!(r.n, 12);

        let ties: Vec<(f64, f64)> = (0..12).map(|_| (0.02, 0.02)).collect();
        let r = wilcoxon_signed_rank(&ties).unwrap();
        assert_eq!(r.n, 0);
        assert_eq!(r.p_value, 1.0);
    }

    #[test]
    fn test_wilcoxon_normal_approximation() {
        // Alternating signs with growing magnitude: balanced rank sums.
        let pairs: Vec<(f64, f64)> = (1..=30)
            .map(|i| {
                let d = 0.001 * i as f64;
                if i % 2 == 0 { (d, 0.0) } else { (0.0, d) }
            })
            .collect();
        let r = wilcoxon_signed_rank(&pairs).unwrap();
        assert!(!r.exact);
        assert_eq!(r.n, 30);
        assert_eq!(r.w_plus + r.w_minus, 465.0);
        assert!(r.p_value > 0.5);
    }

    #[test]
    fn test_exact_tail_is_symmetric() {
        let ranks: Vec<f64> = (1..=5).map(f64::from).collect();
        // W+ ranges over 0..=15 symmetrically around 7.5.
        assert_relative_eq!(exact_lower_tail(&ranks, 7.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(exact_lower_tail(&ranks, 15.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_binomial() {
        let r = binomial_test(10, 10);
        assert_relative_eq!(r.p_value, 2.0 / 1024.0, epsilon = 1e-12);
        assert_relative_eq!(r.excess_vs_random, 0.5);

        let even = binomial_test(5, 10);
        assert_relative_eq!(even.p_value, 1.0, epsilon = 1e-12);

        let none = binomial_test(0, 0);
        assert_eq!(none.hit_rate, 0.0);
        assert_eq!(none.p_value, 1.0);
    }

    #[test]
    fn test_normal_cdf_tails() {
        assert_relative_eq!(normal_cdf(-1.0) + normal_cdf(1.0), 1.0, epsilon = 1e-12);
    }
}
