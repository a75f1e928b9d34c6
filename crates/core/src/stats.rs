//! Accuracy statistics for verified predictions.
//!
//! Provides the [`AccuracyStats`] summary used for every grouping, plus the
//! Wilson interval and binomial test that qualify how much a given hit rate
//! can be trusted.

use serde::{Deserialize, Serialize};

/// Hit-rate summary for one grouping key.
///
/// `accuracy` is a percentage in `[0, 100]` and is `0` when `total == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyStats {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Wilson score 95% CI lower bound, in percent.
    #[serde(default)]
    pub wilson_lower: f64,
    /// Wilson score 95% CI upper bound, in percent.
    #[serde(default)]
    pub wilson_upper: f64,
    /// Two-tailed p-value against a coin flip (H0: p = 0.5).
    #[serde(default = "default_p_value")]
    pub p_value: f64,
}

const fn default_p_value() -> f64 {
    1.0
}

impl Default for AccuracyStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl AccuracyStats {
    /// Builds stats from raw counts.
    #[must_use]
    pub fn from_counts(correct: usize, total: usize) -> Self {
        if total == 0 {
            return Self::empty();
        }
        let correct = correct.min(total);
        let (lower, upper) = wilson_ci(correct, total, 1.96);

        Self {
            total,
            correct,
            accuracy: correct as f64 / total as f64 * 100.0,
            wilson_lower: lower * 100.0,
            wilson_upper: upper * 100.0,
            p_value: binomial_test(correct, total, 0.5),
        }
    }

    /// Stats for an empty set: zero counts, zero accuracy.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total: 0,
            correct: 0,
            accuracy: 0.0,
            wilson_lower: 0.0,
            wilson_upper: 0.0,
            p_value: 1.0,
        }
    }

    /// Accuracy rounded to one decimal place, as shown in reports.
    #[must_use]
    pub fn accuracy_rounded(&self) -> f64 {
        round_to(self.accuracy, 1)
    }

    #[must_use]
    pub const fn has_samples(&self, min_samples: usize) -> bool {
        self.total >= min_samples
    }

    /// True when the hit rate differs from 50% at alpha = 0.05.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.total > 0 && self.p_value < 0.05
    }
}

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Arithmetic mean, `0.0` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, `0.0` for fewer than two values.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Calculates the Wilson score confidence interval for a proportion.
///
/// # Formula
/// ```text
/// CI = (p + z^2/(2n) +/- z * sqrt(p(1-p)/n + z^2/(4n^2))) / (1 + z^2/n)
/// ```
///
/// # Examples
/// ```
/// use newsalpha_core::stats::wilson_ci;
///
/// let (lower, upper) = wilson_ci(50, 100, 1.96);
/// assert!(lower > 0.39 && lower < 0.41);
/// assert!(upper > 0.59 && upper < 0.61);
/// ```
#[must_use]
pub fn wilson_ci(wins: usize, n: usize, z: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }

    let n_f = n as f64;
    let p = wins as f64 / n_f;
    let z_sq = z * z;

    let denominator = 1.0 + z_sq / n_f;
    let center = p + z_sq / (2.0 * n_f);

    let variance_term = p * (1.0 - p) / n_f;
    let correction_term = z_sq / (4.0 * n_f * n_f);
    let spread = z * (variance_term + correction_term).sqrt();

    let lower = (center - spread) / denominator;
    let upper = (center + spread) / denominator;

    (lower.max(0.0), upper.min(1.0))
}

/// Two-tailed binomial test using the normal approximation with continuity
/// correction.
///
/// # Examples
/// ```
/// use newsalpha_core::stats::binomial_test;
///
/// assert!(binomial_test(55, 100, 0.5) > 0.05);
/// assert!(binomial_test(65, 100, 0.5) < 0.05);
/// ```
#[must_use]
pub fn binomial_test(successes: usize, n: usize, p0: f64) -> f64 {
    if n == 0 {
        return 1.0;
    }

    let n_f = n as f64;
    let k = successes as f64;

    let expected = n_f * p0;
    let std_dev = (n_f * p0 * (1.0 - p0)).sqrt();

    if std_dev < f64::EPSILON {
        if (p0 < f64::EPSILON && successes == 0) || (p0 > 1.0 - f64::EPSILON && successes == n) {
            return 1.0;
        }
        return 0.0;
    }

    let z = (k - expected).abs() - 0.5;
    if z < 0.0 {
        return 1.0;
    }

    2.0 * (1.0 - standard_normal_cdf(z / std_dev))
}

/// Abramowitz and Stegun 26.2.17, accurate to about 1e-5.
fn standard_normal_cdf(x: f64) -> f64 {
    if x < 0.0 {
        return 1.0 - standard_normal_cdf(-x);
    }

    let b1 = 0.319_381_530;
    let b2 = -0.356_563_782;
    let b3 = 1.781_477_937;
    let b4 = -1.821_255_978;
    let b5 = 1.330_274_429;
    let p = 0.231_641_9;

    let t = 1.0 / (1.0 + p * x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let pdf = (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    1.0 - pdf * (b1 * t + b2 * t2 + b3 * t3 + b4 * t4 + b5 * t5)
}
