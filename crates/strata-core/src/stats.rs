//! Statistical utility functions for cross-sectional processing.
//!
//! Standardization, robust clipping and the NaN-aware moments used by the
//! IC estimator and the performance summaries.

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Z-score standardization result containing computed statistics.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeResult {
    /// The computed mean of the input values.
    pub mean: f64,
    /// The computed sample standard deviation (N-1 denominator).
    pub std: f64,
    /// Whether the standardization was applied (false if variance was too low).
    pub applied: bool,
}

/// Standardize a slice of f64 values to z-scores (mean=0, std=1).
///
/// Uses sample standard deviation (N-1 denominator). If the standard deviation
/// is below [`MIN_STD_THRESHOLD`], returns zeros for finite inputs.
///
/// # Edge Cases
///
/// - Empty input: returns empty vector with mean=NaN, std=NaN, applied=false
/// - Constant values: returns zeros with applied=false
/// - NaN values are excluded from mean/std and stay NaN in the output
///
/// # Examples
///
/// ```
/// use strata_core::stats::standardize;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let (standardized, result) = standardize(&values);
///
/// assert!(result.applied);
/// assert!((result.mean - 3.0).abs() < 1e-10);
/// ```
pub fn standardize(values: &[f64]) -> (Vec<f64>, StandardizeResult) {
    let finite_values: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();

    if finite_values.is_empty() {
        return (
            vec![f64::NAN; values.len()],
            StandardizeResult {
                mean: f64::NAN,
                std: f64::NAN,
                applied: false,
            },
        );
    }

    let mean = finite_values.iter().sum::<f64>() / finite_values.len() as f64;
    let std = sample_std(&finite_values);
    let applied = std > MIN_STD_THRESHOLD;

    let standardized = values
        .iter()
        .map(|&x| match (x.is_finite(), applied) {
            (false, _) => f64::NAN,
            (true, true) => (x - mean) / std,
            (true, false) => 0.0,
        })
        .collect();

    (standardized, StandardizeResult { mean, std, applied })
}

/// Median of the finite values, or NaN if there are none.
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

/// Clamp values to `median ± n * MAD`, where MAD is the median absolute
/// deviation from the median. NaN values pass through unchanged, and so does
/// everything when `n` is negative or not finite.
///
/// ```
/// use strata_core::stats::mad_clip;
///
/// let clipped = mad_clip(&[1.0, 2.0, 3.0, 4.0, 100.0], 3.0);
/// assert_eq!(clipped[4], 6.0);
/// ```
pub fn mad_clip(values: &[f64], n: f64) -> Vec<f64> {
    if !n.is_finite() || n < 0.0 {
        return values.to_vec();
    }
    let med = median(values);
    if !med.is_finite() {
        return values.to_vec();
    }
    let deviations: Vec<f64> = values.iter().map(|x| (x - med).abs()).collect();
    let mad = median(&deviations);
    let (lower, upper) = (med - n * mad, med + n * mad);
    values
        .iter()
        .map(|&x| if x.is_finite() { x.clamp(lower, upper) } else { x })
        .collect()
}

/// Mean of the finite values, or NaN if there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, c), &x| (s + x, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

/// Sample standard deviation (N-1) of the finite values; NaN for fewer than two.
pub fn sample_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();
    if finite.len() < 2 {
        return f64::NAN;
    }
    let m = finite.iter().sum::<f64>() / finite.len() as f64;
    let variance = finite.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (finite.len() - 1) as f64;
    variance.sqrt()
}

/// Pairwise-complete sample covariance (N-1) of two equally long series.
///
/// Only positions where both values are finite take part. Returns NaN when
/// fewer than two such positions exist.
pub fn pairwise_covariance(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    pairs.iter().map(|(a, b)| (a - mx) * (b - my)).sum::<f64>() / (n - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standardize_basic() {
        let (z, r) = standardize(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(r.applied);
        assert_relative_eq!(z.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(sample_std(&z), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standardize_constant() {
        let (z, r) = standardize(&[2.0, 2.0, 2.0]);
        assert!(!r.applied);
        assert_eq!(z, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_standardize_keeps_nan() {
        let (z, r) = standardize(&[1.0, f64::NAN, 3.0]);
        assert!(r.applied);
        assert!(z[1].is_nan());
        assert_relative_eq!(z[0], -z[2]);
    }

    #[test]
    fn test_median_even_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_mad_clip_bounds() {
        // median 3, MAD 1
        let clipped = mad_clip(&[1.0, 2.0, 3.0, 4.0, 100.0, -50.0, 3.0, f64::NAN], 2.0);
        assert_relative_eq!(clipped[4], 5.0);
        assert_relative_eq!(clipped[5], 1.0);
        assert_relative_eq!(clipped[2], 3.0);
        assert!(clipped[7].is_nan());
    }

    #[test]
    fn test_mad_clip_invalid_width_is_noop() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_eq!(mad_clip(&values, -1.0), values.to_vec());
        assert_eq!(mad_clip(&values, f64::NAN), values.to_vec());
        assert_eq!(mad_clip(&values, f64::INFINITY), values.to_vec());
    }

    #[test]
    fn test_pairwise_covariance() {
        let x = [1.0, 2.0, 3.0, f64::NAN];
        let y = [2.0, 4.0, 6.0, 1.0];
        assert_relative_eq!(pairwise_covariance(&x, &y), 2.0, epsilon = 1e-12);
        assert!(pairwise_covariance(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_mean_skips_nan() {
        assert_relative_eq!(mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }
}
