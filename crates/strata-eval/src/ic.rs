//! Information Coefficient (IC) calculations.
//!
//! IC measures the Spearman rank correlation between factor exposures and forward returns.
//! It is the per-date quality measure that the rolling estimator and the optimizer build on.

use ndarray::Array1;

/// Calculate Information Coefficient between exposures and forward returns.
///
/// IC is computed as the Spearman rank correlation coefficient between the
/// exposures and forward returns, over the positions where both are finite.
/// Values range from -1 to 1, where:
/// - Positive values indicate the factor predicts returns in the correct direction
/// - Negative values indicate inverse correlation
/// - Values near zero indicate no predictive power
///
/// Returns NaN for mismatched lengths, fewer than two complete pairs, or a
/// constant input.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use strata_eval::calculate_ic;
///
/// let exposures = array![1.5, 0.3, -0.8, 2.1];
/// let returns = array![0.02, 0.01, -0.01, 0.03];
/// assert!((calculate_ic(&exposures, &returns) - 1.0).abs() < 1e-12);
/// ```
pub fn calculate_ic(exposures: &Array1<f64>, forward_returns: &Array1<f64>) -> f64 {
    if exposures.len() != forward_returns.len() {
        return f64::NAN;
    }

    let pairs: Vec<(f64, f64)> = exposures
        .iter()
        .zip(forward_returns.iter())
        .filter(|(s, r)| s.is_finite() && r.is_finite())
        .map(|(&s, &r)| (s, r))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let exposure_ranks = compute_ranks(&pairs.iter().map(|(s, _)| *s).collect::<Vec<_>>());
    let return_ranks = compute_ranks(&pairs.iter().map(|(_, r)| *r).collect::<Vec<_>>());

    pearson(&exposure_ranks, &return_ranks)
}

/// Compute ranks of values (handling ties with average rank).
pub fn compute_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();

    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;

    while i < n {
        let mut j = i;
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        // Average rank for ties
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for entry in &indexed[i..j] {
            ranks[entry.0] = avg_rank;
        }

        i = j;
    }

    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}
