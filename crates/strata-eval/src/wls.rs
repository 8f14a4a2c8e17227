//! Weighted least squares on small dense design matrices.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use strata_core::linalg::{cholesky, cholesky_inverse_diagonal, cholesky_solve};

/// Pivot ratio below which the equilibrated normal equations count as singular.
pub const REGRESSION_PIVOT_RATIO: f64 = 1e-10;

/// Result of a weighted least squares fit.
#[derive(Debug, Clone, PartialEq)]
pub struct WlsFit {
    /// Fitted coefficients, one per design column.
    pub coefficients: Array1<f64>,
    /// Standard errors of the coefficients; NaN without residual degrees of freedom.
    pub std_errors: Array1<f64>,
    /// `y - X β`, one per observation.
    pub residuals: Array1<f64>,
}

impl WlsFit {
    /// t-statistic of coefficient `j`.
    pub fn t_value(&self, j: usize) -> f64 {
        self.coefficients[j] / self.std_errors[j]
    }
}

/// Minimize `Σ wᵢ (yᵢ - xᵢβ)²`.
///
/// Columns are rescaled to unit weighted norm before factorizing, so the
/// singularity check does not depend on the units of each regressor.
/// Returns `None` when the normal equations are singular or the weights are
/// not all positive and finite.
pub fn weighted_least_squares(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
) -> Option<WlsFit> {
    let (n, p) = x.dim();
    if y.len() != n || weights.len() != n || p == 0 || n < p {
        return None;
    }
    if weights.iter().any(|&w| !(w.is_finite() && w > 0.0)) {
        return None;
    }

    let weighted_x = &x * &weights.insert_axis(Axis(1));
    let norms: Array1<f64> = (&weighted_x * &x).sum_axis(Axis(0)).mapv(f64::sqrt);
    if norms.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
        return None;
    }

    let mut xtwx: Array2<f64> = weighted_x.t().dot(&x);
    let mut xtwy: Array1<f64> = weighted_x.t().dot(&y);
    for i in 0..p {
        xtwy[i] /= norms[i];
        for j in 0..p {
            xtwx[[i, j]] /= norms[i] * norms[j];
        }
    }

    let l = cholesky(xtwx.view(), REGRESSION_PIVOT_RATIO)?;
    let coefficients = cholesky_solve(&l, xtwy.view()) / &norms;
    let residuals = &y - &x.dot(&coefficients);

    let dof = n - p;
    let std_errors = if dof == 0 {
        Array1::from_elem(p, f64::NAN)
    } else {
        let sigma2 = residuals
            .iter()
            .zip(weights.iter())
            .map(|(e, w)| w * e * e)
            .sum::<f64>()
            / dof as f64;
        (cholesky_inverse_diagonal(&l) * sigma2).mapv(f64::sqrt) / &norms
    };

    Some(WlsFit {
        coefficients,
        std_errors,
        residuals,
    })
}

/// One-hot industry columns with the first level (ascending) dropped.
///
/// Returns the retained levels and an `(rows, levels - 1)` indicator matrix.
pub fn industry_dummies(industries: &[&str]) -> (Vec<String>, Array2<f64>) {
    let mut levels: Vec<&str> = industries.to_vec();
    levels.sort_unstable();
    levels.dedup();
    let kept: Vec<String> = levels.iter().skip(1).map(|s| (*s).to_string()).collect();

    let mut dummies = Array2::<f64>::zeros((industries.len(), kept.len()));
    for (i, industry) in industries.iter().enumerate() {
        if let Some(j) = kept.iter().position(|k| k == industry) {
            dummies[[i, j]] = 1.0;
        }
    }
    (kept, dummies)
}
