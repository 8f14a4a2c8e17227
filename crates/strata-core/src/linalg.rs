//! Small dense linear algebra for symmetric positive definite systems.
//!
//! Regression normal equations and covariance checks are at most a few dozen
//! columns wide, so a plain Cholesky factorization is all that is needed.
//! Every routine returns `None` when a pivot collapses; callers map that to
//! the error that fits their context.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Cholesky factor `L` (lower triangular) of a symmetric matrix, `A = L Lᵀ`.
///
/// Fails when a squared pivot is not finite or falls below
/// `min_pivot_ratio * max(diag(A))`, which flags singular and near-singular
/// input as well as indefinite input.
pub fn cholesky(a: ArrayView2<'_, f64>, min_pivot_ratio: f64) -> Option<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return None;
    }
    let scale = a.diag().iter().fold(0.0_f64, |m, &d| m.max(d.abs()));
    if n > 0 && !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let threshold = min_pivot_ratio * scale;

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut d = a[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if !d.is_finite() || d <= threshold {
            return None;
        }
        let pivot = d.sqrt();
        l[[j, j]] = pivot;
        for i in (j + 1)..n {
            let mut s = a[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / pivot;
        }
    }
    Some(l)
}

/// Solve `L Lᵀ x = b` given the Cholesky factor `L`.
pub fn cholesky_solve(l: &Array2<f64>, b: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[[i, k]] * y[k];
        }
        y[i] = s / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in (i + 1)..n {
            s -= l[[k, i]] * x[k];
        }
        x[i] = s / l[[i, i]];
    }
    x
}

/// Diagonal of `A⁻¹` given the Cholesky factor `L` of `A`.
pub fn cholesky_inverse_diagonal(l: &Array2<f64>) -> Array1<f64> {
    let n = l.nrows();
    let mut diag = Array1::<f64>::zeros(n);
    let mut unit = Array1::<f64>::zeros(n);
    for i in 0..n {
        unit[i] = 1.0;
        diag[i] = cholesky_solve(l, unit.view())[i];
        unit[i] = 0.0;
    }
    diag
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_cholesky_reconstructs() {
        let a = array![[4.0, 2.0, 0.4], [2.0, 5.0, 1.0], [0.4, 1.0, 3.0]];
        let l = cholesky(a.view(), 1e-12).unwrap();
        let back = l.dot(&l.t());
        for (x, y) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cholesky_solve() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![3.0, 5.0];
        let l = cholesky(a.view(), 1e-12).unwrap();
        let x = cholesky_solve(&l, b.view());
        assert_abs_diff_eq!(x[0], 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 1.4, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_rejected() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(cholesky(a.view(), 1e-10).is_none());
        let zero = Array2::<f64>::zeros((2, 2));
        assert!(cholesky(zero.view(), 1e-10).is_none());
    }

    #[test]
    fn test_inverse_diagonal() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        // A^-1 = 1/5 * [[3, -1], [-1, 2]]
        let l = cholesky(a.view(), 1e-12).unwrap();
        let d = cholesky_inverse_diagonal(&l);
        assert_abs_diff_eq!(d[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(d[1], 0.4, epsilon = 1e-12);
    }
}
