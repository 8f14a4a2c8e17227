//! Long-only ICIR maximization over factor weights.
//!
//! The objective is `wᵀμ / sqrt(wᵀΣw)` where `μ` and `Σ` are the trailing
//! IC mean and covariance. Weights live on the probability simplex. The solver
//! is projected gradient ascent from the uniform vector with backtracking
//! step control. Every accepted step raises the score, so the result never
//! scores below uniform.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use strata_core::linalg::cholesky;
use strata_core::{Result, StrataError};

/// Sufficient-increase constant for the backtracking line search.
const ARMIJO: f64 = 1e-4;

/// Smallest step tried before the line search gives up.
const MIN_STEP: f64 = 1e-16;

/// Configuration for the ICIR optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Maximum number of gradient steps per solve
    pub max_iterations: usize,
    /// Largest weight change below which the solve has converged
    pub tolerance: f64,
    /// First step length tried by the line search
    pub initial_step: f64,
    /// Portfolio IC variance at or below which the score is undefined
    pub min_variance: f64,
    /// Relative Cholesky pivot below which the covariance is ill-conditioned
    pub min_pivot_ratio: f64,
    /// Wall-clock cap per solve, in milliseconds
    pub time_limit_ms: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
            initial_step: 1.0,
            min_variance: 1e-14,
            min_pivot_ratio: 1e-10,
            time_limit_ms: Some(1_000),
        }
    }
}

/// Result of one optimizer solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimized {
    /// Factor weights on the simplex.
    pub weights: Array1<f64>,
    /// ICIR achieved by `weights`.
    pub score: f64,
    /// ICIR of the uniform weight vector.
    pub uniform_score: f64,
    /// False when an iteration or time cap was hit; `weights` are then uniform.
    pub converged: bool,
    /// Gradient steps taken.
    pub iterations: usize,
}

/// Predicted ICIR of a weight vector: `wᵀμ / sqrt(wᵀΣw)`.
///
/// Returns NaN when the predicted variance is at or below `min_variance`.
pub fn icir(
    weights: ArrayView1<'_, f64>,
    mean: ArrayView1<'_, f64>,
    cov: ArrayView2<'_, f64>,
    min_variance: f64,
) -> f64 {
    let variance = weights.dot(&cov.dot(&weights));
    if variance.is_nan() || variance <= min_variance {
        return f64::NAN;
    }
    weights.dot(&mean) / variance.sqrt()
}

/// Euclidean projection onto `{w : w ≥ 0, Σw = 1}`.
pub fn project_to_simplex(v: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (j + 1) as f64;
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }
    v.mapv(|x| (x - theta).max(0.0))
}

/// Projected-gradient ICIR optimizer.
#[derive(Debug, Clone, Default)]
pub struct IcirOptimizer {
    config: OptimizerConfig,
}

impl IcirOptimizer {
    /// Create an optimizer with the given configuration.
    pub const fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Maximize ICIR over the simplex for one date's IC moments.
    ///
    /// # Errors
    ///
    /// - [`StrataError::InvalidData`] if the dimensions disagree or are zero.
    /// - [`StrataError::IllConditionedCovariance`] if an input is not finite,
    ///   the covariance fails the pivot check, or the uniform score is undefined.
    pub fn optimize(&self, mean: ArrayView1<'_, f64>, cov: ArrayView2<'_, f64>) -> Result<Optimized> {
        let n = mean.len();
        if n == 0 || cov.dim() != (n, n) {
            return Err(StrataError::InvalidData(format!(
                "IC mean has {n} entries but covariance is {:?}",
                cov.dim()
            )));
        }
        if mean.iter().chain(cov.iter()).any(|x| !x.is_finite()) {
            return Err(StrataError::IllConditionedCovariance(
                "IC moments contain missing values".into(),
            ));
        }
        if cholesky(cov, self.config.min_pivot_ratio).is_none() {
            return Err(StrataError::IllConditionedCovariance(format!(
                "covariance of {n} factors is singular or not positive definite"
            )));
        }

        let cfg = &self.config;
        let uniform = Array1::from_elem(n, 1.0 / n as f64);
        let uniform_score = icir(uniform.view(), mean, cov, cfg.min_variance);
        if !uniform_score.is_finite() {
            return Err(StrataError::IllConditionedCovariance(
                "predicted IC variance of the uniform portfolio is zero".into(),
            ));
        }

        let deadline = cfg
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let mut w = uniform.clone();
        let mut score = uniform_score;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < cfg.max_iterations {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            iterations += 1;

            let gradient = icir_gradient(w.view(), mean, cov);
            let mut step = cfg.initial_step;
            let mut next = None;
            while step >= MIN_STEP {
                let candidate = project_to_simplex((&w + &(&gradient * step)).view());
                let candidate_score = icir(candidate.view(), mean, cov, cfg.min_variance);
                let predicted = gradient.dot(&(&candidate - &w));
                if candidate_score.is_finite() && candidate_score >= score + ARMIJO * predicted {
                    next = Some((candidate, candidate_score));
                    break;
                }
                step *= 0.5;
            }

            // no acceptable step means w is stationary
            let Some((candidate, candidate_score)) = next else {
                converged = true;
                break;
            };
            let change = (&candidate - &w)
                .iter()
                .fold(0.0_f64, |m, d| m.max(d.abs()));
            w = candidate;
            score = candidate_score;
            if change < cfg.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::debug!(iterations, "ICIR solve hit its cap, falling back to uniform");
            return Ok(Optimized {
                weights: uniform,
                score: uniform_score,
                uniform_score,
                converged: false,
                iterations,
            });
        }

        Ok(Optimized {
            weights: w,
            score,
            uniform_score,
            converged: true,
            iterations,
        })
    }
}

fn icir_gradient(w: ArrayView1<'_, f64>, mean: ArrayView1<'_, f64>, cov: ArrayView2<'_, f64>) -> Array1<f64> {
    let sigma_w: Array1<f64> = cov.dot(&w);
    let variance = w.dot(&sigma_w);
    let sd = variance.sqrt();
    let numerator = w.dot(&mean);
    mean.mapv(|m| m / sd) - sigma_w * (numerator / (variance * sd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    fn equicorrelated(n: usize, a: f64, b: f64) -> Array2<f64> {
        Array2::from_shape_fn((n, n), |(i, j)| if i == j { a } else { b })
    }

    fn on_simplex(w: &Array1<f64>) -> bool {
        w.iter().all(|&x| x >= 0.0) && (w.sum() - 1.0).abs() < 1e-9
    }

    #[test]
    fn test_icir_value() {
        let w = array![0.5, 0.5];
        let mean = array![0.04, 0.02];
        let cov = array![[0.01, 0.0], [0.0, 0.01]];
        // 0.03 / sqrt(0.005)
        assert_abs_diff_eq!(
            icir(w.view(), mean.view(), cov.view(), 1e-14),
            0.03 / 0.005f64.sqrt(),
            epsilon = 1e-12
        );
        assert!(icir(w.view(), mean.view(), Array2::zeros((2, 2)).view(), 1e-14).is_nan());
    }

    #[test]
    fn test_projection() {
        let p = project_to_simplex(array![0.5, 0.5, 0.5].view());
        for &x in p.iter() {
            assert_abs_diff_eq!(x, 1.0 / 3.0, epsilon = 1e-12);
        }
        let p = project_to_simplex(array![2.0, 0.0, -1.0].view());
        assert_eq!(p, array![1.0, 0.0, 0.0]);
        let p = project_to_simplex(array![0.6, 0.3, 0.1].view());
        assert_abs_diff_eq!(p[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_mean_scores_zero() {
        let cov = equicorrelated(3, 0.01, 0.002);
        let out = IcirOptimizer::default()
            .optimize(Array1::zeros(3).view(), cov.view())
            .unwrap();
        assert!(out.converged);
        assert_abs_diff_eq!(out.score, 0.0, epsilon = 1e-15);
        assert!(on_simplex(&out.weights));
    }

    #[test]
    fn test_symmetric_input_gives_uniform() {
        let cov = equicorrelated(4, 0.02, 0.005);
        let mean = Array1::from_elem(4, 0.03);
        let out = IcirOptimizer::default().optimize(mean.view(), cov.view()).unwrap();
        assert!(out.converged);
        for &x in out.weights.iter() {
            assert_abs_diff_eq!(x, 0.25, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(out.score, out.uniform_score, epsilon = 1e-12);
    }

    #[test]
    fn test_tangency_weights_for_independent_factors() {
        // independent factors: optimum is proportional to mean / variance
        let mean = array![0.05, 0.03];
        let cov = array![[0.01, 0.0], [0.0, 0.02]];
        let out = IcirOptimizer::default().optimize(mean.view(), cov.view()).unwrap();
        assert!(out.converged);
        let raw = [0.05 / 0.01, 0.03 / 0.02];
        let total: f64 = raw.iter().sum();
        assert_abs_diff_eq!(out.weights[0], raw[0] / total, epsilon = 1e-6);
        assert_abs_diff_eq!(out.weights[1], raw[1] / total, epsilon = 1e-6);
        assert!(out.score >= out.uniform_score);
    }

    #[test]
    fn test_corner_solution() {
        let mean = array![0.05, -0.02, -0.01];
        let cov = array![[0.01, 0.0, 0.0], [0.0, 0.01, 0.0], [0.0, 0.0, 0.01]];
        let out = IcirOptimizer::default().optimize(mean.view(), cov.view()).unwrap();
        assert!(out.converged);
        assert_abs_diff_eq!(out.weights[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out.score, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_covariance_rejected() {
        let mean = array![0.03, 0.03];
        let cov = array![[0.01, 0.01], [0.01, 0.01]];
        assert!(matches!(
            IcirOptimizer::default().optimize(mean.view(), cov.view()),
            Err(StrataError::IllConditionedCovariance(_))
        ));
        let nan_cov = array![[f64::NAN, 0.0], [0.0, 0.01]];
        assert!(matches!(
            IcirOptimizer::default().optimize(mean.view(), nan_cov.view()),
            Err(StrataError::IllConditionedCovariance(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let out = IcirOptimizer::default().optimize(array![0.1].view(), Array2::eye(2).view());
        assert!(matches!(out, Err(StrataError::InvalidData(_))));
    }

    #[test]
    fn test_iteration_cap_falls_back_to_uniform() {
        let optimizer = IcirOptimizer::new(OptimizerConfig {
            max_iterations: 1,
            tolerance: 0.0,
            ..Default::default()
        });
        let mean = array![0.05, 0.03, 0.01];
        let cov = array![[0.01, 0.002, 0.0], [0.002, 0.02, 0.001], [0.0, 0.001, 0.015]];
        let out = optimizer.optimize(mean.view(), cov.view()).unwrap();
        assert!(!out.converged);
        assert_eq!(out.iterations, 1);
        assert_eq!(out.weights, Array1::from_elem(3, 1.0 / 3.0));
        assert_eq!(out.score, out.uniform_score);
    }
}
