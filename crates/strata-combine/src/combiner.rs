//! Composite factor signal from weighted exposures.

use ndarray::Array1;
use strata_core::stats::standardize;
use strata_core::{Result, StrataError};

/// Cross-sectional exposure of a single factor, ready for combination.
///
/// Each factor contributes a vector of scores (ideally z-scores) over the
/// same universe of stocks, in the same order.
#[derive(Debug, Clone)]
pub struct SignalScore {
    /// Factor name
    pub name: String,

    /// Scores for each stock in the universe
    pub scores: Array1<f64>,
}

/// Weighted sum of factor scores, re-standardized to z-scores.
///
/// A stock missing any score gets a missing composite.
///
/// # Errors
///
/// Returns an error if:
/// - No signals are provided
/// - The weight count differs from the signal count
/// - Signal vectors have mismatched lengths
/// - A weight is not finite
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use strata_combine::{SignalScore, composite_score};
///
/// let signals = vec![
///     SignalScore { name: "pe".into(), scores: array![0.5, -0.2, 1.0] },
///     SignalScore { name: "pb".into(), scores: array![-0.3, 0.8, 0.1] },
/// ];
/// let composite = composite_score(&signals, &array![0.7, 0.3]).unwrap();
/// assert_eq!(composite.len(), 3);
/// ```
pub fn composite_score(signals: &[SignalScore], weights: &Array1<f64>) -> Result<Array1<f64>> {
    let first = signals
        .first()
        .ok_or_else(|| StrataError::InvalidData("no signals to combine".into()))?;
    if weights.len() != signals.len() {
        return Err(StrataError::InvalidData(format!(
            "{} weights for {} signals",
            weights.len(),
            signals.len()
        )));
    }
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(StrataError::InvalidData("non-finite combination weight".into()));
    }

    let n = first.scores.len();
    let mut combined = Array1::<f64>::zeros(n);
    for (signal, &w) in signals.iter().zip(weights.iter()) {
        if signal.scores.len() != n {
            return Err(StrataError::InvalidData(format!(
                "signal {} has {} scores, expected {n}",
                signal.name,
                signal.scores.len()
            )));
        }
        combined.scaled_add(w, &signal.scores);
    }

    let (z, _) = standardize(&combined.to_vec());
    Ok(Array1::from_vec(z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn signal(name: &str, scores: Array1<f64>) -> SignalScore {
        SignalScore {
            name: name.to_string(),
            scores,
        }
    }

    #[test]
    fn test_composite_is_standardized() {
        let signals = vec![
            signal("pe", array![1.0, 2.0, 3.0, 4.0]),
            signal("pb", array![4.0, 1.0, 2.0, 3.0]),
        ];
        let z = composite_score(&signals, &array![0.5, 0.5]).unwrap();
        assert_abs_diff_eq!(z.sum(), 0.0, epsilon = 1e-12);
        // raw composite (2.5, 1.5, 2.5, 3.5)
        assert!(z[3] > z[0]);
        assert_abs_diff_eq!(z[0], z[2], epsilon = 1e-12);
    }

    #[test]
    fn test_single_factor_weight_reproduces_ranking() {
        let signals = vec![
            signal("pe", array![0.3, -1.0, 2.0]),
            signal("pb", array![5.0, 4.0, -3.0]),
        ];
        let z = composite_score(&signals, &array![1.0, 0.0]).unwrap();
        assert!(z[2] > z[0] && z[0] > z[1]);
    }

    #[test]
    fn test_missing_score_propagates() {
        let signals = vec![signal("pe", array![1.0, f64::NAN, 3.0, 0.0])];
        let z = composite_score(&signals, &array![1.0]).unwrap();
        assert!(z[1].is_nan());
        assert!(z[0].is_finite());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(composite_score(&[], &Array1::zeros(0)).is_err());
        let signals = vec![signal("pe", array![1.0, 2.0]), signal("pb", array![1.0])];
        assert!(composite_score(&signals, &array![0.5, 0.5]).is_err());
        assert!(composite_score(&signals[..1], &array![0.5, 0.5]).is_err());
        assert!(composite_score(&signals[..1], &array![f64::NAN]).is_err());
    }
}
