//! Per-date factor weights over a whole backtest.

use crate::optimizer::{IcirOptimizer, OptimizerConfig};
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_core::stats::mean;
use strata_core::{Date, Diagnostic, DiagnosticKind, Provenance, Result, StrataError};
use strata_eval::IcMoments;

/// Optimized factor weights for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWeightRecord {
    /// Rebalancing date.
    pub date: Date,
    /// Weight per factor, in the report's factor order.
    pub weights: Array1<f64>,
    /// ICIR achieved by the weights.
    pub score: f64,
    /// ICIR of uniform weights on the same date.
    pub uniform_score: f64,
    /// Whether the solver converged; uniform weights were used otherwise.
    pub converged: bool,
}

/// Factor weights for every date that could be solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationReport {
    /// Factor names, in weight order.
    pub factors: Vec<String>,
    /// One record per solved date, ascending.
    pub records: Vec<FactorWeightRecord>,
    /// Skipped dates and solver fallbacks.
    pub diagnostics: Vec<Diagnostic>,
}

impl CombinationReport {
    /// Number of solved dates.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no date was solved.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Average optimized score across dates.
    pub fn mean_score(&self) -> f64 {
        mean(&self.records.iter().map(|r| r.score).collect::<Vec<_>>())
    }

    /// Average uniform-weight score across dates.
    pub fn mean_uniform_score(&self) -> f64 {
        mean(&self.records.iter().map(|r| r.uniform_score).collect::<Vec<_>>())
    }

    /// Table keyed by date: one weight column per factor, then `score`,
    /// `uniform_score` and `converged`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut frame_columns = Vec::with_capacity(self.factors.len() + 4);
        frame_columns.push(Column::new(
            "date".into(),
            self.records.iter().map(|r| r.date.to_string()).collect::<Vec<_>>(),
        ));
        for (j, factor) in self.factors.iter().enumerate() {
            frame_columns.push(Column::new(
                factor.as_str().into(),
                self.records.iter().map(|r| r.weights[j]).collect::<Vec<_>>(),
            ));
        }
        frame_columns.push(Column::new(
            "score".into(),
            self.records.iter().map(|r| r.score).collect::<Vec<_>>(),
        ));
        frame_columns.push(Column::new(
            "uniform_score".into(),
            self.records.iter().map(|r| r.uniform_score).collect::<Vec<_>>(),
        ));
        frame_columns.push(Column::new(
            "converged".into(),
            self.records.iter().map(|r| r.converged).collect::<Vec<_>>(),
        ));
        Ok(DataFrame::new(frame_columns)?)
    }
}

/// Solve the ICIR optimization on every date.
///
/// Dates are solved in parallel and reported in chronological order. A date
/// whose covariance is ill-conditioned is skipped with a diagnostic. A solve
/// that hits its cap keeps uniform weights and is also reported.
///
/// # Errors
///
/// [`StrataError::InvalidData`] if the factor names do not match the width of
/// the moments.
#[tracing::instrument(skip(moments, factors, config), fields(dates = moments.len(), factors = factors.len()))]
pub fn optimize_series(
    moments: &[IcMoments],
    factors: &[String],
    config: &OptimizerConfig,
) -> Result<CombinationReport> {
    if let Some(bad) = moments.iter().find(|m| m.mean.len() != factors.len()) {
        return Err(StrataError::InvalidData(format!(
            "date {}: {} IC means for {} factors",
            bad.date,
            bad.mean.len(),
            factors.len()
        )));
    }

    let optimizer = IcirOptimizer::new(config.clone());
    let mut ordered: Vec<&IcMoments> = moments.iter().collect();
    ordered.sort_by_key(|m| m.date);

    let solved: Vec<(Date, Result<_>)> = ordered
        .par_iter()
        .map(|m| (m.date, optimizer.optimize(m.mean.view(), m.cov.view())))
        .collect();

    let mut records = Vec::with_capacity(solved.len());
    let mut diagnostics = Vec::new();
    for (date, result) in solved {
        match result {
            Ok(out) => {
                if !out.converged {
                    diagnostics.push(Diagnostic::record(
                        Provenance::date(date),
                        DiagnosticKind::SolverNonConvergence,
                        format!(
                            "no convergence after {} iterations, using uniform weights",
                            out.iterations
                        ),
                    ));
                }
                records.push(FactorWeightRecord {
                    date,
                    weights: out.weights,
                    score: out.score,
                    uniform_score: out.uniform_score,
                    converged: out.converged,
                });
            }
            Err(e) => diagnostics.push(Diagnostic::from_error(Provenance::date(date), &e)),
        }
    }
    tracing::info!(
        solved = records.len(),
        skipped = ordered.len() - records.len(),
        "optimized factor weights"
    );

    Ok(CombinationReport {
        factors: factors.to_vec(),
        records,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    fn moments(day: u32, mean: Array1<f64>, cov: Array2<f64>) -> IcMoments {
        IcMoments {
            date: Date::from_ymd_opt(2018, 3, day).unwrap(),
            mean,
            cov,
        }
    }

    fn factors() -> Vec<String> {
        vec!["pe".into(), "pb".into()]
    }

    #[test]
    fn test_series_skips_singular_date() {
        let good = array![[0.01, 0.002], [0.002, 0.02]];
        let series = vec![
            moments(3, array![0.04, 0.02], good.clone()),
            moments(1, array![0.03, 0.03], array![[0.01, 0.01], [0.01, 0.01]]),
            moments(2, array![0.01, 0.05], good),
        ];
        let report = optimize_series(&series, &factors(), &OptimizerConfig::default()).unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.records[0].date < report.records[1].date);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::IllConditionedCovariance);
        for r in &report.records {
            assert!(r.converged);
            assert!(r.score >= r.uniform_score - 1e-12);
            assert_abs_diff_eq!(r.weights.sum(), 1.0, epsilon = 1e-9);
            assert!(r.weights.iter().all(|&w| w >= 0.0));
        }
        assert!(report.mean_score() >= report.mean_uniform_score());
    }

    #[test]
    fn test_identical_factor_ics_are_ill_conditioned() {
        // two factors with the same IC history have a singular covariance,
        // so no date is solved rather than every date returning uniform
        let ics = [0.02, 0.05, -0.01, 0.03, 0.04, 0.00];
        let dates: Vec<Date> = (1..=6).map(|d| Date::from_ymd_opt(2018, 3, d).unwrap()).collect();
        let values = Array2::from_shape_fn((6, 2), |(t, _)| ics[t]);
        let table = strata_eval::IcTable::new(dates, factors(), values).unwrap();
        let series = strata_eval::rolling_moments(&table, 3).unwrap();
        assert_eq!(series.len(), 3);

        let report = optimize_series(&series, &factors(), &OptimizerConfig::default()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.diagnostics.len(), 3);
        assert!(
            report
                .diagnostics
                .iter()
                .all(|d| d.kind == DiagnosticKind::IllConditionedCovariance)
        );
    }

    #[test]
    fn test_non_convergence_reported() {
        let config = OptimizerConfig {
            max_iterations: 1,
            tolerance: 0.0,
            ..Default::default()
        };
        let series = vec![moments(1, array![0.04, 0.01], array![[0.01, 0.003], [0.003, 0.02]])];
        let report = optimize_series(&series, &factors(), &config).unwrap();
        assert_eq!(report.len(), 1);
        assert!(!report.records[0].converged);
        assert_eq!(report.records[0].weights, array![0.5, 0.5]);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::SolverNonConvergence);
    }

    #[test]
    fn test_factor_count_mismatch() {
        let series = vec![moments(1, array![0.04], array![[0.01]])];
        assert!(optimize_series(&series, &factors(), &OptimizerConfig::default()).is_err());
    }

    #[test]
    fn test_to_frame() {
        let series = vec![moments(1, array![0.04, 0.02], array![[0.01, 0.0], [0.0, 0.01]])];
        let frame = optimize_series(&series, &factors(), &OptimizerConfig::default())
            .unwrap()
            .to_frame()
            .unwrap();
        assert_eq!(frame.height(), 1);
        assert_eq!(frame.width(), 6);
        let pe = frame.column("pe").unwrap().f64().unwrap().get(0).unwrap();
        let pb = frame.column("pb").unwrap().f64().unwrap().get(0).unwrap();
        assert_abs_diff_eq!(pe + pb, 1.0, epsilon = 1e-9);
        assert!(pe > pb);
    }
}
