//! Cross-sectional factor-return regressions.
//!
//! On each date the forward return is regressed on industry dummies and the
//! factor, weighted by `sqrt(market_value)`. The factor coefficient is that
//! period's factor return; its t-value measures how significant it is.

use crate::wls::{industry_dummies, weighted_least_squares};
use ndarray::{Array1, Array2, Axis, Slice};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_core::stats::{mean, sample_std};
use strata_core::{CrossSection, Date, Diagnostic, Provenance, Result, StrataError};

/// Threshold on |t| counted as significant.
pub const SIGNIFICANT_T: f64 = 2.0;

/// Factor return and its t-value on one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRegression {
    /// Regression date.
    pub date: Date,
    /// Coefficient on the factor.
    pub factor_return: f64,
    /// t-statistic of that coefficient.
    pub t_value: f64,
}

/// Regress forward returns on industry dummies and one factor.
///
/// # Errors
///
/// - [`StrataError::MissingColumn`] if the factor is absent.
/// - [`StrataError::InsufficientData`] without residual degrees of freedom.
/// - [`StrataError::RankDeficientRegression`] if the design is singular.
pub fn factor_regression(section: &CrossSection, factor: &str) -> Result<FactorRegression> {
    let exposures = section.factor(factor)?;
    let rows: Vec<usize> = (0..section.len())
        .filter(|&i| {
            exposures[i].is_finite()
                && section.next_return[i].is_finite()
                && section.market_value[i].is_finite()
                && section.market_value[i] > 0.0
        })
        .collect();

    let industries: Vec<&str> = rows.iter().map(|&i| section.industries[i].as_str()).collect();
    let (_, dummies) = industry_dummies(&industries);
    let p = 2 + dummies.ncols();
    if rows.len() <= p {
        return Err(StrataError::InsufficientData(format!(
            "date {} factor {factor}: {} usable stocks for {p} regressors",
            section.date,
            rows.len()
        )));
    }

    let mut x = Array2::<f64>::zeros((rows.len(), p));
    x.column_mut(0).fill(1.0);
    x.slice_axis_mut(Axis(1), Slice::from(1..p - 1))
        .assign(&dummies);
    for (r, &i) in rows.iter().enumerate() {
        x[[r, p - 1]] = exposures[i];
    }
    let y: Array1<f64> = rows.iter().map(|&i| section.next_return[i]).collect();
    let w: Array1<f64> = rows.iter().map(|&i| section.market_value[i].sqrt()).collect();

    let fit = weighted_least_squares(x.view(), y.view(), w.view()).ok_or_else(|| {
        StrataError::RankDeficientRegression(format!(
            "date {} factor {factor}: singular return regression",
            section.date
        ))
    })?;
    Ok(FactorRegression {
        date: section.date,
        factor_return: fit.coefficients[p - 1],
        t_value: fit.t_value(p - 1),
    })
}

/// Run [`factor_regression`] on every date, in parallel and in date order.
///
/// Failed dates are skipped and reported.
pub fn factor_tvalues(
    sections: &[CrossSection],
    factor: &str,
) -> (Vec<FactorRegression>, Vec<Diagnostic>) {
    let mut ordered: Vec<&CrossSection> = sections.iter().collect();
    ordered.sort_by_key(|s| s.date);

    let results: Vec<Result<FactorRegression>> = ordered
        .par_iter()
        .map(|section| factor_regression(section, factor))
        .collect();

    let mut records = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for (section, result) in ordered.iter().zip(results) {
        match result {
            Ok(r) => records.push(r),
            Err(e) => diagnostics.push(Diagnostic::from_error(
                Provenance::date(section.date).with_factor(factor),
                &e,
            )),
        }
    }
    (records, diagnostics)
}

/// Time-series summary of per-date factor regressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TValueSummary {
    /// Factor name
    pub factor: String,
    /// Number of dates with a finite t-value
    pub n_obs: usize,
    /// Mean of |t|
    pub mean_abs_t: f64,
    /// Fraction of dates with |t| above [`SIGNIFICANT_T`]
    pub significant_share: f64,
    /// mean(t) / std(t)
    pub standardized_t: f64,
    /// Mean factor return
    pub mean_factor_return: f64,
    /// One-sample t-statistic of the factor-return series against zero
    pub factor_return_t: f64,
}

impl TValueSummary {
    /// Summarize the per-date regressions of one factor.
    pub fn calculate(factor: impl Into<String>, records: &[FactorRegression]) -> Self {
        let t: Vec<f64> = records
            .iter()
            .map(|r| r.t_value)
            .filter(|v| v.is_finite())
            .collect();
        let abs_t: Vec<f64> = t.iter().map(|v| v.abs()).collect();
        let returns: Vec<f64> = records.iter().map(|r| r.factor_return).collect();

        let n_obs = t.len();
        let significant_share = if n_obs == 0 {
            f64::NAN
        } else {
            abs_t.iter().filter(|&&v| v > SIGNIFICANT_T).count() as f64 / n_obs as f64
        };
        let n_returns = returns.iter().filter(|v| v.is_finite()).count() as f64;

        Self {
            factor: factor.into(),
            n_obs,
            mean_abs_t: mean(&abs_t),
            significant_share,
            standardized_t: mean(&t) / sample_std(&t),
            mean_factor_return: mean(&returns),
            factor_return_t: mean(&returns) / (sample_std(&returns) / n_returns.sqrt()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn section(day: u32, noise: f64) -> CrossSection {
        let n = 12;
        let exposure: Array1<f64> = (0..n).map(|i| i as f64 - 5.5).collect();
        let returns: Vec<f64> = (0..n)
            .map(|i| {
                let industry_effect = if i % 3 == 0 { 0.01 } else { -0.005 };
                let wiggle = if i % 2 == 0 { noise } else { -noise };
                0.002 * (i as f64 - 5.5) + industry_effect + wiggle
            })
            .collect();
        CrossSection::new(
            Date::from_ymd_opt(2016, 5, day).unwrap(),
            (0..n).map(|i| format!("s{i:02}")).collect(),
            (0..n).map(|i| if i % 3 == 0 { "x" } else { "y" }.to_string()).collect(),
            (0..n).map(|i| 100.0 + 10.0 * i as f64).collect(),
            returns,
            vec![1.0 / n as f64; n],
        )
        .unwrap()
        .with_factor("mom", exposure)
        .unwrap()
    }

    #[test]
    fn test_recovers_factor_return() {
        let r = factor_regression(&section(2, 0.0), "mom").unwrap();
        assert_abs_diff_eq!(r.factor_return, 0.002, epsilon = 1e-10);
        let noisy = factor_regression(&section(3, 0.001), "mom").unwrap();
        assert!(noisy.t_value > SIGNIFICANT_T);
    }

    #[test]
    fn test_tvalues_skip_failed_dates() {
        let tiny = CrossSection::new(
            Date::from_ymd_opt(2016, 5, 1).unwrap(),
            vec!["a".into(), "b".into()],
            vec!["x".into(), "x".into()],
            vec![1.0, 2.0],
            vec![0.01, 0.02],
            vec![0.5, 0.5],
        )
        .unwrap()
        .with_factor("mom", ndarray::array![1.0, 2.0])
        .unwrap();
        let (records, diagnostics) =
            factor_tvalues(&[section(4, 0.001), tiny, section(3, 0.002)], "mom");
        assert_eq!(records.len(), 2);
        assert!(records[0].date < records[1].date);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_summary() {
        let d = Date::from_ymd_opt(2016, 1, 1).unwrap();
        let records: Vec<FactorRegression> = [(0.01, 3.0), (0.02, -1.0), (0.03, 2.5)]
            .iter()
            .map(|&(factor_return, t_value)| FactorRegression {
                date: d,
                factor_return,
                t_value,
            })
            .collect();
        let s = TValueSummary::calculate("mom", &records);
        assert_eq!(s.n_obs, 3);
        assert_abs_diff_eq!(s.mean_abs_t, 6.5 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.significant_share, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.mean_factor_return, 0.02, epsilon = 1e-12);
        // std of (0.01, 0.02, 0.03) is 0.01
        assert_abs_diff_eq!(s.factor_return_t, 0.02 / (0.01 / 3f64.sqrt()), epsilon = 1e-9);
    }
}
