//! Size and industry neutralization of factor exposures.
//!
//! The raw factor is regressed on an intercept, market value and industry
//! dummies with weights `sqrt(market_value)`. The residual is the part of the
//! exposure that size and industry membership do not explain.

use crate::wls::{industry_dummies, weighted_least_squares};
use ndarray::{Array1, Array2, Axis, Slice};
use std::collections::BTreeMap;
use strata_core::{CrossSection, Diagnostic, DiagnosticKind, Provenance, Result, StrataError};

/// Neutralized exposures for one factor on one date.
#[derive(Debug, Clone)]
pub struct Residuals {
    /// One value per stock in canonical order; NaN where the stock was excluded.
    pub values: Array1<f64>,
    /// Stocks dropped for making the regression rank deficient.
    pub diagnostics: Vec<Diagnostic>,
}

/// Residualize `factor` against market value and industry on one date.
///
/// Stocks with a missing exposure or a non-positive market value are left
/// out. A stock that is alone in its industry would be fitted exactly by its
/// own dummy, so it is dropped and reported instead.
///
/// # Errors
///
/// - [`StrataError::MissingColumn`] if the factor is absent.
/// - [`StrataError::InsufficientData`] if fewer usable stocks than regressors remain.
/// - [`StrataError::RankDeficientRegression`] if the normal equations are singular.
pub fn residualize(section: &CrossSection, factor: &str) -> Result<Residuals> {
    let exposures = section.factor(factor)?;
    let usable: Vec<usize> = (0..section.len())
        .filter(|&i| {
            exposures[i].is_finite()
                && section.market_value[i].is_finite()
                && section.market_value[i] > 0.0
        })
        .collect();

    let mut members: BTreeMap<&str, usize> = BTreeMap::new();
    for &i in &usable {
        *members.entry(section.industries[i].as_str()).or_default() += 1;
    }

    let mut diagnostics = Vec::new();
    let mut rows = Vec::with_capacity(usable.len());
    for &i in &usable {
        let industry = section.industries[i].as_str();
        if members.get(industry).copied() == Some(1) {
            diagnostics.push(Diagnostic::record(
                Provenance::date(section.date)
                    .with_industry(industry)
                    .with_factor(factor),
                DiagnosticKind::RankDeficientRegression,
                format!(
                    "stock {} is the only member of its industry, dropped from residualization",
                    section.stocks[i]
                ),
            ));
        } else {
            rows.push(i);
        }
    }

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
    for (r, &i) in rows.iter().enumerate() {
        x[[r, 1]] = section.market_value[i];
    }
    x.slice_axis_mut(Axis(1), Slice::from(2..)).assign(&dummies);
    let y: Array1<f64> = rows.iter().map(|&i| exposures[i]).collect();
    let w: Array1<f64> = rows.iter().map(|&i| section.market_value[i].sqrt()).collect();

    let fit = weighted_least_squares(x.view(), y.view(), w.view()).ok_or_else(|| {
        StrataError::RankDeficientRegression(format!(
            "date {} factor {factor}: singular normal equations",
            section.date
        ))
    })?;

    let mut values = Array1::from_elem(section.len(), f64::NAN);
    for (r, &i) in rows.iter().enumerate() {
        values[i] = fit.residuals[r];
    }
    tracing::debug!(date = %section.date, factor, stocks = rows.len(), "residualized factor");
    Ok(Residuals {
        values,
        diagnostics,
    })
}
