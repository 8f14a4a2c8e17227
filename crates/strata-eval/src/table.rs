//! Per-date IC table across several factors.

use crate::ic::calculate_ic;
use crate::residual::residualize;
use ndarray::{Array2, ArrayView1};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strata_core::{CrossSection, Date, Diagnostic, DiagnosticKind, Provenance, Result, StrataError};

/// Configuration for IC estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IcConfig {
    /// Rolling window length in periods
    pub window: usize,
    /// Minimum number of complete (residual, return) pairs for an IC
    pub min_stocks: usize,
}

impl Default for IcConfig {
    fn default() -> Self {
        Self {
            window: 12,
            min_stocks: 3,
        }
    }
}

/// IC values, one row per date and one column per factor.
#[derive(Debug, Clone, PartialEq)]
pub struct IcTable {
    /// Dates, ascending.
    pub dates: Vec<Date>,
    /// Factor names, in column order.
    pub factors: Vec<String>,
    /// IC values, shape `(dates, factors)`. NaN marks a failed date.
    pub values: Array2<f64>,
}

impl IcTable {
    /// Build a table, checking that the shape matches the labels.
    pub fn new(dates: Vec<Date>, factors: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (dates.len(), factors.len()) {
            return Err(StrataError::InvalidData(format!(
                "IC table shape {:?} does not match {} dates x {} factors",
                values.dim(),
                dates.len(),
                factors.len()
            )));
        }
        Ok(Self {
            dates,
            factors,
            values,
        })
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// IC series of one factor.
    pub fn series(&self, factor: &str) -> Option<ArrayView1<'_, f64>> {
        let j = self.factors.iter().position(|f| f == factor)?;
        Some(self.values.column(j))
    }

    /// Wide table: `date` followed by one IC column per factor.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut frame_columns = Vec::with_capacity(1 + self.factors.len());
        frame_columns.push(Column::new(
            "date".into(),
            self.dates.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ));
        for (j, factor) in self.factors.iter().enumerate() {
            frame_columns.push(Column::new(
                factor.as_str().into(),
                self.values.column(j).to_vec(),
            ));
        }
        Ok(DataFrame::new(frame_columns)?)
    }
}

/// Residualized rank IC estimator.
#[derive(Debug, Clone, Default)]
pub struct IcEstimator {
    config: IcConfig,
}

impl IcEstimator {
    /// Create an estimator with the given configuration.
    pub const fn new(config: IcConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub const fn config(&self) -> &IcConfig {
        &self.config
    }

    /// Residualized IC of one factor on one date.
    pub fn date_ic(&self, section: &CrossSection, factor: &str) -> Result<(f64, Vec<Diagnostic>)> {
        let residuals = residualize(section, factor)?;
        let complete = residuals
            .values
            .iter()
            .zip(section.next_return.iter())
            .filter(|(e, r)| e.is_finite() && r.is_finite())
            .count();
        if complete < self.config.min_stocks {
            return Err(StrataError::InsufficientData(format!(
                "date {} factor {factor}: {complete} complete observations, need {}",
                section.date, self.config.min_stocks
            )));
        }
        Ok((
            calculate_ic(&residuals.values, &section.next_return),
            residuals.diagnostics,
        ))
    }

    /// IC of every factor on every date.
    ///
    /// Dates run in parallel and come back in chronological order. A failed
    /// (date, factor) slice gets NaN and a diagnostic.
    ///
    /// # Errors
    ///
    /// [`StrataError::MissingColumn`] if a factor is absent from the first
    /// cross-section.
    #[tracing::instrument(skip(self, sections, factors), fields(dates = sections.len(), factors = factors.len()))]
    pub fn ic_table(
        &self,
        sections: &[CrossSection],
        factors: &[&str],
    ) -> Result<(IcTable, Vec<Diagnostic>)> {
        if let Some(first) = sections.first() {
            for factor in factors {
                first.factor(factor)?;
            }
        }

        let mut ordered: Vec<&CrossSection> = sections.iter().collect();
        ordered.sort_by_key(|s| s.date);

        let rows: Vec<(Vec<f64>, Vec<Diagnostic>)> = ordered
            .par_iter()
            .map(|section| {
                let mut diagnostics = Vec::new();
                let ics = factors
                    .iter()
                    .map(|factor| match self.date_ic(section, factor) {
                        Ok((ic, mut diags)) => {
                            diagnostics.append(&mut diags);
                            if !ic.is_finite() {
                                diagnostics.push(Diagnostic::record(
                                    Provenance::date(section.date).with_factor(*factor),
                                    DiagnosticKind::Other,
                                    "IC undefined: constant residual or return",
                                ));
                            }
                            ic
                        }
                        Err(e) => {
                            diagnostics.push(Diagnostic::from_error(
                                Provenance::date(section.date).with_factor(*factor),
                                &e,
                            ));
                            f64::NAN
                        }
                    })
                    .collect();
                (ics, diagnostics)
            })
            .collect();

        let mut values = Array2::<f64>::from_elem((ordered.len(), factors.len()), f64::NAN);
        let mut diagnostics = Vec::new();
        for (t, (ics, mut diags)) in rows.into_iter().enumerate() {
            for (j, ic) in ics.into_iter().enumerate() {
                values[[t, j]] = ic;
            }
            diagnostics.append(&mut diags);
        }
        tracing::info!(
            dates = ordered.len(),
            failures = values.iter().filter(|v| !v.is_finite()).count(),
            "computed IC table"
        );

        let table = IcTable::new(
            ordered.iter().map(|s| s.date).collect(),
            factors.iter().map(|f| (*f).to_string()).collect(),
            values,
        )?;
        Ok((table, diagnostics))
    }
}
