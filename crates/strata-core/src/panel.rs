//! The cleaned (date, stock) panel.
//!
//! `Panel` wraps a Polars DataFrame with one row per rebalancing date and
//! stock. It validates the schema once at construction and then splits the
//! table into typed [`CrossSection`]s on demand.

use crate::types::columns;
use crate::{CrossSection, Date, Result, StrataError};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Days between 0001-01-01 (CE) and 1970-01-01.
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// Container for the cleaned research panel.
///
/// # Expected Schema
///
/// - `date`: rebalancing date (`Date` dtype or `YYYY-MM-DD` strings)
/// - `stock`: stock identifier, unique per date
/// - `market_value`: float > 0
/// - `pri_indus_code`: primary industry code, any dtype castable to string
/// - `next_period_return`: forward return to the next rebalancing date
/// - `index_weight`: optional benchmark weight; uniform `1/n` when absent
/// - one float column per factor
///
/// # Example
///
/// ```no_run
/// use strata_core::Panel;
/// use polars::prelude::*;
///
/// let df = df! {
///     "date" => &["2011-01-31", "2011-01-31"],
///     "stock" => &["000001.XSHE", "600000.XSHG"],
///     "market_value" => &[1.5e10, 3.2e10],
///     "pri_indus_code" => &["J66", "J66"],
///     "next_period_return" => &[0.012, -0.004],
///     "pe_ratio_ttm" => &[8.1, 6.3],
/// }.unwrap();
///
/// let panel = Panel::new(df).unwrap();
/// let sections = panel.cross_sections(&["pe_ratio_ttm"]).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Panel {
    /// The underlying DataFrame.
    data: DataFrame,
}

impl Panel {
    /// Wrap a DataFrame, failing if a required column is missing.
    pub fn new(data: DataFrame) -> Result<Self> {
        let panel = Self { data };
        for name in columns::REQUIRED {
            if !panel.has_column(name) {
                return Err(StrataError::MissingColumn(name.to_string()));
            }
        }
        Ok(panel)
    }

    /// Read a panel from a CSV file with a header row.
    ///
    /// Stock and industry identifiers are read as strings so that codes such
    /// as `000001` keep their leading zeros.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let mut overrides = Schema::with_capacity(2);
        overrides.with_column(columns::STOCK.into(), DataType::String);
        overrides.with_column(columns::INDUSTRY.into(), DataType::String);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_schema_overwrite(Some(Arc::new(overrides)))
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;

        tracing::info!(
            path = %path.as_ref().display(),
            rows = df.height(),
            columns = df.width(),
            "loaded panel"
        );
        Self::new(df)
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of rows in the panel.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the column names in the panel.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Checks if a column exists in the panel.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }

    /// Split the panel into chronologically ordered cross-sections.
    ///
    /// Rows with a null industry, a missing forward return or a non-positive
    /// market value are dropped. Each requested factor becomes a column of the
    /// cross-section, with nulls mapped to `NaN`.
    pub fn cross_sections(&self, factors: &[&str]) -> Result<Vec<CrossSection>> {
        for factor in factors {
            if !self.has_column(factor) {
                return Err(StrataError::MissingColumn((*factor).to_string()));
            }
        }

        let dates = self.date_values()?;
        let stocks = self.string_values(columns::STOCK)?;
        let industries = self.string_values(columns::INDUSTRY)?;
        let market_value = self.float_values(columns::MARKET_VALUE)?;
        let next_return = self.float_values(columns::NEXT_RETURN)?;
        let index_weight = if self.has_column(columns::INDEX_WEIGHT) {
            Some(self.float_values(columns::INDEX_WEIGHT)?)
        } else {
            None
        };
        let factor_values = factors
            .iter()
            .map(|f| self.float_values(f))
            .collect::<Result<Vec<_>>>()?;

        let mut rows_by_date: BTreeMap<Date, Vec<usize>> = BTreeMap::new();
        let mut dropped = 0usize;
        for row in 0..self.len() {
            let keep = dates[row].is_some()
                && stocks[row].is_some()
                && industries[row].is_some()
                && next_return[row].is_finite()
                && market_value[row].is_finite()
                && market_value[row] > 0.0;
            match dates[row] {
                Some(date) if keep => rows_by_date.entry(date).or_default().push(row),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "dropped panel rows violating the input contract");
        }

        let mut sections = Vec::with_capacity(rows_by_date.len());
        for (date, rows) in rows_by_date {
            let n = rows.len();
            let weights = match index_weight {
                Some(ref w) => rows
                    .iter()
                    .map(|&r| if w[r].is_finite() { w[r] } else { 0.0 })
                    .collect(),
                None => vec![1.0 / n as f64; n],
            };

            let mut section = CrossSection::new(
                date,
                rows.iter().map(|&r| stocks[r].clone().unwrap_or_default()).collect(),
                rows.iter().map(|&r| industries[r].clone().unwrap_or_default()).collect(),
                rows.iter().map(|&r| market_value[r]).collect(),
                rows.iter().map(|&r| next_return[r]).collect(),
                weights,
            )?;

            // `CrossSection::new` sorted by stock; realign factor columns the same way.
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| stocks[rows[a]].cmp(&stocks[rows[b]]));
            for (name, values) in factors.iter().zip(&factor_values) {
                let column = order.iter().map(|&i| values[rows[i]]).collect();
                section = section.with_factor(*name, column)?;
            }
            sections.push(section);
        }

        tracing::debug!(dates = sections.len(), "split panel into cross-sections");
        Ok(sections)
    }

    fn date_values(&self) -> Result<Vec<Option<Date>>> {
        let series = self.data.column(columns::DATE)?.as_materialized_series();
        match series.dtype() {
            DataType::Date => {
                let days = series.cast(&DataType::Int32)?;
                Ok(days
                    .i32()?
                    .into_iter()
                    .map(|d| d.and_then(|d| Date::from_num_days_from_ce_opt(d + CE_TO_UNIX_EPOCH_DAYS)))
                    .collect())
            }
            DataType::String => series
                .str()?
                .into_iter()
                .map(|d| d.map(parse_date).transpose())
                .collect(),
            other => Err(StrataError::InvalidDate(format!(
                "unsupported date column dtype {other}"
            ))),
        }
    }

    fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self
            .data
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        Ok(series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    fn float_values(&self, name: &str) -> Result<Vec<f64>> {
        let series = self
            .data
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }
}

impl From<Panel> for DataFrame {
    fn from(panel: Panel) -> Self {
        panel.data
    }
}

impl AsRef<DataFrame> for Panel {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

/// Parse a date string in YYYY-MM-DD format.
pub fn parse_date(date_str: &str) -> Result<Date> {
    Date::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|e| StrataError::InvalidDate(format!("{date_str}: {e}")))
}
