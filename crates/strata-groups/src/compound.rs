//! Group-level period returns and their compounding over time.

use crate::aggregate::{GroupWeights, group_names};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use polars::prelude::*;
use std::collections::BTreeMap;
use strata_core::{CrossSection, Date, Result, StrataError, Symbol};

/// Per-date group returns and cumulative performance.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReturnSeries {
    /// Rebalancing dates, ascending.
    pub dates: Vec<Date>,
    /// Period returns, shape `(dates, groups)`.
    pub returns: Array2<f64>,
    /// Cumulative returns, shape `(dates, groups)`.
    pub cumulative: Array2<f64>,
}

impl GroupReturnSeries {
    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.returns.ncols()
    }

    /// Top-minus-bottom group return per period.
    pub fn spread(&self) -> Array1<f64> {
        let k = self.group_count();
        if k == 0 {
            return Array1::zeros(self.dates.len());
        }
        &self.returns.column(k - 1) - &self.returns.column(0)
    }

    /// Wide table: `date`, then `groupK` and `groupK_cum` per group.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut frame_columns = Vec::with_capacity(1 + 2 * self.group_count());
        frame_columns.push(Column::new(
            "date".into(),
            self.dates.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ));
        for (g, name) in group_names(self.group_count()).into_iter().enumerate() {
            frame_columns.push(Column::new(
                name.as_str().into(),
                self.returns.column(g).to_vec(),
            ));
            frame_columns.push(Column::new(
                format!("{name}_cum").into(),
                self.cumulative.column(g).to_vec(),
            ));
        }
        Ok(DataFrame::new(frame_columns)?)
    }
}

/// Next-period returns of one date, keyed to its stocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardReturns {
    /// Stocks in canonical order.
    pub stocks: Vec<Symbol>,
    /// Return of each stock to the next rebalancing date.
    pub returns: Array1<f64>,
}

impl ForwardReturns {
    /// Forward returns of a cross-section.
    pub fn from_cross_section(section: &CrossSection) -> Self {
        Self {
            stocks: section.stocks.clone(),
            returns: section.next_return.clone(),
        }
    }
}

/// Inner product of each group's weights with the forward returns.
///
/// Stocks with zero weight in a group do not contribute to it, so a missing
/// return on an ungrouped stock stays out of every group.
///
/// # Errors
///
/// [`StrataError::InvalidData`] if the forward returns cover different stocks
/// than the weights.
pub fn group_returns(weights: &GroupWeights, forward: &ForwardReturns) -> Result<Array1<f64>> {
    if forward.stocks != weights.stocks || forward.returns.len() != weights.stocks.len() {
        return Err(StrataError::InvalidData(format!(
            "date {}: forward returns cover {} stocks that do not match the {} weighted stocks",
            weights.date,
            forward.stocks.len(),
            weights.stocks.len()
        )));
    }
    let mut totals = Array1::<f64>::zeros(weights.group_count());
    for (row, &r) in weights.weights.rows().into_iter().zip(forward.returns.iter()) {
        for (total, &w) in totals.iter_mut().zip(row.iter()) {
            if w != 0.0 {
                *total += w * r;
            }
        }
    }
    Ok(totals)
}

/// Compound period returns down each column.
///
/// `cum[0] = r[0]` and `cum[t] = (1 + cum[t-1]) * (1 + r[t]) - 1`.
pub fn compound_returns(returns: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut cumulative = Array2::<f64>::zeros(returns.raw_dim());
    for (g, column) in returns.axis_iter(Axis(1)).enumerate() {
        let mut wealth = 1.0;
        for (t, &r) in column.iter().enumerate() {
            wealth *= 1.0 + r;
            cumulative[[t, g]] = wealth - 1.0;
        }
    }
    cumulative
}

/// Forward returns of every cross-section, keyed by date.
pub fn forward_returns(sections: &[CrossSection]) -> BTreeMap<Date, ForwardReturns> {
    sections
        .iter()
        .map(|s| (s.date, ForwardReturns::from_cross_section(s)))
        .collect()
}

/// Turn per-date group weights and forward returns into a return series.
///
/// Dates are processed in chronological order whatever order the weight
/// tables arrive in.
///
/// # Errors
///
/// [`StrataError::InvalidData`] if a date has no forward returns, if its
/// stocks disagree with the weights, or if dates disagree on the group count.
pub fn compound(
    weights_by_date: &[GroupWeights],
    forward_returns_by_date: &BTreeMap<Date, ForwardReturns>,
) -> Result<GroupReturnSeries> {
    let mut ordered: Vec<&GroupWeights> = weights_by_date.iter().collect();
    ordered.sort_by_key(|w| w.date);

    let k = ordered.first().map_or(0, |w| w.group_count());
    let mut returns = Array2::<f64>::zeros((ordered.len(), k));
    for (t, table) in ordered.iter().enumerate() {
        if table.group_count() != k {
            return Err(StrataError::InvalidData(format!(
                "date {}: {} groups, expected {k}",
                table.date,
                table.group_count()
            )));
        }
        let fwd = forward_returns_by_date.get(&table.date).ok_or_else(|| {
            StrataError::InvalidData(format!("no forward returns for {}", table.date))
        })?;
        returns.row_mut(t).assign(&group_returns(table, fwd)?);
    }

    let cumulative = compound_returns(returns.view());
    Ok(GroupReturnSeries {
        dates: ordered.iter().map(|w| w.date).collect(),
        returns,
        cumulative,
    })
}
