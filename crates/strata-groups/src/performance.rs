//! Summary statistics for group return series.

use crate::aggregate::group_names;
use crate::compound::{GroupReturnSeries, compound_returns};
use ndarray::{ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use strata_core::stats::{mean, sample_std};

/// Label used for the top-minus-bottom spread portfolio.
pub const SPREAD_LABEL: &str = "top_minus_bottom";

/// Performance of one group (or the spread) over the whole backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPerformance {
    /// Group label, `group1`..`groupK` or [`SPREAD_LABEL`].
    pub group: String,
    /// Number of periods.
    pub periods: usize,
    /// Final cumulative return.
    pub total_return: f64,
    /// Geometric annualized return.
    pub annualized_return: f64,
    /// Annualized volatility of period returns.
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio, zero risk-free rate.
    pub sharpe_ratio: f64,
    /// Maximum drawdown of the cumulative curve.
    pub max_drawdown: f64,
}

impl GroupPerformance {
    /// Summarize one stream of period returns.
    pub fn from_returns(group: impl Into<String>, returns: &[f64], periods_per_year: usize) -> Self {
        let cumulative = compound_returns(ArrayView1::from(returns).insert_axis(Axis(1)))
            .column(0)
            .to_vec();
        let total_return = cumulative.last().copied().unwrap_or(0.0);
        let annualized_return = if returns.is_empty() {
            f64::NAN
        } else {
            (1.0 + total_return).powf(periods_per_year as f64 / returns.len() as f64) - 1.0
        };

        Self {
            group: group.into(),
            periods: returns.len(),
            total_return,
            annualized_return,
            annualized_volatility: sample_std(returns) * (periods_per_year as f64).sqrt(),
            sharpe_ratio: calculate_sharpe(returns, periods_per_year),
            max_drawdown: calculate_max_drawdown(&cumulative),
        }
    }
}

/// Annualized Sharpe ratio of period returns; NaN without dispersion.
pub fn calculate_sharpe(returns: &[f64], periods_per_year: usize) -> f64 {
    let std = sample_std(returns);
    if !std.is_finite() || std == 0.0 {
        return f64::NAN;
    }
    mean(returns) / std * (periods_per_year as f64).sqrt()
}

/// Largest peak-to-trough loss of a cumulative return curve, as a fraction.
pub fn calculate_max_drawdown(cumulative_returns: &[f64]) -> f64 {
    let mut max_dd = 0.0;
    let mut peak = 0.0;

    for &cum_ret in cumulative_returns {
        if cum_ret > peak {
            peak = cum_ret;
        }
        let dd = (peak - cum_ret) / (1.0 + peak);
        if dd > max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

/// Per-group summaries followed by the top-minus-bottom spread.
pub fn summarize(series: &GroupReturnSeries, periods_per_year: usize) -> Vec<GroupPerformance> {
    let mut out: Vec<GroupPerformance> = group_names(series.group_count())
        .into_iter()
        .enumerate()
        .map(|(g, name)| {
            GroupPerformance::from_returns(name, &series.returns.column(g).to_vec(), periods_per_year)
        })
        .collect();
    if series.group_count() > 1 {
        out.push(GroupPerformance::from_returns(
            SPREAD_LABEL,
            &series.spread().to_vec(),
            periods_per_year,
        ));
    }
    out
}
