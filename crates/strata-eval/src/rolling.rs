//! Trailing-window IC mean and covariance.

use crate::table::IcTable;
use ndarray::{Array1, Array2, Axis, Slice};
use serde::{Deserialize, Serialize};
use strata_core::stats::{mean, pairwise_covariance};
use strata_core::{Date, Result, StrataError};

/// Rolling IC moments at one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcMoments {
    /// Date at the end of the window.
    pub date: Date,
    /// Mean IC per factor over the window.
    pub mean: Array1<f64>,
    /// Sample covariance of the factor IC series over the window.
    pub cov: Array2<f64>,
}

/// Trailing mean and covariance of the IC table.
///
/// The window ending at row `t` covers rows `t - window + 1 ..= t`. Rows
/// before `window` are skipped, so `T` dates give `T - window` entries. Missing
/// ICs are skipped in the mean and handled pairwise in the covariance.
///
/// # Errors
///
/// [`StrataError::Domain`] for a zero window.
pub fn rolling_moments(table: &IcTable, window: usize) -> Result<Vec<IcMoments>> {
    if window == 0 {
        return Err(StrataError::Domain("rolling window must be at least 1".into()));
    }
    let n = table.factors.len();
    let moments: Vec<IcMoments> = (window..table.len())
        .map(|t| {
            let block = table
                .values
                .slice_axis(Axis(0), Slice::from(t + 1 - window..t + 1));
            let columns: Vec<Vec<f64>> = (0..n).map(|j| block.column(j).to_vec()).collect();
            let means: Array1<f64> = columns.iter().map(|c| mean(c)).collect();
            let cov = Array2::from_shape_fn((n, n), |(i, j)| {
                pairwise_covariance(&columns[i], &columns[j])
            });
            IcMoments {
                date: table.dates[t],
                mean: means,
                cov,
            }
        })
        .collect();
    tracing::debug!(window, entries = moments.len(), "computed rolling IC moments");
    Ok(moments)
}
