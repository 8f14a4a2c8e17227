//! Quantile-group weight allocation within one industry.
//!
//! Given an industry's stocks sorted ascending by factor exposure, split them
//! into `group_count` ordinal groups. When the stock count is not a multiple of
//! the group count, boundary stocks are shared between neighbouring groups so
//! that every group gets exactly the same total membership.

use ndarray::Array2;
use strata_core::{Result, StrataError};

/// Intermediate stocks × groups weight matrix for one industry.
///
/// Every group column sums to 1. Every stock row sums to `groups / stocks`.
/// Each stock carries the same total membership, and that total is spread over
/// adjacent groups.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAllocation {
    weights: Array2<f64>,
}

impl GroupAllocation {
    /// Allocate `stock_count` sorted stocks into `group_count` groups.
    pub fn new(stock_count: usize, group_count: usize) -> Result<Self> {
        Ok(Self {
            weights: group_weight_matrix(stock_count, group_count)?,
        })
    }

    /// Column-normalized weights, shape `(stocks, groups)`.
    pub const fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Consume the allocation and return its weight matrix.
    pub fn into_weights(self) -> Array2<f64> {
        self.weights
    }

    /// Per-stock membership fractions: rows rescaled to sum to 1.
    pub fn membership(&self) -> Array2<f64> {
        let (stocks, groups) = self.weights.dim();
        &self.weights * (stocks as f64 / groups as f64)
    }

    /// Number of stocks.
    pub fn stock_count(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.weights.ncols()
    }
}

/// Build the stocks × groups weight matrix for stocks pre-sorted by exposure.
///
/// The result depends only on the two counts. Columns sum to 1.
///
/// The sweep distributes `cols` indivisible units over `rows` buckets like
/// integer long division, where `rows = min(stocks, groups)` and
/// `cols = max(stocks, groups)`. Each row places `cols` units and each column
/// receives `rows` units. A row tops up the column the previous row left
/// partial, fills whole columns, and leaves its remainder in the next column.
/// The sweep matrix is transposed when stocks outnumber groups, so stocks
/// always end up on the rows.
///
/// # Errors
///
/// [`StrataError::Domain`] if either count is zero.
///
/// # Example
///
/// ```
/// use strata_groups::group_weight_matrix;
///
/// let w = group_weight_matrix(7, 5).unwrap();
/// assert_eq!(w.dim(), (7, 5));
/// for column in w.columns() {
///     assert!((column.sum() - 1.0).abs() < 1e-12);
/// }
/// ```
pub fn group_weight_matrix(stock_count: usize, group_count: usize) -> Result<Array2<f64>> {
    if stock_count == 0 || group_count == 0 {
        return Err(StrataError::Domain(format!(
            "allocation needs at least one stock and one group, got {stock_count} stocks and {group_count} groups"
        )));
    }

    let rows = stock_count.min(group_count);
    let cols = stock_count.max(group_count);
    let row_budget = cols;
    let col_budget = rows;

    let mut sweep = Array2::<f64>::zeros((rows, cols));
    let mut remaining = 0usize;
    let mut j = 0usize;
    for i in 0..rows {
        let start = col_budget - remaining;
        sweep[[i, j]] = start as f64;
        let full = (row_budget - start) / col_budget;
        for k in (j + 1)..(j + 1 + full).min(cols) {
            sweep[[i, k]] = col_budget as f64;
        }
        remaining = row_budget - full * col_budget - start;
        j += 1 + full;
        if j < cols {
            sweep[[i, j]] = remaining as f64;
        }
    }

    let mut weights = if group_count > stock_count {
        sweep
    } else {
        sweep.reversed_axes()
    };
    for mut column in weights.columns_mut() {
        let total = column.sum();
        column /= total;
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_columns_sum_to_one(w: &Array2<f64>) {
        for column in w.columns() {
            assert_abs_diff_eq!(column.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sums_over_grid() {
        for stocks in 1..=40 {
            for groups in 1..=10 {
                let alloc = GroupAllocation::new(stocks, groups).unwrap();
                assert_eq!(alloc.weights().dim(), (stocks, groups));
                assert_columns_sum_to_one(alloc.weights());
                assert!(alloc.weights().iter().all(|&x| x >= 0.0));
                for row in alloc.membership().rows() {
                    assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_seven_stocks_five_groups() {
        let w = group_weight_matrix(7, 5).unwrap();
        assert_columns_sum_to_one(&w);
        for row in w.rows() {
            let nonzero: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, x)| **x > 0.0)
                .map(|(g, _)| g)
                .collect();
            assert!(!nonzero.is_empty() && nonzero.len() <= 2);
            if nonzero.len() == 2 {
                assert_eq!(nonzero[1], nonzero[0] + 1);
            }
        }
        // first stock sits wholly in group 0, second straddles groups 0 and 1
        assert_abs_diff_eq!(w[[0, 0]], 5.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[[1, 0]], 2.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[[1, 1]], 3.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[[6, 4]], 5.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_at_most_two_adjacent_groups_when_stocks_outnumber_groups() {
        for stocks in 5..=60 {
            let w = group_weight_matrix(stocks, 5).unwrap();
            for row in w.rows() {
                let first = row.iter().position(|&x| x > 0.0).unwrap();
                let last = row.iter().rposition(|&x| x > 0.0).unwrap();
                assert!(last - first <= 1);
            }
        }
    }

    #[test]
    fn test_square_is_identity() {
        for k in 1..=8 {
            let w = group_weight_matrix(k, k).unwrap();
            assert_eq!(w, Array2::<f64>::eye(k));
        }
    }

    #[test]
    fn test_single_group() {
        let w = group_weight_matrix(4, 1).unwrap();
        assert_eq!(w.dim(), (4, 1));
        for &x in w.iter() {
            assert_abs_diff_eq!(x, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fewer_stocks_than_groups() {
        let w = group_weight_matrix(3, 5).unwrap();
        assert_columns_sum_to_one(&w);
        // middle stock alone fills the middle group
        assert_abs_diff_eq!(w[[1, 2]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[[0, 1]], 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(w[[1, 1]], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_monotone_group_centres() {
        let w = group_weight_matrix(13, 5).unwrap();
        let centre = |s: usize| -> f64 {
            let row = w.row(s);
            row.iter().enumerate().map(|(g, x)| g as f64 * x).sum::<f64>() / row.sum()
        };
        for s in 1..13 {
            assert!(centre(s) >= centre(s - 1));
        }
    }

    #[test]
    fn test_zero_counts_rejected() {
        assert!(matches!(group_weight_matrix(0, 5), Err(StrataError::Domain(_))));
        assert!(matches!(GroupAllocation::new(5, 0), Err(StrataError::Domain(_))));
    }
}
