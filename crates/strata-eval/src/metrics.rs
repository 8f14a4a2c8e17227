//! Factor quality metrics computed from an IC series.
//!
//! - IC mean and standard deviation
//! - Information Ratio (IR): mean IC / std IC
//! - Share of periods with a positive IC and the cumulative IC curve

use crate::table::IcTable;
use serde::{Deserialize, Serialize};
use strata_core::stats::{mean, sample_std};

/// Summary of one factor's IC series.
///
/// IR measures the consistency of a factor's predictive power.
/// Higher IR indicates more reliable factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcSummary {
    /// Factor name
    pub factor: String,
    /// Number of finite ICs
    pub n_obs: usize,
    /// Mean IC
    pub mean_ic: f64,
    /// Standard deviation of IC
    pub std_ic: f64,
    /// Information Ratio
    pub ir: f64,
    /// Fraction of finite ICs above zero
    pub positive_share: f64,
    /// Running sum of ICs, missing periods contributing zero
    pub cumulative_ic: Vec<f64>,
}

impl IcSummary {
    /// Summarize an IC series.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_eval::IcSummary;
    ///
    /// let summary = IcSummary::calculate("pe", &[0.05, 0.03, 0.07, f64::NAN, 0.06]);
    /// assert_eq!(summary.n_obs, 4);
    /// assert_eq!(summary.positive_share, 1.0);
    /// ```
    pub fn calculate(factor: impl Into<String>, ic_series: &[f64]) -> Self {
        let n_obs = ic_series.iter().filter(|x| x.is_finite()).count();
        let mean_ic = mean(ic_series);
        let std_ic = sample_std(ic_series);
        let ir = if std_ic.is_finite() && std_ic > 0.0 {
            mean_ic / std_ic
        } else {
            f64::NAN
        };
        let positive_share = if n_obs == 0 {
            f64::NAN
        } else {
            ic_series.iter().filter(|&&x| x > 0.0).count() as f64 / n_obs as f64
        };
        let cumulative_ic = ic_series
            .iter()
            .scan(0.0, |acc, &x| {
                if x.is_finite() {
                    *acc += x;
                }
                Some(*acc)
            })
            .collect();

        Self {
            factor: factor.into(),
            n_obs,
            mean_ic,
            std_ic,
            ir,
            positive_share,
            cumulative_ic,
        }
    }

    /// One summary per factor column of an IC table.
    pub fn from_table(table: &IcTable) -> Vec<Self> {
        table
            .factors
            .iter()
            .enumerate()
            .map(|(j, factor)| Self::calculate(factor.as_str(), &table.values.column(j).to_vec()))
            .collect()
    }
}
