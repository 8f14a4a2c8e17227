#![doc(issue_tracker_base_url = "https://github.com/factordynamics/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Factor evaluation for strata.
//!
//! This crate provides the tools for judging single factors over time:
//! - Size and industry neutralization of exposures by weighted least squares
//! - Residualized rank Information Coefficient (IC) per date
//! - Trailing IC mean and covariance for the combination optimizer
//! - IC summaries and factor-return t-values
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_eval::{IcEstimator, IcConfig, IcSummary, rolling_moments};
//!
//! let estimator = IcEstimator::new(IcConfig::default());
//! let (table, diagnostics) = estimator.ic_table(&sections, &["pe", "pb"])?;
//! let moments = rolling_moments(&table, estimator.config().window)?;
//! let summaries = IcSummary::from_table(&table);
//! ```

pub mod ic;
pub mod metrics;
pub mod regression;
pub mod residual;
pub mod rolling;
pub mod table;
pub mod wls;

// Re-export main types
pub use ic::calculate_ic;
pub use metrics::IcSummary;
pub use regression::{FactorRegression, TValueSummary, factor_regression, factor_tvalues};
pub use residual::{Residuals, residualize};
pub use rolling::{IcMoments, rolling_moments};
pub use table::{IcConfig, IcEstimator, IcTable};
