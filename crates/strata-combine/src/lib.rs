#![doc(issue_tracker_base_url = "https://github.com/factordynamics/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Factor combination for strata.
//!
//! Given each date's trailing IC mean and covariance, this crate picks
//! long-only factor weights that maximize the predicted ICIR, and reports the
//! uniform-weight score next to it so the two can be compared date by date.
//!
//! # Examples
//!
//! ```rust,ignore
//! use strata_combine::{OptimizerConfig, optimize_series};
//!
//! let report = optimize_series(&moments, &factors, &OptimizerConfig::default())?;
//! for record in &report.records {
//!     println!("{} {:.3} vs {:.3}", record.date, record.score, record.uniform_score);
//! }
//! ```

mod combiner;
mod optimizer;
mod report;

// Re-export main types
pub use combiner::{SignalScore, composite_score};
pub use optimizer::{IcirOptimizer, Optimized, OptimizerConfig, icir, project_to_simplex};
pub use report::{CombinationReport, FactorWeightRecord, optimize_series};
