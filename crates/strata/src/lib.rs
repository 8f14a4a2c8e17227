#![doc(issue_tracker_base_url = "https://github.com/factordynamics/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # strata
//!
//! Industry-neutral group backtests and ICIR factor combination for
//! cross-sectional equity factors.
//!
//! strata is an umbrella crate that re-exports the strata sub-crates and adds
//! the end-to-end pipelines on top of them.
//!
//! ## Quick Start
//!
//! ```ignore
//! use strata::{Panel, StrataConfig, factor_combination, hierarchical_backtest};
//!
//! # fn main() -> strata::Result<()> {
//! let panel = Panel::read_csv("data/panel.csv")?;
//! let config = StrataConfig::default();
//!
//! // Five industry-neutral groups sorted on PE
//! let backtest = hierarchical_backtest(&panel, "pe_ratio_ttm", &config)?;
//!
//! // Does ICIR-optimal weighting beat equal weighting?
//! let run = factor_combination(&panel, &["pe_ratio_ttm", "pb_ratio"], &config)?;
//! println!("{} vs {}", run.report.mean_score(), run.report.mean_uniform_score());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`groups`] - Quantile group allocation, aggregation and compounding
//! - [`eval`] - Residualized IC, rolling moments and factor-return t-values
//! - [`combine`] - ICIR optimizer and composite signals
//! - [`config`] - Run configuration
//! - [`pipeline`] - End-to-end runs over a [`Panel`]

/// Version information for the strata crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod pipeline;

// Re-export error and data types
pub use strata_core::{
    CrossSection, Date, Diagnostic, DiagnosticKind, Panel, PreprocessConfig, Provenance, Result,
    StrataError, Symbol,
};

pub use config::StrataConfig;
pub use pipeline::{
    CombinationRun, CompositeSignal, GroupBacktest, SingleFactorAnalysis, composite_signals,
    factor_combination, hierarchical_backtest, prepare_sections, single_factor_analysis,
};

/// Hierarchical (quantile group) backtests.
///
/// ## Key Components
///
/// - **group_weight_matrix**: Sweep allocation of sorted stocks to groups
/// - **aggregate**: Industry-weighted group weights for one date
/// - **compound**: Group returns and cumulative curves
pub mod groups {
    pub use strata_groups::*;
}

/// Factor evaluation.
///
/// ## Key Components
///
/// - **residualize**: Size and industry neutralization by WLS
/// - **IcEstimator**: Per-date residualized rank IC
/// - **rolling_moments**: Trailing IC mean and covariance
pub mod eval {
    pub use strata_eval::*;
}

/// Factor combination.
///
/// ## Key Components
///
/// - **IcirOptimizer**: Long-only ICIR maximization against the uniform blend
/// - **composite_score**: Weighted, re-standardized composite signal
pub mod combine {
    pub use strata_combine::*;
}

/// Shared numeric helpers.
pub mod stats {
    pub use strata_core::stats::*;
}
