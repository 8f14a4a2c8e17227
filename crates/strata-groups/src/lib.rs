#![doc(issue_tracker_base_url = "https://github.com/factordynamics/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Hierarchical (quantile group) backtests for strata.
//!
//! Within each industry, stocks are sorted by factor exposure and split into
//! ordinal groups with fractional boundary weights. The per-industry matrices
//! are scaled by industry index weight, so each group mirrors the index's
//! industry mix. Group returns are then compounded over time.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_groups::{GroupConfig, aggregate_panel, compound, forward_returns, summarize};
//!
//! let (tables, diagnostics) = aggregate_panel(&sections, "pe", &GroupConfig::default());
//! let series = compound(&tables, &forward_returns(&sections))?;
//! let perf = summarize(&series, 12);
//! ```

pub mod aggregate;
pub mod allocate;
pub mod compound;
pub mod performance;

// Re-export main types
pub use aggregate::{
    Aggregation, GroupConfig, GroupWeights, IndustryWeights, aggregate, aggregate_panel,
    group_names, group_weight_frame,
};
pub use allocate::{GroupAllocation, group_weight_matrix};
pub use compound::{
    ForwardReturns, GroupReturnSeries, compound, compound_returns, forward_returns, group_returns,
};
pub use performance::{GroupPerformance, SPREAD_LABEL, summarize};
