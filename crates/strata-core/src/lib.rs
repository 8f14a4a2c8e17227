#![doc(issue_tracker_base_url = "https://github.com/factordynamics/strata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the strata factor research toolkit.
//!
//! This crate holds what every other strata crate shares: the cleaned
//! research [`Panel`] and its per-date [`CrossSection`]s, the [`StrataError`]
//! taxonomy and [`Diagnostic`] records, statistics helpers, a small Cholesky
//! solver, and cross-sectional preprocessing.

/// The version of the strata-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod diagnostic;
pub mod error;
pub mod linalg;
pub mod panel;
pub mod preprocess;
pub mod stats;
pub mod types;

// Re-exports
pub use diagnostic::{Diagnostic, DiagnosticKind, Provenance};
pub use error::{Result, StrataError};
pub use panel::{Panel, parse_date};
pub use preprocess::{PreprocessConfig, preprocess};
pub use types::{CrossSection, Date, Symbol, columns};
