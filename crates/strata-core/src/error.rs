//! Error types for the strata toolkit.
//!
//! A single error enum covers the whole workspace. Variants that describe a
//! numeric failure on one slice of the panel (a date, an industry, a factor)
//! are recoverable: the pipelines turn them into [`Diagnostic`](crate::Diagnostic)
//! records and keep going. Only schema violations are fatal.

use thiserror::Error;

/// The main error type for strata operations.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Invalid input to a numeric routine (for example a zero group count).
    #[error("Domain error: {0}")]
    Domain(String),

    /// The regressors of a cross-sectional regression are collinear.
    #[error("Rank-deficient regression: {0}")]
    RankDeficientRegression(String),

    /// A covariance matrix is singular or too close to singular to divide by.
    #[error("Ill-conditioned covariance: {0}")]
    IllConditionedCovariance(String),

    /// An industry has no benchmark weight entry.
    #[error("Missing industry weight: {0}")]
    MissingIndustryWeight(String),

    /// Error when a required column is missing from the panel.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error when a date cannot be parsed.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error while reading configuration or panel files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for StrataError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for StrataError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
