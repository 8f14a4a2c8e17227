//! Recoverable-failure records.
//!
//! Per-date, per-industry and per-factor failures never abort a run. They are
//! captured as [`Diagnostic`] values that say which slice of the panel failed
//! and why, and are logged at `warn` level when created.

use crate::{Date, StrataError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The slice of the panel a result or failure belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Rebalancing date.
    pub date: Option<Date>,
    /// Industry code.
    pub industry: Option<String>,
    /// Factor name.
    pub factor: Option<String>,
}

impl Provenance {
    /// Provenance for a whole date.
    pub const fn date(date: Date) -> Self {
        Self {
            date: Some(date),
            industry: None,
            factor: None,
        }
    }

    /// Attach an industry code.
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Attach a factor name.
    pub fn with_factor(mut self, factor: impl Into<String>) -> Self {
        self.factor = Some(factor.into());
        self
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if let Some(date) = self.date {
            parts.push(format!("date={date}"));
        }
        if let Some(ref industry) = self.industry {
            parts.push(format!("industry={industry}"));
        }
        if let Some(ref factor) = self.factor {
            parts.push(format!("factor={factor}"));
        }
        write!(f, "[{}]", parts.join(" "))
    }
}

/// Category of a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Invalid allocator input.
    Domain,
    /// Collinear regressors; offending rows dropped or the date skipped.
    RankDeficientRegression,
    /// Optimizer input near-singular; date skipped.
    IllConditionedCovariance,
    /// Industry missing from the benchmark weight table; treated as zero weight.
    MissingIndustryWeight,
    /// Stock without a finite factor exposure; left out of the groups.
    MissingExposure,
    /// Optimizer hit its iteration or time cap; uniform weights emitted.
    SolverNonConvergence,
    /// Too few observations for the requested statistic.
    InsufficientData,
    /// Anything else.
    Other,
}

/// A recorded, non-fatal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Where it happened.
    pub provenance: Provenance,
    /// What kind of failure.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic and emit it as a `warn` event.
    pub fn record(provenance: Provenance, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(%provenance, ?kind, "{message}");
        Self {
            provenance,
            kind,
            message,
        }
    }

    /// Classify an error and record it.
    pub fn from_error(provenance: Provenance, err: &StrataError) -> Self {
        let kind = match err {
            StrataError::Domain(_) => DiagnosticKind::Domain,
            StrataError::RankDeficientRegression(_) => DiagnosticKind::RankDeficientRegression,
            StrataError::IllConditionedCovariance(_) => DiagnosticKind::IllConditionedCovariance,
            StrataError::MissingIndustryWeight(_) => DiagnosticKind::MissingIndustryWeight,
            StrataError::InsufficientData(_) => DiagnosticKind::InsufficientData,
            _ => DiagnosticKind::Other,
        };
        Self::record(provenance, kind, err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.provenance, self.kind, self.message)
    }
}
