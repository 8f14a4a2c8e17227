//! Industry-neutral aggregation of per-industry group weights.
//!
//! Each industry bucket is sorted by factor exposure and allocated into
//! quantile groups. The bucket's weights are then scaled by the industry's
//! share of the benchmark. Because every bucket's columns sum to 1 before
//! scaling, each group column of the full cross-section sums to the total
//! benchmark weight, and every group reproduces the benchmark's industry mix.
//! Stocks without a finite exposure are not ranked and stay out of every group.

use crate::allocate::group_weight_matrix;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_core::{
    CrossSection, Date, Diagnostic, DiagnosticKind, Provenance, Result, StrataError, Symbol,
};

/// Configuration for hierarchical (quantile-group) backtests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Number of quantile groups per industry.
    pub group_count: usize,
    /// Rebalancing periods per year, used to annualize performance.
    pub periods_per_year: usize,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_count: 5,
            periods_per_year: 12, // monthly rebalancing
        }
    }
}

/// Benchmark weight of each industry on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryWeights {
    date: Date,
    weights: BTreeMap<String, f64>,
}

impl IndustryWeights {
    /// Sum the per-stock benchmark weights of a cross-section by industry.
    pub fn from_cross_section(section: &CrossSection) -> Self {
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        for (industry, &w) in section.industries.iter().zip(section.index_weight.iter()) {
            *weights.entry(industry.clone()).or_default() += w;
        }
        Self {
            date: section.date,
            weights,
        }
    }

    /// Use an externally supplied industry weight table.
    pub const fn from_map(date: Date, weights: BTreeMap<String, f64>) -> Self {
        Self { date, weights }
    }

    /// Date the table applies to.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Weight of one industry, if the table has an entry for it.
    pub fn get(&self, industry: &str) -> Option<f64> {
        self.weights.get(industry).copied()
    }

    /// Sum over all industries.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// Full cross-sectional group weights for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWeights {
    /// Rebalancing date.
    pub date: Date,
    /// Stocks in canonical order.
    pub stocks: Vec<Symbol>,
    /// Weights of shape `(stocks, groups)`.
    pub weights: Array2<f64>,
}

impl GroupWeights {
    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.weights.ncols()
    }

    /// Total weight of each group over the whole cross-section.
    pub fn group_totals(&self) -> Array1<f64> {
        self.weights.sum_axis(ndarray::Axis(0))
    }

    /// Long-format table `(date, stock, group, weight)`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        group_weight_frame(std::slice::from_ref(self))
    }
}

/// Result of aggregating one date.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// The group weight table.
    pub weights: GroupWeights,
    /// Recoverable problems found while aggregating.
    pub diagnostics: Vec<Diagnostic>,
}

/// Human-readable group labels, `group1` through `groupK`.
pub fn group_names(group_count: usize) -> Vec<String> {
    (1..=group_count).map(|g| format!("group{g}")).collect()
}

/// Build industry-neutral group weights for one cross-section.
///
/// Industries without an entry in `industry_weights` contribute zero weight
/// and produce a [`DiagnosticKind::MissingIndustryWeight`] diagnostic.
/// Stocks without a finite exposure keep an all-zero row, and each industry
/// holding any of them produces a [`DiagnosticKind::MissingExposure`]
/// diagnostic. The industry's weight goes to its ranked members.
///
/// # Errors
///
/// - [`StrataError::MissingColumn`] if the factor is not in the cross-section
/// - [`StrataError::Domain`] if `group_count` is zero
pub fn aggregate(
    section: &CrossSection,
    factor: &str,
    group_count: usize,
    industry_weights: &IndustryWeights,
) -> Result<Aggregation> {
    if group_count == 0 {
        return Err(StrataError::Domain("group_count must be at least 1".to_string()));
    }
    let exposures = section.factor(factor)?;
    let mut weights = Array2::<f64>::zeros((section.len(), group_count));
    let mut diagnostics = Vec::new();

    for (industry, rows) in section.industry_buckets() {
        if rows.is_empty() {
            continue;
        }
        let scale = match industry_weights.get(industry) {
            Some(w) => w,
            None => {
                diagnostics.push(Diagnostic::record(
                    Provenance::date(section.date)
                        .with_industry(industry)
                        .with_factor(factor),
                    DiagnosticKind::MissingIndustryWeight,
                    format!("no benchmark weight for industry {industry}; using zero"),
                ));
                0.0
            }
        };

        let (mut sorted, missing): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&i| exposures[i].is_finite());
        if !missing.is_empty() {
            diagnostics.push(Diagnostic::record(
                Provenance::date(section.date)
                    .with_industry(industry)
                    .with_factor(factor),
                DiagnosticKind::MissingExposure,
                format!("{} stocks without exposure left ungrouped", missing.len()),
            ));
        }
        if sorted.is_empty() {
            continue;
        }
        // stable, so ties keep stock order
        sorted.sort_by(|&a, &b| exposures[a].total_cmp(&exposures[b]));

        let block = group_weight_matrix(sorted.len(), group_count)?;
        for (position, &row) in sorted.iter().enumerate() {
            weights.row_mut(row).assign(&(&block.row(position) * scale));
        }
        tracing::trace!(date = %section.date, industry, stocks = sorted.len(), scale, "allocated industry");
    }

    Ok(Aggregation {
        weights: GroupWeights {
            date: section.date,
            stocks: section.stocks.clone(),
            weights,
        },
        diagnostics,
    })
}

/// Aggregate every date of a panel in parallel.
///
/// Results come back in the order of `sections`. A date that fails is left
/// out and reported as a diagnostic.
#[tracing::instrument(skip(sections, config), fields(dates = sections.len()))]
pub fn aggregate_panel(
    sections: &[CrossSection],
    factor: &str,
    config: &GroupConfig,
) -> (Vec<GroupWeights>, Vec<Diagnostic>) {
    let shards: Vec<Result<Aggregation>> = sections
        .par_iter()
        .map(|section| {
            let industry_weights = IndustryWeights::from_cross_section(section);
            aggregate(section, factor, config.group_count, &industry_weights)
        })
        .collect();

    let mut tables = Vec::with_capacity(shards.len());
    let mut diagnostics = Vec::new();
    for (section, shard) in sections.iter().zip(shards) {
        match shard {
            Ok(agg) => {
                diagnostics.extend(agg.diagnostics);
                tables.push(agg.weights);
            }
            Err(e) => diagnostics.push(Diagnostic::from_error(
                Provenance::date(section.date).with_factor(factor),
                &e,
            )),
        }
    }
    tracing::info!(factor, dates = tables.len(), "aggregated group weights");
    (tables, diagnostics)
}

/// Long-format table `(date, stock, group, weight)` over many dates.
pub fn group_weight_frame(tables: &[GroupWeights]) -> Result<DataFrame> {
    let rows: usize = tables.iter().map(|t| t.weights.len()).sum();
    let mut dates = Vec::with_capacity(rows);
    let mut stocks = Vec::with_capacity(rows);
    let mut groups: Vec<u32> = Vec::with_capacity(rows);
    let mut values = Vec::with_capacity(rows);

    for table in tables {
        let date = table.date.to_string();
        for (s, stock) in table.stocks.iter().enumerate() {
            for (g, &w) in table.weights.row(s).iter().enumerate() {
                dates.push(date.clone());
                stocks.push(stock.clone());
                groups.push(g as u32 + 1);
                values.push(w);
            }
        }
    }

    Ok(df! {
        "date" => dates,
        "stock" => stocks,
        "group" => groups,
        "weight" => values,
    }?)
}
