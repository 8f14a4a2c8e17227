//! End-to-end research runs over a loaded panel.
//!
//! Each pipeline splits the panel into cross-sections, optionally cleans the
//! exposures, runs the component crates in order and gathers every diagnostic
//! they raise. Only schema problems and bad configuration abort a run.

use crate::config::StrataConfig;
use ndarray::Array1;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use strata_combine::{CombinationReport, SignalScore, composite_score, optimize_series};
use strata_core::stats::standardize;
use strata_core::{
    CrossSection, Date, Diagnostic, Panel, Result, StrataError, Symbol, preprocess,
};
use strata_eval::{
    FactorRegression, IcEstimator, IcMoments, IcSummary, IcTable, TValueSummary, factor_tvalues,
    rolling_moments,
};
use strata_groups::{
    GroupPerformance, GroupReturnSeries, GroupWeights, aggregate_panel, compound, forward_returns,
    group_weight_frame, summarize,
};

/// Output of a hierarchical backtest.
#[derive(Debug, Clone)]
pub struct GroupBacktest {
    /// Factor the groups were sorted on.
    pub factor: String,
    /// Group weights per date, chronological.
    pub weights: Vec<GroupWeights>,
    /// Group returns and their compounded curves.
    pub series: GroupReturnSeries,
    /// Summary per group plus the top-minus-bottom spread.
    pub performance: Vec<GroupPerformance>,
    /// Recoverable problems met along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl GroupBacktest {
    /// Long-format `(date, stock, group, weight)` table.
    pub fn weight_frame(&self) -> Result<DataFrame> {
        group_weight_frame(&self.weights)
    }
}

/// Output of a multi-factor combination run.
#[derive(Debug, Clone)]
pub struct CombinationRun {
    /// Residualized IC per date and factor.
    pub ic_table: IcTable,
    /// IC summary per factor.
    pub summaries: Vec<IcSummary>,
    /// Rolling IC moments fed to the optimizer.
    pub moments: Vec<IcMoments>,
    /// Optimized weights against the uniform baseline.
    pub report: CombinationReport,
    /// Blended signal of each solved date.
    pub composites: Vec<CompositeSignal>,
    /// Diagnostics from IC estimation; the report keeps its own.
    pub diagnostics: Vec<Diagnostic>,
}

/// Composite factor signal on one date.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeSignal {
    /// Rebalancing date.
    pub date: Date,
    /// Stocks in canonical order.
    pub stocks: Vec<Symbol>,
    /// Composite z-score per stock; NaN where any factor is missing.
    pub scores: Array1<f64>,
}

/// Output of a single-factor study.
#[derive(Debug, Clone, Serialize)]
pub struct SingleFactorAnalysis {
    /// Residualized IC summary.
    pub ic: IcSummary,
    /// Factor-return regression summary.
    pub tvalues: TValueSummary,
    /// Per-date factor returns and t-values.
    pub regressions: Vec<FactorRegression>,
    /// Recoverable problems met along the way.
    pub diagnostics: Vec<Diagnostic>,
}

/// Split the panel and apply preprocessing when it is enabled.
pub fn prepare_sections(
    panel: &Panel,
    factors: &[&str],
    config: &StrataConfig,
) -> Result<Vec<CrossSection>> {
    let sections = panel.cross_sections(factors)?;
    if !config.preprocess.enabled {
        return Ok(sections);
    }
    Ok(sections
        .par_iter()
        .map(|s| preprocess(s, &config.preprocess))
        .collect())
}

/// Blend each solved date's standardized exposures with its optimized weights.
///
/// Dates in the report without a matching cross-section are skipped.
///
/// # Errors
///
/// [`StrataError::MissingColumn`] if a cross-section lacks a reported factor.
pub fn composite_signals(
    sections: &[CrossSection],
    report: &CombinationReport,
) -> Result<Vec<CompositeSignal>> {
    let by_date: BTreeMap<Date, &CrossSection> = sections.iter().map(|s| (s.date, s)).collect();
    report
        .records
        .iter()
        .filter_map(|record| by_date.get(&record.date).map(|section| (record, *section)))
        .map(|(record, section)| {
            let signals = report
                .factors
                .iter()
                .map(|name| {
                    let (z, _) = standardize(&section.factor(name)?.to_vec());
                    Ok(SignalScore {
                        name: name.clone(),
                        scores: Array1::from_vec(z),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(CompositeSignal {
                date: record.date,
                stocks: section.stocks.clone(),
                scores: composite_score(&signals, &record.weights)?,
            })
        })
        .collect()
}

/// Industry-neutral quantile backtest of one factor.
#[tracing::instrument(skip(panel, config))]
pub fn hierarchical_backtest(
    panel: &Panel,
    factor: &str,
    config: &StrataConfig,
) -> Result<GroupBacktest> {
    config.validate()?;
    let sections = prepare_sections(panel, &[factor], config)?;
    let (weights, diagnostics) = aggregate_panel(&sections, factor, &config.groups);
    let series = compound(&weights, &forward_returns(&sections))?;
    let performance = summarize(&series, config.groups.periods_per_year);

    tracing::info!(
        dates = series.dates.len(),
        groups = series.group_count(),
        diagnostics = diagnostics.len(),
        "hierarchical backtest finished"
    );
    Ok(GroupBacktest {
        factor: factor.to_string(),
        weights,
        series,
        performance,
        diagnostics,
    })
}

/// Residualized IC, rolling moments and ICIR-optimal weights for several factors.
#[tracing::instrument(skip(panel, config))]
pub fn factor_combination(
    panel: &Panel,
    factors: &[&str],
    config: &StrataConfig,
) -> Result<CombinationRun> {
    config.validate()?;
    if factors.is_empty() {
        return Err(StrataError::InvalidData("no factors to combine".into()));
    }
    let sections = prepare_sections(panel, factors, config)?;
    let estimator = IcEstimator::new(config.ic.clone());
    let (ic_table, diagnostics) = estimator.ic_table(&sections, factors)?;
    let summaries = IcSummary::from_table(&ic_table);
    let moments = rolling_moments(&ic_table, config.ic.window)?;
    if moments.is_empty() {
        tracing::warn!(
            dates = ic_table.len(),
            window = config.ic.window,
            "not enough dates for a single rolling window"
        );
    }
    let report = optimize_series(&moments, &ic_table.factors, &config.optimizer)?;
    let composites = composite_signals(&sections, &report)?;

    Ok(CombinationRun {
        ic_table,
        summaries,
        moments,
        report,
        composites,
        diagnostics,
    })
}

/// IC and factor-return significance of one factor.
#[tracing::instrument(skip(panel, config))]
pub fn single_factor_analysis(
    panel: &Panel,
    factor: &str,
    config: &StrataConfig,
) -> Result<SingleFactorAnalysis> {
    config.validate()?;
    let sections = prepare_sections(panel, &[factor], config)?;
    let estimator = IcEstimator::new(config.ic.clone());
    let (ic_table, mut diagnostics) = estimator.ic_table(&sections, &[factor])?;
    let ic = IcSummary::from_table(&ic_table)
        .pop()
        .ok_or_else(|| StrataError::Other(format!("no IC series for {factor}")))?;
    let (regressions, regression_diagnostics) = factor_tvalues(&sections, factor);
    diagnostics.extend(regression_diagnostics);

    Ok(SingleFactorAnalysis {
        ic,
        tvalues: TValueSummary::calculate(factor, &regressions),
        regressions,
        diagnostics,
    })
}
