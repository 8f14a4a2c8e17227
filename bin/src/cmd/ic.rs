//! IC study command implementation.

use crate::cmd::{OutputFormat, load_panel, print_banner, print_diagnostics};
use anyhow::Result;
use std::path::Path;
use strata::{StrataConfig, single_factor_analysis};

/// Print the residualized IC summary and regression t-values of one factor.
pub(crate) fn run_ic(
    panel_path: &Path,
    factor: &str,
    config: &StrataConfig,
    format: OutputFormat,
) -> Result<()> {
    let panel = load_panel(panel_path)?;
    let analysis = single_factor_analysis(&panel, factor, config)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    print_banner("Factor IC Analysis");
    let ic = &analysis.ic;
    println!("Factor:                  {}", ic.factor);
    println!("Periods:                 {}", ic.n_obs);
    println!();
    println!("Rank IC (size/industry neutral)");
    println!("{}", "-".repeat(40));
    println!("  Mean IC:               {:>8.4}", ic.mean_ic);
    println!("  IC Std:                {:>8.4}", ic.std_ic);
    println!("  IR:                    {:>8.4}", ic.ir);
    println!("  IC > 0:                {:>7.1}%", ic.positive_share * 100.0);
    println!();

    let t = &analysis.tvalues;
    println!("Factor-return regression");
    println!("{}", "-".repeat(40));
    println!("  Mean |t|:              {:>8.4}", t.mean_abs_t);
    println!("  |t| > 2:               {:>7.1}%", t.significant_share * 100.0);
    println!("  mean(t)/std(t):        {:>8.4}", t.standardized_t);
    println!("  Mean factor return:    {:>8.4}%", t.mean_factor_return * 100.0);
    println!("  Factor return t-stat:  {:>8.4}", t.factor_return_t);
    println!();

    print_diagnostics(&analysis.diagnostics);
    Ok(())
}
