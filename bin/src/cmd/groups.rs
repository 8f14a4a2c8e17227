//! Group backtest command implementation.

use crate::cmd::{OutputFormat, load_panel, print_banner, print_diagnostics};
use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, SerWriter};
use std::fs::File;
use std::path::Path;
use strata::{StrataConfig, hierarchical_backtest};

/// Run an industry-neutral group backtest and print per-group performance.
pub(crate) fn run_groups(
    panel_path: &Path,
    factor: &str,
    config: &StrataConfig,
    weights_out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let panel = load_panel(panel_path)?;
    let backtest = hierarchical_backtest(&panel, factor, config)?;

    if let Some(path) = weights_out {
        let mut frame = backtest.weight_frame()?;
        let mut file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        CsvWriter::new(&mut file).finish(&mut frame)?;
        tracing::info!(path = %path.display(), rows = frame.height(), "wrote group weights");
    }

    if format == OutputFormat::Json {
        let out = serde_json::json!({
            "factor": backtest.factor,
            "dates": backtest.series.dates,
            "performance": backtest.performance,
            "diagnostics": backtest.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_banner("Hierarchical Backtest");
    println!("Factor:  {}", backtest.factor);
    println!("Groups:  {}", backtest.series.group_count());
    if let (Some(first), Some(last)) = (backtest.series.dates.first(), backtest.series.dates.last())
    {
        println!("Period:  {first} to {last} ({} dates)", backtest.series.dates.len());
    }
    println!();

    println!(
        "{:<18} {:>10} {:>10} {:>10} {:>8} {:>8}",
        "Group", "Total", "Ann.Ret", "Ann.Vol", "Sharpe", "MaxDD"
    );
    println!("{}", "-".repeat(68));
    for p in &backtest.performance {
        println!(
            "{:<18} {:>9.2}% {:>9.2}% {:>9.2}% {:>8.2} {:>7.2}%",
            p.group,
            p.total_return * 100.0,
            p.annualized_return * 100.0,
            p.annualized_volatility * 100.0,
            p.sharpe_ratio,
            p.max_drawdown * 100.0
        );
    }
    println!();
    print_diagnostics(&backtest.diagnostics);
    Ok(())
}
