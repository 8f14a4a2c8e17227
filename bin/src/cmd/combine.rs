//! Factor combination command implementation.

use crate::cmd::{OutputFormat, load_panel, print_banner, print_diagnostics};
use anyhow::Result;
use std::path::Path;
use strata::{StrataConfig, factor_combination};

/// Optimize factor weights per date and compare them with uniform weights.
pub(crate) fn run_combine(
    panel_path: &Path,
    factors: &[String],
    config: &StrataConfig,
    format: OutputFormat,
) -> Result<()> {
    let panel = load_panel(panel_path)?;
    let names: Vec<&str> = factors.iter().map(String::as_str).collect();
    let run = factor_combination(&panel, &names, config)?;

    if format == OutputFormat::Json {
        let out = serde_json::json!({
            "summaries": run.summaries,
            "report": run.report,
            "diagnostics": run.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_banner("Factor Combination");
    println!("Factors: {}", factors.join(", "));
    println!("Window:  {} periods", config.ic.window);
    println!();

    println!("{:<20} {:>8} {:>8} {:>8}", "Factor", "Mean IC", "IC Std", "IR");
    println!("{}", "-".repeat(48));
    for s in &run.summaries {
        println!("{:<20} {:>8.4} {:>8.4} {:>8.4}", s.factor, s.mean_ic, s.std_ic, s.ir);
    }
    println!();

    let report = &run.report;
    print!("{:<12}", "Date");
    for f in &report.factors {
        print!(" {:>10.10}", f);
    }
    println!(" {:>8} {:>8}", "ICIR", "Uniform");
    println!("{}", "-".repeat(12 + 11 * report.factors.len() + 18));
    for r in &report.records {
        print!("{:<12}", r.date.to_string());
        for w in &r.weights {
            print!(" {:>10.4}", w);
        }
        let flag = if r.converged { "" } else { " *" };
        println!(" {:>8.4} {:>8.4}{flag}", r.score, r.uniform_score);
    }
    println!();

    if !report.is_empty() {
        println!(
            "Mean ICIR: optimized {:.4}, uniform {:.4}",
            report.mean_score(),
            report.mean_uniform_score()
        );
        println!();
    }
    print_diagnostics(&run.diagnostics);
    print_diagnostics(&report.diagnostics);
    Ok(())
}
