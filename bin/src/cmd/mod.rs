//! CLI subcommand modules.
//!
//! This module contains the implementations for all strata CLI subcommands.

pub(crate) mod combine;
pub(crate) mod groups;
pub(crate) mod ic;

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;
use strata::{Diagnostic, Panel, StrataConfig};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables
    Text,
    /// One JSON document on stdout
    Json,
}

/// Load the config file if one was given, otherwise the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<StrataConfig> {
    let config = match path {
        Some(p) => StrataConfig::from_json_file(p)
            .with_context(|| format!("reading config {}", p.display()))?,
        None => StrataConfig::default(),
    };
    Ok(config)
}

pub(crate) fn load_panel(path: &Path) -> Result<Panel> {
    Panel::read_csv(path).with_context(|| format!("reading panel {}", path.display()))
}

pub(crate) fn print_banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{title:^62}║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

pub(crate) fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("Diagnostics ({}):", diagnostics.len());
    println!("{}", "-".repeat(64));
    for d in diagnostics.iter().take(20) {
        println!("  {d}");
    }
    if diagnostics.len() > 20 {
        println!("  ... {} more", diagnostics.len() - 20);
    }
    println!();
}
