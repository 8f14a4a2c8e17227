//! strata CLI binary.
//!
//! Provides a command-line interface for group backtests, IC studies and
//! factor combination over a panel CSV.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::OutputFormat;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Industry-neutral group backtests and ICIR factor combination", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Clip, standardize and fill factor exposures before use
    #[arg(long, global = true)]
    preprocess: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Industry-neutral quantile group backtest of one factor
    Groups {
        /// Panel CSV file
        #[arg(long)]
        panel: PathBuf,

        /// Factor column to sort on
        #[arg(short, long)]
        factor: String,

        /// Number of groups
        #[arg(short, long)]
        groups: Option<usize>,

        /// Write the full (date, stock, group, weight) table to this CSV
        #[arg(long)]
        weights_out: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Residualized IC and factor-return t-values of one factor
    Ic {
        /// Panel CSV file
        #[arg(long)]
        panel: PathBuf,

        /// Factor column to study
        #[arg(short, long)]
        factor: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// ICIR-optimal combination of several factors
    Combine {
        /// Panel CSV file
        #[arg(long)]
        panel: PathBuf,

        /// Factor columns to combine
        #[arg(short, long, value_delimiter = ',', required = true)]
        factors: Vec<String>,

        /// Rolling IC window in periods
        #[arg(short, long)]
        window: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "strata=debug" } else { "strata=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = cmd::load_config(cli.config.as_deref())?;
    if cli.preprocess {
        config.preprocess.enabled = true;
    }

    match cli.command {
        Commands::Groups {
            panel,
            factor,
            groups,
            weights_out,
            format,
        } => {
            if let Some(k) = groups {
                config.groups.group_count = k;
            }
            cmd::groups::run_groups(&panel, &factor, &config, weights_out.as_deref(), format)?;
        }
        Commands::Ic {
            panel,
            factor,
            format,
        } => {
            cmd::ic::run_ic(&panel, &factor, &config, format)?;
        }
        Commands::Combine {
            panel,
            factors,
            window,
            format,
        } => {
            if let Some(w) = window {
                config.ic.window = w;
            }
            cmd::combine::run_combine(&panel, &factors, &config, format)?;
        }
    }

    Ok(())
}
