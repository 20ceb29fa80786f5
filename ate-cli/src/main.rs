//! ate: average treatment effect estimation by OLS regression adjustment.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ate",
    version,
    about = "Estimate an average treatment effect by OLS regression adjustment",
    long_about = "Fits outcome ~ controls + treatment by ordinary least squares and reports\n\
                  the treatment coefficient, its p-value and confidence interval.\n\
                  Text columns among the regressors are treated as categorical."
)]
struct Cli {
    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    estimate: commands::estimate::EstimateArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("ate v{}", env!("CARGO_PKG_VERSION"));

    commands::estimate::run(cli.estimate)
}
