//! Estimate the average treatment effect of one column on another.
//!
//! ate -d data.csv -t treated -o income -x age,region

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use tracing::{debug, warn};

use ate_core::{estimate_ate, AteSpec, DEFAULT_ALPHA};
use ate_io::load_dataset;

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Input dataset (.csv, .pkl or .parquet). A .pkl file must hold a
    /// pickled column dict (`df.to_dict("list")` or `df.to_dict("records")`),
    /// not a pickled DataFrame object.
    #[arg(short = 'd', long)]
    pub dataset: PathBuf,

    /// Treatment column
    #[arg(short = 't', long)]
    pub treatment: String,

    /// Outcome column
    #[arg(short = 'o', long)]
    pub outcome: String,

    /// Comma-separated control columns
    #[arg(short = 'x', long)]
    pub controls: Option<String>,

    /// Significance level for confidence intervals
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,
}

/// Split a comma-separated column list, dropping blanks.
pub fn parse_controls(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

pub fn run(args: EstimateArgs) -> Result<()> {
    if !(args.alpha > 0.0 && args.alpha < 1.0) {
        bail!("--alpha must lie in (0, 1), got {}", args.alpha);
    }

    let mut dataset = match load_dataset(&args.dataset) {
        Ok(ds) => ds,
        Err(e) => {
            println!("{}", e.user_message());
            warn!("{:#}", anyhow::Error::new(e));
            return Ok(());
        }
    };
    debug!("Controls: {:?}", args.controls);

    let spec = AteSpec::new(args.outcome, args.treatment)
        .with_controls(parse_controls(args.controls.as_deref()))
        .with_alpha(args.alpha);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    estimate_ate(&mut dataset, &spec, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_controls() {
        assert!(parse_controls(None).is_empty());
        assert!(parse_controls(Some("")).is_empty());
        assert_eq!(parse_controls(Some("a, b,,c ")), vec!["a", "b", "c"]);
    }
}
