//! The estimation pipeline: coerce, build formula, fit, report.

use std::io::Write;

use anyhow::{Context, Result};
use ate_io::Dataset;
use tracing::info;

use crate::design::build_design_matrix;
use crate::effect::{treatment_effects, TreatmentEffect};
use crate::formula::{build_formula, Formula};
use crate::ols::{fit_ols, OlsResult, DEFAULT_ALPHA};
use crate::preprocess::coerce_categorical;
use crate::summary::Summary;

/// What to estimate.
#[derive(Debug, Clone)]
pub struct AteSpec {
    pub outcome: String,
    pub treatment: String,
    pub controls: Vec<String>,
    pub alpha: f64,
}

impl AteSpec {
    pub fn new(outcome: impl Into<String>, treatment: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            treatment: treatment.into(),
            controls: Vec::new(),
            alpha: DEFAULT_ALPHA,
        }
    }

    pub fn with_controls<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controls = controls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Everything the pipeline produced.
#[derive(Debug, Clone)]
pub struct AteReport {
    pub formula: Formula,
    pub fit: OlsResult,
    pub effects: Vec<TreatmentEffect>,
}

/// Run the full pipeline on `dataset`, writing the formula, the model
/// summary and the treatment report to `out`.
///
/// Object columns among the regressors are retyped as categorical in place.
pub fn estimate_ate(dataset: &mut Dataset, spec: &AteSpec, out: &mut dyn Write) -> Result<AteReport> {
    let converted = coerce_categorical(dataset, &spec.treatment, &spec.controls)?;
    if !converted.is_empty() {
        info!("Treated as categorical: {}", converted.join(", "));
    }

    let formula = build_formula(dataset, &spec.outcome, &spec.treatment, &spec.controls)?;
    writeln!(out, "{}", formula)?;

    let design = build_design_matrix(&formula, dataset)
        .with_context(|| format!("failed to build design matrix for '{}'", formula))?;
    let fit = fit_ols(&design, spec.alpha)?;

    writeln!(out, "{}", Summary::new(&fit))?;

    let effects = treatment_effects(&fit, &design, &spec.treatment)?;
    for effect in &effects {
        writeln!(out, "{}", effect)?;
    }
    out.flush()?;

    Ok(AteReport {
        formula,
        fit,
        effects,
    })
}
