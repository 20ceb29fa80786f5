//! Design matrix construction from a formula and a dataset.
//!
//! Column 0 is the intercept. Numeric terms contribute one column each;
//! factor terms are treatment-coded against their first level, one 0/1
//! column per remaining level, named `C(x)[T.level]` (or `x[T.level]` for
//! a bare boolean or text column). Rows with a missing value in any used
//! variable are dropped.

use std::collections::BTreeSet;
use std::ops::Range;

use anyhow::{bail, Result};
use ate_io::{Column, ColumnData, Dataset};
use ate_linalg::DenseMatrix;
use tracing::{debug, info};

use crate::formula::{Formula, Term};

pub const INTERCEPT: &str = "Intercept";

/// Regressor matrix, response, and the mapping from terms to columns.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub x: DenseMatrix,
    pub y: Vec<f64>,
    pub outcome: String,
    pub column_names: Vec<String>,
    /// Columns of `x` produced by each formula term, in formula order.
    pub term_columns: Vec<(Term, Range<usize>)>,
    /// Rows removed because of missing values.
    pub n_dropped: usize,
}

impl DesignMatrix {
    pub fn nobs(&self) -> usize {
        self.y.len()
    }

    /// Columns belonging to the (last) term on `variable`.
    pub fn columns_for(&self, variable: &str) -> Option<Range<usize>> {
        self.term_columns
            .iter()
            .rev()
            .find(|(term, _)| term.variable == variable)
            .map(|(_, range)| range.clone())
    }
}

/// Build the design matrix for `formula` over `dataset`.
pub fn build_design_matrix(formula: &Formula, dataset: &Dataset) -> Result<DesignMatrix> {
    let outcome = dataset.column(&formula.outcome)?;
    // A repeated term contributes its columns once, at its first position.
    let mut unique: Vec<&Term> = Vec::with_capacity(formula.terms.len());
    for term in &formula.terms {
        if unique.contains(&term) {
            debug!("Ignoring repeated term {}", term);
        } else {
            unique.push(term);
        }
    }
    let regressors = unique
        .into_iter()
        .map(|term| Ok((term, dataset.column(&term.variable)?)))
        .collect::<Result<Vec<_>>>()?;

    let keep: Vec<usize> = (0..dataset.n_rows())
        .filter(|&i| {
            !outcome.data.is_missing(i) && regressors.iter().all(|(_, c)| !c.data.is_missing(i))
        })
        .collect();
    let n_dropped = dataset.n_rows() - keep.len();
    if n_dropped > 0 {
        info!("Dropped {} rows with missing values", n_dropped);
    }

    let y = response(outcome, &keep)?;

    let mut columns = vec![vec![1.0; keep.len()]];
    let mut column_names = vec![INTERCEPT.to_string()];
    let mut term_columns = Vec::with_capacity(regressors.len());

    for (term, column) in regressors {
        let start = columns.len();
        match encode_term(term, column, &keep) {
            Encoded::Numeric(values) => {
                columns.push(values);
                column_names.push(term.variable.clone());
            }
            Encoded::Factor { prefix, levels, labels } => {
                debug!(
                    "{} levels: {:?} (reference '{}')",
                    prefix,
                    levels,
                    levels.first().map_or("", String::as_str)
                );
                for level in levels.iter().skip(1) {
                    columns.push(
                        labels
                            .iter()
                            .map(|l| if l == level { 1.0 } else { 0.0 })
                            .collect(),
                    );
                    column_names.push(format!("{}[T.{}]", prefix, level));
                }
            }
        }
        term_columns.push((term.clone(), start..columns.len()));
    }

    debug!("Design matrix: {} x {} ({:?})", keep.len(), columns.len(), column_names);

    Ok(DesignMatrix {
        x: DenseMatrix::from_columns(&columns),
        y,
        outcome: formula.outcome.clone(),
        column_names,
        term_columns,
        n_dropped,
    })
}

fn response(column: &Column, keep: &[usize]) -> Result<Vec<f64>> {
    match &column.data {
        ColumnData::Numeric(v) => Ok(keep.iter().map(|&i| v[i]).collect()),
        ColumnData::Boolean(v) => Ok(keep
            .iter()
            .map(|&i| if v[i] == Some(true) { 1.0 } else { 0.0 })
            .collect()),
        other => bail!(
            "outcome column '{}' must be numeric, found {} column",
            column.name,
            other.dtype()
        ),
    }
}

enum Encoded {
    Numeric(Vec<f64>),
    Factor {
        prefix: String,
        levels: Vec<String>,
        /// Level label of each kept row.
        labels: Vec<String>,
    },
}

fn encode_term(term: &Term, column: &Column, keep: &[usize]) -> Encoded {
    let prefix = term.to_string();
    match &column.data {
        ColumnData::Numeric(v) if !term.categorical => {
            Encoded::Numeric(keep.iter().map(|&i| v[i]).collect())
        }
        ColumnData::Numeric(v) => {
            let mut distinct: Vec<f64> = v.iter().copied().filter(|x| !x.is_nan()).collect();
            distinct.sort_by(f64::total_cmp);
            distinct.dedup();
            Encoded::Factor {
                prefix,
                levels: distinct.iter().map(|x| format_level(*x)).collect(),
                labels: keep.iter().map(|&i| format_level(v[i])).collect(),
            }
        }
        ColumnData::Boolean(v) => Encoded::Factor {
            prefix,
            levels: vec!["False".to_string(), "True".to_string()],
            labels: keep
                .iter()
                .map(|&i| (if v[i] == Some(true) { "True" } else { "False" }).to_string())
                .collect(),
        },
        ColumnData::Object(v) => Encoded::Factor {
            prefix,
            levels: v
                .iter()
                .flatten()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            labels: keep
                .iter()
                .map(|&i| v[i].clone().unwrap_or_default())
                .collect(),
        },
        ColumnData::Category(c) => Encoded::Factor {
            prefix,
            levels: c.levels().to_vec(),
            labels: keep
                .iter()
                .map(|&i| c.label(i).unwrap_or_default().to_string())
                .collect(),
        },
    }
}

/// Level label for a numeric value used as a factor: integers print
/// without a fractional part.
fn format_level(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}
