//! Regression formulas of the form `outcome ~ term + term + ...`.
//!
//! A term is a bare column name or a column wrapped in factor notation,
//! `C(name)`. [`build_formula`] derives the terms from the dataset: controls
//! first, then the treatment, each wrapped in `C(..)` when its column is
//! categorical.

use std::fmt;
use std::str::FromStr;

use ate_io::{DType, Dataset, DatasetError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("formula '{0}' has no '~' separating outcome and terms")]
    MissingTilde(String),

    #[error("formula '{0}' has no outcome")]
    MissingOutcome(String),

    #[error("formula '{0}' has an empty term")]
    EmptyTerm(String),

    #[error("invalid term '{0}'")]
    InvalidTerm(String),
}

/// One right-hand-side variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub variable: String,
    /// Wrapped in `C(..)`: coded as a factor regardless of storage type.
    pub categorical: bool,
}

impl Term {
    pub fn numeric(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            categorical: false,
        }
    }

    pub fn factor(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            categorical: true,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.categorical {
            write!(f, "C({})", self.variable)
        } else {
            f.write_str(&self.variable)
        }
    }
}

impl FromStr for Term {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (inner, categorical) = match s.strip_prefix("C(").and_then(|r| r.strip_suffix(')')) {
            Some(inner) => (inner.trim(), true),
            None => (s, false),
        };
        if !is_variable_name(inner) {
            return Err(FormulaError::InvalidTerm(s.to_string()));
        }
        Ok(Term {
            variable: inner.to_string(),
            categorical,
        })
    }
}

fn is_variable_name(s: &str) -> bool {
    !s.is_empty()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '~' | '+'))
}

/// `outcome ~ t1 + t2 + ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub outcome: String,
    pub terms: Vec<Term>,
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.outcome)?;
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lhs, rhs) = s
            .split_once('~')
            .ok_or_else(|| FormulaError::MissingTilde(s.to_string()))?;
        let outcome = lhs.trim();
        if outcome.is_empty() {
            return Err(FormulaError::MissingOutcome(s.to_string()));
        }
        if !is_variable_name(outcome) {
            return Err(FormulaError::InvalidTerm(outcome.to_string()));
        }

        let terms = rhs
            .split('+')
            .map(|part| {
                if part.trim().is_empty() {
                    Err(FormulaError::EmptyTerm(s.to_string()))
                } else {
                    part.parse()
                }
            })
            .collect::<Result<Vec<Term>, _>>()?;

        Ok(Formula {
            outcome: outcome.to_string(),
            terms,
        })
    }
}

/// Build the regression formula for `outcome` on `controls` then `treatment`.
///
/// Categorical columns are rendered `C(name)`, everything else bare. Every
/// regressor must exist in the dataset; the outcome is checked later, when
/// the design matrix is built.
pub fn build_formula(
    dataset: &Dataset,
    outcome: &str,
    treatment: &str,
    controls: &[String],
) -> Result<Formula, DatasetError> {
    let terms = controls
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(treatment))
        .map(|name| {
            let term = match dataset.dtype(name)? {
                DType::Category => Term::factor(name),
                _ => Term::numeric(name),
            };
            Ok(term)
        })
        .collect::<Result<Vec<_>, DatasetError>>()?;

    Ok(Formula {
        outcome: outcome.to_string(),
        terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::coerce_categorical;
    use ate_io::{Column, ColumnData};

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("outcome", ColumnData::Numeric(vec![1.0, 2.0, 3.0])),
            Column::new("treatment", ColumnData::Numeric(vec![0.0, 1.0, 1.0])),
            Column::new(
                "a",
                ColumnData::Object(vec![Some("u".into()), Some("v".into()), Some("u".into())]),
            ),
            Column::new("b", ColumnData::Numeric(vec![0.1, 0.2, 0.3])),
            Column::new(
                "arm",
                ColumnData::Object(vec![Some("ctl".into()), Some("trt".into()), Some("trt".into())]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_no_controls() {
        let ds = dataset();
        let f = build_formula(&ds, "outcome", "treatment", &[]).unwrap();
        assert_eq!(f.to_string(), "outcome ~ treatment");
    }

    #[test]
    fn test_no_controls_categorical_treatment() {
        let mut ds = dataset();
        coerce_categorical(&mut ds, "arm", &[]).unwrap();
        let f = build_formula(&ds, "outcome", "arm", &[]).unwrap();
        assert_eq!(f.to_string(), "outcome ~ C(arm)");
    }

    #[test]
    fn test_controls_then_treatment() {
        let mut ds = dataset();
        let controls = vec!["a".to_string(), "b".to_string()];
        coerce_categorical(&mut ds, "treatment", &controls).unwrap();
        let f = build_formula(&ds, "outcome", "treatment", &controls).unwrap();
        assert_eq!(f.to_string(), "outcome ~ C(a) + b + treatment");
    }

    #[test]
    fn test_object_column_not_yet_coerced_is_bare() {
        let ds = dataset();
        let f = build_formula(&ds, "outcome", "treatment", &["a".to_string()]).unwrap();
        assert_eq!(f.to_string(), "outcome ~ a + treatment");
    }

    #[test]
    fn test_unknown_regressor() {
        let ds = dataset();
        let err = build_formula(&ds, "outcome", "treatment", &["zzz".to_string()]).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn test_parse_formula() {
        let f: Formula = "y ~ C(a) + b+t".parse().unwrap();
        assert_eq!(f.outcome, "y");
        assert_eq!(f.terms, vec![Term::factor("a"), Term::numeric("b"), Term::numeric("t")]);
        assert_eq!(f.to_string(), "y ~ C(a) + b + t");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("y t".parse::<Formula>(), Err(FormulaError::MissingTilde(_))));
        assert!(matches!(" ~ t".parse::<Formula>(), Err(FormulaError::MissingOutcome(_))));
        assert!(matches!("y ~ t +".parse::<Formula>(), Err(FormulaError::EmptyTerm(_))));
        assert!(matches!("y ~ C(a b)".parse::<Formula>(), Err(FormulaError::InvalidTerm(_))));
        assert!(matches!("y ~ f(x".parse::<Formula>(), Err(FormulaError::InvalidTerm(_))));
    }
}
