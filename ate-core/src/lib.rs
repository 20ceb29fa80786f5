//! ate-core: average treatment effect estimation by regression adjustment
//!
//! Turns a loaded dataset into a regression formula, fits it by ordinary
//! least squares, and reports the treatment coefficient with its p-value
//! and confidence interval alongside a full model summary.

pub mod design;
pub mod diagnostics;
pub mod effect;
pub mod estimate;
pub mod formula;
pub mod ols;
pub mod preprocess;
pub mod summary;

pub use estimate::{estimate_ate, AteReport, AteSpec};
pub use formula::{Formula, FormulaError, Term};
pub use ols::{fit_ols, Coefficient, OlsResult, DEFAULT_ALPHA};
