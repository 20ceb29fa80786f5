//! ate-linalg: Linear algebra wrappers for ate-rs
//!
//! Provides the dense matrix type and the decompositions used by the
//! least-squares fitter: thin QR, triangular inversion, and symmetric
//! eigenvalues for conditioning diagnostics.

pub mod dense;
pub mod decomposition;

pub use decomposition::LinalgError;
pub use dense::DenseMatrix;
