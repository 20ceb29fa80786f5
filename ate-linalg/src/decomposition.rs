#![allow(clippy::needless_range_loop)]
//! Matrix decompositions and solvers.
//!
//! Thin QR for least squares, upper-triangular inversion for the
//! unscaled covariance (X'X)^{-1} = R^{-1} R^{-T}, and faer's symmetric
//! eigendecomposition for the condition number of a design.

use crate::dense::DenseMatrix;
use thiserror::Error;

/// Columns whose residual norm falls below this fraction of their original
/// norm after orthogonalisation are treated as linearly dependent.
const RANK_TOL: f64 = 1e-10;

#[derive(Error, Debug)]
pub enum LinalgError {
    #[error("Singular matrix encountered: column {column} is linearly dependent on earlier columns")]
    SingularMatrix { column: usize },

    #[error("Underdetermined system: {rows} rows for {cols} columns")]
    Underdetermined { rows: usize, cols: usize },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result of a QR decomposition: A = Q * R.
pub struct QrDecomp {
    pub q: DenseMatrix,
    pub r: DenseMatrix,
}

impl QrDecomp {
    /// Compute the thin QR decomposition of an m x n matrix (m >= n)
    /// using modified Gram-Schmidt.
    ///
    /// Fails with [`LinalgError::SingularMatrix`] naming the first column
    /// that is (numerically) a combination of the ones before it.
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let m = a.nrows();
        let n = a.ncols();
        if m < n {
            return Err(LinalgError::Underdetermined { rows: m, cols: n });
        }

        let mut q = DenseMatrix::zeros(m, n);
        let mut r = DenseMatrix::zeros(n, n);
        let mut cols: Vec<Vec<f64>> = (0..n).map(|j| a.col(j)).collect();

        for j in 0..n {
            let original_norm = DenseMatrix::dot(&cols[j], &cols[j]).sqrt();

            for i in 0..j {
                let q_col = q.col(i);
                let rij = DenseMatrix::dot(&q_col, &cols[j]);
                r.set(i, j, rij);
                for k in 0..m {
                    cols[j][k] -= rij * q_col[k];
                }
            }

            let norm = DenseMatrix::dot(&cols[j], &cols[j]).sqrt();
            if original_norm == 0.0 || norm <= RANK_TOL * original_norm {
                return Err(LinalgError::SingularMatrix { column: j });
            }
            r.set(j, j, norm);
            for k in 0..m {
                q.set(k, j, cols[j][k] / norm);
            }
        }

        Ok(QrDecomp { q, r })
    }

    /// Least-squares solution of A x = b: back-substitute R x = Q'b.
    pub fn solve(&self, b: &[f64]) -> Result<Vec<f64>, LinalgError> {
        if b.len() != self.q.nrows() {
            return Err(LinalgError::DimensionMismatch {
                expected: self.q.nrows(),
                got: b.len(),
            });
        }
        let n = self.r.nrows();
        let qtb = self.q.t_mat_vec(b);

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.r.get(i, j) * x[j];
            }
            x[i] = (qtb[i] - sum) / self.r.get(i, i);
        }
        Ok(x)
    }

    /// Inverse of the upper-triangular factor R.
    pub fn r_inverse(&self) -> DenseMatrix {
        let n = self.r.nrows();
        let mut inv = DenseMatrix::zeros(n, n);
        for j in 0..n {
            inv.set(j, j, 1.0 / self.r.get(j, j));
            for i in (0..j).rev() {
                let mut sum = 0.0;
                for k in (i + 1)..=j {
                    sum += self.r.get(i, k) * inv.get(k, j);
                }
                inv.set(i, j, -sum / self.r.get(i, i));
            }
        }
        inv
    }

    /// (A'A)^{-1}, computed as R^{-1} R^{-T} without forming A'A.
    pub fn unscaled_covariance(&self) -> DenseMatrix {
        let r_inv = self.r_inverse();
        r_inv.mat_mul(&r_inv.transpose())
    }
}

/// Eigenvalues of a symmetric matrix, sorted in descending order.
pub fn symmetric_eigenvalues(a: &DenseMatrix) -> Result<Vec<f64>, LinalgError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let eigen = a.as_faer().selfadjoint_eigendecomposition(faer::Side::Lower);
    let s = eigen.s();
    let mut evals: Vec<f64> = (0..n).map(|i| s.column_vector().read(i)).collect();
    evals.sort_by(|a, b| b.total_cmp(a));
    Ok(evals)
}

/// Condition number of a design matrix X: sqrt(lambda_max / lambda_min) of X'X.
pub fn condition_number(x: &DenseMatrix) -> Result<f64, LinalgError> {
    let evals = symmetric_eigenvalues(&x.gram())?;
    match (evals.first(), evals.last()) {
        (Some(&max), Some(&min)) if min > 0.0 => Ok((max / min).sqrt()),
        (Some(_), Some(_)) => Ok(f64::INFINITY),
        _ => Ok(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr() {
        let a = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let qr = QrDecomp::new(&a).unwrap();
        // Q'Q = I
        let qtq = qr.q.transpose().mat_mul(&qr.q);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (qtq.get(i, j) - expected).abs() < 1e-10,
                    "Q'Q[{},{}] = {}, expected {}",
                    i,
                    j,
                    qtq.get(i, j),
                    expected
                );
            }
        }
        let qr_prod = qr.q.mat_mul(&qr.r);
        for i in 0..3 {
            for j in 0..2 {
                assert!((qr_prod.get(i, j) - a.get(i, j)).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_qr_solve_normal_equations() {
        let a = DenseMatrix::from_row_major(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = vec![1.0, 2.0, 2.0];
        let qr = QrDecomp::new(&a).unwrap();
        let x = qr.solve(&b).unwrap();
        // A'Ax = A'b
        let atax = a.gram().mat_vec(&x);
        let atb = a.t_mat_vec(&b);
        for i in 0..2 {
            assert!(
                (atax[i] - atb[i]).abs() < 1e-10,
                "A'Ax[{}]={} != A'b[{}]={}",
                i,
                atax[i],
                i,
                atb[i]
            );
        }
    }

    #[test]
    fn test_qr_solve_wrong_length() {
        let a = DenseMatrix::from_row_major(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let qr = QrDecomp::new(&a).unwrap();
        assert!(matches!(
            qr.solve(&[1.0, 2.0]),
            Err(LinalgError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_qr_detects_collinear_column() {
        // Third column = 2 * second column
        let a = DenseMatrix::from_row_major(
            4,
            3,
            &[1.0, 1.0, 2.0, 1.0, 2.0, 4.0, 1.0, 3.0, 6.0, 1.0, 4.0, 8.0],
        );
        match QrDecomp::new(&a) {
            Err(LinalgError::SingularMatrix { column }) => assert_eq!(column, 2),
            other => panic!("expected singular matrix, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_qr_zero_column_is_singular() {
        let a = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        assert!(matches!(
            QrDecomp::new(&a),
            Err(LinalgError::SingularMatrix { column: 1 })
        ));
    }

    #[test]
    fn test_qr_underdetermined() {
        let a = DenseMatrix::from_row_major(1, 2, &[1.0, 2.0]);
        assert!(matches!(
            QrDecomp::new(&a),
            Err(LinalgError::Underdetermined { rows: 1, cols: 2 })
        ));
    }

    #[test]
    fn test_unscaled_covariance_is_gram_inverse() {
        let a = DenseMatrix::from_row_major(4, 2, &[1.0, 0.5, 1.0, 1.5, 1.0, 2.0, 1.0, 4.0]);
        let qr = QrDecomp::new(&a).unwrap();
        let cov = qr.unscaled_covariance();
        let prod = a.gram().mat_mul(&cov);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (prod.get(i, j) - expected).abs() < 1e-10,
                    "(X'X)(X'X)^{{-1}}[{},{}] = {}",
                    i,
                    j,
                    prod.get(i, j)
                );
            }
        }
    }

    #[test]
    fn test_eigenvalues() {
        let a = DenseMatrix::from_row_major(2, 2, &[3.0, 1.0, 1.0, 3.0]);
        let evals = symmetric_eigenvalues(&a).unwrap();
        assert!((evals[0] - 4.0).abs() < 1e-10);
        assert!((evals[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_condition_number_orthogonal_design() {
        // Orthogonal columns with equal norms -> condition number 1
        let x = DenseMatrix::from_row_major(4, 2, &[1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0]);
        assert!((condition_number(&x).unwrap() - 1.0).abs() < 1e-10);
    }
}
