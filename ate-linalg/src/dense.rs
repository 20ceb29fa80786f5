#![allow(clippy::needless_range_loop)]
//! Dense matrix operations backed by faer.
//!
//! Wraps faer's column-major `Mat<f64>` with the handful of operations the
//! regression pipeline needs: column access for design matrices, products
//! for the normal equations, and cross-products for covariance.

use faer::Mat;

/// A dense column-major matrix wrapper around faer's `Mat<f64>`.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    inner: Mat<f64>,
}

impl DenseMatrix {
    /// Create a new dense matrix filled with zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: Mat::zeros(nrows, ncols),
        }
    }

    /// Create a dense matrix from row-major input.
    pub fn from_row_major(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        assert_eq!(data.len(), nrows * ncols);
        let inner = Mat::from_fn(nrows, ncols, |i, j| data[i * ncols + j]);
        Self { inner }
    }

    /// Build a matrix whose columns are the given slices, all of equal length.
    pub fn from_columns(columns: &[Vec<f64>]) -> Self {
        let ncols = columns.len();
        let nrows = columns.first().map_or(0, |c| c.len());
        assert!(columns.iter().all(|c| c.len() == nrows));
        let inner = Mat::from_fn(nrows, ncols, |i, j| columns[j][i]);
        Self { inner }
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Get element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.read(row, col)
    }

    /// Set element at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.inner.write(row, col, value);
    }

    /// Get a reference to the underlying faer matrix.
    pub fn as_faer(&self) -> &Mat<f64> {
        &self.inner
    }

    /// Matrix-vector product: self * v.
    pub fn mat_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.ncols(), v.len());
        let n = self.nrows();
        let mut result = vec![0.0; n];
        for j in 0..self.ncols() {
            let vj = v[j];
            for i in 0..n {
                result[i] += self.inner.read(i, j) * vj;
            }
        }
        result
    }

    /// Transposed matrix-vector product: self' * v.
    pub fn t_mat_vec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(self.nrows(), v.len());
        (0..self.ncols())
            .map(|j| (0..self.nrows()).map(|i| self.inner.read(i, j) * v[i]).sum())
            .collect()
    }

    /// Matrix-matrix product: self * other.
    pub fn mat_mul(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(self.ncols(), other.nrows());
        let result = &self.inner * &other.inner;
        DenseMatrix { inner: result }
    }

    pub fn transpose(&self) -> DenseMatrix {
        let inner = self.inner.transpose().to_owned();
        DenseMatrix { inner }
    }

    /// Extract column as a Vec<f64>.
    pub fn col(&self, j: usize) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.inner.read(i, j)).collect()
    }

    /// Diagonal of a square matrix.
    pub fn diag(&self) -> Vec<f64> {
        let n = self.nrows().min(self.ncols());
        (0..n).map(|i| self.inner.read(i, i)).collect()
    }

    pub fn dot(a: &[f64], b: &[f64]) -> f64 {
        assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    /// Cross-product X'X, exploiting symmetry.
    pub fn gram(&self) -> DenseMatrix {
        let n = self.nrows();
        let p = self.ncols();
        let mut result = DenseMatrix::zeros(p, p);
        for j in 0..p {
            for k in j..p {
                let mut s = 0.0;
                for i in 0..n {
                    s += self.inner.read(i, j) * self.inner.read(i, k);
                }
                result.set(j, k, s);
                if j != k {
                    result.set(k, j, s);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let m = DenseMatrix::zeros(3, 4);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 4);
        assert_eq!(m.get(0, 0), 0.0);
    }

    #[test]
    fn test_from_columns() {
        let m = DenseMatrix::from_columns(&[vec![1.0, 1.0, 1.0], vec![2.0, 4.0, 6.0]]);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m.get(1, 0), 1.0);
        assert_eq!(m.get(2, 1), 6.0);
        assert_eq!(m.col(1), vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_mat_vec_and_transpose_product() {
        let a = DenseMatrix::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(a.mat_vec(&[1.0, 0.0, 1.0]), vec![4.0, 10.0]);
        assert_eq!(a.t_mat_vec(&[1.0, 1.0]), vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_mat_mul() {
        let a = DenseMatrix::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = DenseMatrix::from_row_major(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = a.mat_mul(&b);
        assert!((c.get(0, 0) - 58.0).abs() < 1e-10);
        assert!((c.get(0, 1) - 64.0).abs() < 1e-10);
        assert!((c.get(1, 0) - 139.0).abs() < 1e-10);
        assert!((c.get(1, 1) - 154.0).abs() < 1e-10);
    }

    #[test]
    fn test_gram_matches_explicit_product() {
        let x = DenseMatrix::from_row_major(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let g = x.gram();
        let explicit = x.transpose().mat_mul(&x);
        for i in 0..2 {
            for j in 0..2 {
                assert!((g.get(i, j) - explicit.get(i, j)).abs() < 1e-12);
            }
        }
        // col0 = [1,1,1], col1 = [0,1,2]
        assert_eq!(g.get(0, 0), 3.0);
        assert_eq!(g.get(0, 1), 3.0);
        assert_eq!(g.get(1, 1), 5.0);
    }
}
