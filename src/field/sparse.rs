//! Sparse complex matrix and iterative solver.
//!
//! This module provides a lightweight sparse matrix implementation (CSR format)
//! over complex coefficients, and a BiCGSTAB solver. The systems assembled by
//! the field solver have complex diagonal entries and pinned constraint rows,
//! so they are not Hermitian; BiCGSTAB handles the general case and reports
//! failure instead of returning a silently wrong result.

use nalgebra::DVector;
use num_complex::Complex;

use crate::error::{FieldError, Result};

/// Threshold below which a BiCGSTAB scalar counts as numerical breakdown.
const BREAKDOWN: f64 = 1e-30;

/// Compressed Sparse Row (CSR) matrix with complex entries.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Row pointers: row_ptr[i] is the index in col_idx/values where row i starts.
    /// Length is rows + 1, with row_ptr[rows] = nnz.
    row_ptr: Vec<usize>,
    /// Column indices for each non-zero value.
    col_idx: Vec<usize>,
    /// Non-zero values.
    values: Vec<Complex<f64>>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        mut triplets: Vec<(usize, usize, Complex<f64>)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self {
                rows,
                cols,
                row_ptr: vec![0; rows + 1],
                col_idx: Vec::new(),
                values: Vec::new(),
            };
        }

        // Sort by (row, col) for CSR construction
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        // Merge duplicates and build CSR
        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());

        let mut prev_row = usize::MAX;
        let mut prev_col = usize::MAX;

        for (row, col, val) in triplets {
            if row == prev_row && col == prev_col {
                // Same position: accumulate value
                *values.last_mut().unwrap() += val;
            } else {
                // New entry
                col_idx.push(col);
                values.push(val);
                // Update row pointers for any skipped rows
                for r in (prev_row.wrapping_add(1))..=row {
                    row_ptr[r] = col_idx.len() - 1;
                }
                prev_row = row;
                prev_col = col;
            }
        }

        // Fill remaining row pointers
        let nnz = col_idx.len();
        for r in (prev_row + 1)..=rows {
            row_ptr[r] = nnz;
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<Complex<f64>>) -> DVector<Complex<f64>> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);

        for i in 0..self.rows {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];

            let mut sum = Complex::new(0.0, 0.0);
            for k in start..end {
                sum += self.values[k] * x[self.col_idx[k]];
            }
            y[i] = sum;
        }

        y
    }
}

/// Solve A*x = b using the stabilized bi-conjugate gradient method (BiCGSTAB).
///
/// Unlike conjugate gradient, BiCGSTAB does not require the matrix to be
/// Hermitian, which the field solver's systems are not.
///
/// # Arguments
///
/// * `a` - The system matrix (square, complex)
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
///
/// # Returns
///
/// The solution vector x, or [`FieldError::ConvergenceFailed`] if the method
/// breaks down or does not converge within the iteration budget.
pub fn bicgstab(
    a: &CsrMatrix,
    b: &DVector<Complex<f64>>,
    x0: Option<&DVector<Complex<f64>>>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<Complex<f64>>> {
    let n = b.len();
    assert_eq!(a.nrows(), n, "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), n, "Matrix must be square");

    // Initial guess
    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    // r = b - A*x
    let mut r = b - a.mul_vec(&x);

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(x);
    }
    if r.norm() / b_norm < tolerance {
        return Ok(x);
    }

    // Shadow residual, fixed at the initial residual
    let r_hat = r.clone();

    let mut rho = r_hat.dotc(&r);
    let mut p = r.clone();

    for iter in 0..max_iter {
        if rho.norm() < BREAKDOWN {
            return Err(FieldError::ConvergenceFailed { iterations: iter });
        }

        let v = a.mul_vec(&p);

        let r_hat_v = r_hat.dotc(&v);
        if r_hat_v.norm() < BREAKDOWN {
            return Err(FieldError::ConvergenceFailed { iterations: iter });
        }
        let alpha = rho / r_hat_v;

        // s = r - alpha * v
        let s = &r - &v * alpha;
        if s.norm() / b_norm < tolerance {
            x += &p * alpha;
            return Ok(x);
        }

        let t = a.mul_vec(&s);
        let t_t = t.dotc(&t);
        if t_t.norm() < BREAKDOWN {
            return Err(FieldError::ConvergenceFailed { iterations: iter });
        }
        let omega = t.dotc(&s) / t_t;

        // x = x + alpha*p + omega*s
        x += &p * alpha;
        x += &s * omega;

        // r = s - omega * t
        r = s - &t * omega;
        if r.norm() / b_norm < tolerance {
            return Ok(x);
        }

        let rho_new = r_hat.dotc(&r);
        let beta = (rho_new / rho) * (alpha / omega);

        // p = r + beta * (p - omega * v)
        p = &r + (p - &v * omega) * beta;
        rho = rho_new;
    }

    // Did not converge
    Err(FieldError::ConvergenceFailed {
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex<f64> {
        Complex::new(re, im)
    }

    #[test]
    fn test_csr_from_triplets() {
        // [ 4  1 ]
        // [ 1  3 ]
        let triplets = vec![
            (0, 0, c(4.0, 0.0)),
            (0, 1, c(1.0, 0.0)),
            (1, 0, c(1.0, 0.0)),
            (1, 1, c(3.0, 0.0)),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
        assert_eq!(a.nnz(), 4);
    }

    #[test]
    fn test_csr_from_triplets_with_duplicates() {
        // Duplicate entries at the same position should be summed
        let triplets = vec![
            (0, 0, c(2.0, 1.0)),
            (0, 0, c(2.0, -1.0)), // Sums to 4.0
            (0, 1, c(1.0, 0.0)),
            (1, 0, c(1.0, 0.0)),
            (1, 1, c(3.0, 0.0)),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        let x = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 0.0)]);
        let y = a.mul_vec(&x);

        assert!((y[0] - c(4.0, 0.0)).norm() < 1e-10);
        assert!((y[1] - c(1.0, 0.0)).norm() < 1e-10);
    }

    #[test]
    fn test_csr_mul_vec_complex() {
        // [ 1+i  0 ]   [ 1 ]   [ 1+i ]
        // [ 0    2 ] * [ i ] = [ 2i  ]
        let triplets = vec![(0, 0, c(1.0, 1.0)), (1, 1, c(2.0, 0.0))];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        let x = DVector::from_vec(vec![c(1.0, 0.0), c(0.0, 1.0)]);
        let y = a.mul_vec(&x);

        assert!((y[0] - c(1.0, 1.0)).norm() < 1e-10);
        assert!((y[1] - c(0.0, 2.0)).norm() < 1e-10);
    }

    #[test]
    fn test_bicgstab_real_system() {
        // Solve:
        // [ 4  1 ]   [ x ]   [ 1 ]
        // [ 1  3 ] * [ y ] = [ 2 ]
        //
        // Solution: x = 1/11, y = 7/11
        let triplets = vec![
            (0, 0, c(4.0, 0.0)),
            (0, 1, c(1.0, 0.0)),
            (1, 0, c(1.0, 0.0)),
            (1, 1, c(3.0, 0.0)),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![c(1.0, 0.0), c(2.0, 0.0)]);

        let x = bicgstab(&a, &b, None, 100, 1e-10).unwrap();

        assert!((x[0] - c(1.0 / 11.0, 0.0)).norm() < 1e-8);
        assert!((x[1] - c(7.0 / 11.0, 0.0)).norm() < 1e-8);
    }

    #[test]
    fn test_bicgstab_complex_system() {
        // General complex, non-Hermitian system; verify the residual
        let triplets = vec![
            (0, 0, c(2.0, 0.0)),
            (0, 1, c(0.0, 1.0)),
            (1, 0, c(0.0, 1.0)),
            (1, 1, c(3.0, 0.0)),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![c(1.0, 1.0), c(2.0, -1.0)]);

        let x = bicgstab(&a, &b, None, 100, 1e-10).unwrap();

        let residual = &b - a.mul_vec(&x);
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_bicgstab_pinned_row_system() {
        // The shape assembled by the field solver: one pinned row,
        // one transport row with a unit-modulus coefficient.
        let r = Complex::from_polar(1.0, 0.7);
        let triplets = vec![(0, 0, c(1.0, 0.0)), (1, 1, r), (1, 0, -r)];
        let a = CsrMatrix::from_triplets(2, 2, triplets);

        let pinned = Complex::from_polar(1.0, -0.3);
        let b = DVector::from_vec(vec![pinned, c(0.0, 0.0)]);

        let x = bicgstab(&a, &b, None, 100, 1e-10).unwrap();

        assert!((x[0] - pinned).norm() < 1e-8);
        assert!((x[1] - pinned).norm() < 1e-8);
    }

    #[test]
    fn test_bicgstab_with_initial_guess() {
        let triplets = vec![
            (0, 0, c(4.0, 0.0)),
            (0, 1, c(1.0, 0.0)),
            (1, 0, c(1.0, 0.0)),
            (1, 1, c(3.0, 0.0)),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![c(1.0, 0.0), c(2.0, 0.0)]);

        let x0 = DVector::from_vec(vec![c(0.1, 0.0), c(0.6, 0.0)]);
        let x = bicgstab(&a, &b, Some(&x0), 100, 1e-10).unwrap();

        let residual = &b - a.mul_vec(&x);
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_bicgstab_zero_rhs() {
        let triplets = vec![(0, 0, c(4.0, 0.0)), (1, 1, c(3.0, 0.0))];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::zeros(2);

        let x = bicgstab(&a, &b, None, 100, 1e-10).unwrap();
        assert!(x.norm() < 1e-15);
    }

    #[test]
    fn test_bicgstab_exhausted_budget() {
        // A zero iteration budget with a nonzero right-hand side must be
        // reported as a failure, not as a silent wrong answer.
        let triplets = vec![
            (0, 0, c(4.0, 0.0)),
            (0, 1, c(1.0, 0.0)),
            (1, 0, c(1.0, 0.0)),
            (1, 1, c(3.0, 0.0)),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        let b = DVector::from_vec(vec![c(1.0, 0.0), c(2.0, 0.0)]);

        let result = bicgstab(&a, &b, None, 0, 1e-10);
        assert!(matches!(
            result,
            Err(FieldError::ConvergenceFailed { iterations: 0 })
        ));
    }
}
