//! This module defines the core abstraction for linear operators.
//!
//! The eigensolver never looks inside `A` or `M`. Everything it needs from them is
//! the matrix-vector product, which is requested through reverse communication and
//! performed by a driver. The drivers in turn only rely on the `LinearOperator`
//! trait, so the same driver serves dense matrices, sparse matrices, banded
//! structures or operators that exist purely as code.
//!
//! Implementations are provided for `faer`'s dense [`Mat`] and [`MatRef`] and for
//! sparse [`SparseColMat`] matrices. Operators that also know how to factor shifted
//! combinations of themselves implement [`crate::factor::Factorize`] on top.

use faer::{
    Accum, Mat, MatMut, MatRef, Par,
    dyn_stack::{MemBuffer, MemStack},
    linalg::matmul::matmul,
    matrix_free::LinOp,
    sparse::SparseColMat,
};

/// Represents a real linear operator that can be applied to a block of vectors.
///
/// # Example
///
/// A matrix-free operator for the 1D discrete Laplacian.
///
/// ```
/// use faer::{Mat, MatMut, MatRef};
/// use krylov_eigs::matrix::LinearOperator;
///
/// struct Laplacian(usize);
///
/// impl LinearOperator for Laplacian {
///     fn nrows(&self) -> usize { self.0 }
///     fn ncols(&self) -> usize { self.0 }
///     fn apply_into(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
///         let n = self.0;
///         for j in 0..rhs.ncols() {
///             for i in 0..n {
///                 let left = if i > 0 { rhs[(i - 1, j)] } else { 0.0 };
///                 let right = if i + 1 < n { rhs[(i + 1, j)] } else { 0.0 };
///                 out[(i, j)] = 2.0 * rhs[(i, j)] - left - right;
///             }
///         }
///     }
/// }
///
/// let x = Mat::from_fn(3, 1, |i, _| (i + 1) as f64);
/// let y = Laplacian(3).apply(x.as_ref());
/// assert_eq!(y[(1, 0)], 0.0);
/// ```
pub trait LinearOperator {
    /// Returns the number of rows of the operator.
    fn nrows(&self) -> usize;

    /// Returns the number of columns of the operator.
    fn ncols(&self) -> usize;

    /// Writes `A * rhs` into `out`, overwriting its contents.
    ///
    /// # Panics
    ///
    /// Implementations may panic if the shapes of `out` and `rhs` do not match the operator.
    fn apply_into(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>);

    /// Returns `A * rhs` as an owned matrix.
    fn apply(&self, rhs: MatRef<'_, f64>) -> Mat<f64> {
        let mut out = Mat::zeros(self.nrows(), rhs.ncols());
        self.apply_into(out.as_mut(), rhs);
        out
    }
}

impl LinearOperator for MatRef<'_, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        (*self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (*self).ncols()
    }

    fn apply_into(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        let ncols = (*self).ncols();
        assert_eq!(
            ncols,
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            ncols,
            rhs.nrows(),
        );
        matmul(out, Accum::Replace, *self, rhs, 1.0, Par::Seq);
    }
}

impl LinearOperator for Mat<f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    #[inline]
    fn apply_into(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        self.as_ref().apply_into(out, rhs)
    }
}

impl LinearOperator for SparseColMat<usize, f64> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    fn apply_into(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        let a = self.as_ref();
        assert_eq!(
            a.ncols(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            a.ncols(),
            rhs.nrows(),
        );
        let mut mem = MemBuffer::new(a.apply_scratch(rhs.ncols(), Par::Seq));
        let stack = MemStack::new(&mut mem);
        LinOp::apply(&a, out, rhs, Par::Seq, stack);
    }
}
