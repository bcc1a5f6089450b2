//! Linear-system backends used by the shift-invert style drivers.
//!
//! Every mode except the standard regular one needs to apply the inverse of some
//! matrix: `M`, `A - σI` or `A - σM`. Drivers obtain that inverse through the
//! [`Factorize`] trait, implemented here for three storage formats:
//!
//! - **`dense`**: [`faer::Mat`], partial-pivoting LU for shifted (indefinite)
//!   combinations and Cholesky for definite mass matrices.
//! - **`sparse`**: [`faer::sparse::SparseColMat`], sparse LU.
//! - **`tridiagonal`**: [`SymTridiagonal`], an O(n) LU with partial pivoting.

pub mod dense;
pub mod sparse;
pub mod tridiagonal;

pub use dense::DenseFactor;
pub use sparse::SparseFactor;
pub use tridiagonal::{SymTridiagonal, TridiagonalLu};

use crate::matrix::LinearOperator;
use faer::{MatMut, MatRef};
use thiserror::Error;

/// Errors raised while factoring an operator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactorError {
    #[error("The matrix is singular (zero pivot at position {0}).")]
    Singular(usize),
    #[error("The matrix is not positive definite.")]
    NotPositiveDefinite,
    #[error("The factorization produced non-finite values; the matrix is numerically singular.")]
    NumericallySingular,
    #[error("Operand dimensions do not match: {0} vs {1}.")]
    DimensionMismatch(usize, usize),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A factored matrix that can solve linear systems.
pub trait LinearSolve {
    /// Writes `F^-1 * rhs` into `out`.
    fn solve_into(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>);
}

/// An operator that can factor linear combinations of itself.
pub trait Factorize: LinearOperator {
    type Factor: LinearSolve + 'static;

    /// Factors `self + alpha * mass`, where a missing `mass` stands for the identity.
    fn factor_combination(&self, alpha: f64, mass: Option<&Self>)
    -> Result<Self::Factor, FactorError>;

    /// Factors `self`, which the caller asserts is symmetric positive definite.
    fn factor_definite(&self) -> Result<Self::Factor, FactorError> {
        self.factor_combination(0.0, None)
    }
}

/// Checks that two operands of a combination have the same shape.
pub(crate) fn check_same_shape<Op: LinearOperator + ?Sized>(
    a: &Op,
    mass: Option<&Op>,
) -> Result<(), FactorError> {
    if a.nrows() != a.ncols() {
        return Err(FactorError::DimensionMismatch(a.nrows(), a.ncols()));
    }
    match mass {
        Some(m) if m.nrows() != a.nrows() || m.ncols() != a.ncols() => {
            Err(FactorError::DimensionMismatch(a.nrows(), m.nrows()))
        }
        _ => Ok(()),
    }
}

/// Solves against a vector of ones and rejects factors whose solution is not finite.
pub(crate) fn probe<F: LinearSolve>(factor: F, n: usize) -> Result<F, FactorError> {
    let ones = faer::Mat::from_fn(n, 1, |_, _| 1.0);
    let mut x = faer::Mat::zeros(n, 1);
    factor.solve_into(x.as_mut(), ones.as_ref());
    if (0..n).all(|i| x[(i, 0)].is_finite()) {
        Ok(factor)
    } else {
        Err(FactorError::NumericallySingular)
    }
}
