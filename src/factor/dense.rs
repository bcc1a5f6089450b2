//! Dense factorizations backed by `faer`.

use super::{FactorError, Factorize, LinearSolve, check_same_shape, probe};
use faer::{
    Mat, MatMut, MatRef, Side,
    linalg::solvers::{Llt, PartialPivLu},
    prelude::*,
};

/// A dense factor: LU for general shifted matrices, Cholesky for definite ones.
pub enum DenseFactor {
    Lu(PartialPivLu<f64>),
    Cholesky(Llt<f64>),
}

impl LinearSolve for DenseFactor {
    fn solve_into(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        let solution = match self {
            DenseFactor::Lu(lu) => lu.solve(rhs),
            DenseFactor::Cholesky(llt) => llt.solve(rhs),
        };
        out.copy_from(solution.as_ref());
    }
}

impl Factorize for Mat<f64> {
    type Factor = DenseFactor;

    fn factor_combination(
        &self,
        alpha: f64,
        mass: Option<&Self>,
    ) -> Result<DenseFactor, FactorError> {
        check_same_shape(self, mass)?;
        let n = self.nrows();
        let combined = match mass {
            Some(m) => Mat::from_fn(n, n, |i, j| self[(i, j)] + alpha * m[(i, j)]),
            None => Mat::from_fn(n, n, |i, j| {
                if i == j {
                    self[(i, j)] + alpha
                } else {
                    self[(i, j)]
                }
            }),
        };
        probe(DenseFactor::Lu(combined.as_ref().partial_piv_lu()), n)
    }

    fn factor_definite(&self) -> Result<DenseFactor, FactorError> {
        check_same_shape(self, None)?;
        let llt = self
            .as_ref()
            .llt(Side::Lower)
            .map_err(|_| FactorError::NotPositiveDefinite)?;
        Ok(DenseFactor::Cholesky(llt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::LinearOperator;
    use faer::mat;

    #[test]
    fn test_shifted_solve() {
        let a: Mat<f64> = mat![[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let factor = a.factor_combination(-1.0, None).unwrap();
        let b: Mat<f64> = mat![[1.0], [2.0], [3.0]];
        let mut x = Mat::zeros(3, 1);
        factor.solve_into(x.as_mut(), b.as_ref());

        // (A - I) x = b
        let ax = LinearOperator::apply(&a, x.as_ref());
        let residual = Mat::from_fn(3, 1, |i, _| ax[(i, 0)] - x[(i, 0)] - b[(i, 0)]);
        assert!(residual.norm_l2() < 1e-12);
    }

    #[test]
    fn test_combination_with_mass() {
        let a: Mat<f64> = mat![[2.0, 0.0], [0.0, 5.0]];
        let m: Mat<f64> = mat![[1.0, 0.0], [0.0, 2.0]];
        let factor = a.factor_combination(-1.0, Some(&m)).unwrap();
        let b: Mat<f64> = mat![[1.0], [3.0]];
        let mut x = Mat::zeros(2, 1);
        factor.solve_into(x.as_mut(), b.as_ref());
        assert!((x[(0, 0)] - 1.0).abs() < 1e-14);
        assert!((x[(1, 0)] - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let m: Mat<f64> = mat![[1.0, 0.0], [0.0, -1.0]];
        assert!(matches!(
            m.factor_definite(),
            Err(FactorError::NotPositiveDefinite)
        ));
        let spd: Mat<f64> = mat![[2.0, 1.0], [1.0, 2.0]];
        assert!(matches!(spd.factor_definite(), Ok(DenseFactor::Cholesky(_))));
    }

    #[test]
    fn test_singular_shift_is_rejected() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 2.0]];
        assert!(a.factor_combination(-1.0, None).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Mat::<f64>::zeros(3, 3);
        let m = Mat::<f64>::zeros(2, 2);
        assert_eq!(
            a.factor_combination(1.0, Some(&m)).err(),
            Some(FactorError::DimensionMismatch(3, 2))
        );
    }
}
