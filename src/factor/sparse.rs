//! Sparse LU factorization backed by `faer`.

use super::{FactorError, Factorize, LinearSolve, check_same_shape, probe};
use faer::{
    MatMut, MatRef,
    prelude::*,
    sparse::{SparseColMat, Triplet, linalg::solvers::Lu},
};

/// A sparse LU factor.
pub struct SparseFactor {
    lu: Lu<usize, f64>,
}

impl LinearSolve for SparseFactor {
    fn solve_into(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        let solution = self.lu.solve(rhs);
        out.copy_from(solution.as_ref());
    }
}

impl Factorize for SparseColMat<usize, f64> {
    type Factor = SparseFactor;

    fn factor_combination(
        &self,
        alpha: f64,
        mass: Option<&Self>,
    ) -> Result<SparseFactor, FactorError> {
        check_same_shape(self, mass)?;
        let n = self.as_ref().nrows();

        // Duplicate entries are summed when the combined matrix is assembled.
        let mut triplets: Vec<Triplet<usize, usize, f64>> = self
            .as_ref()
            .triplet_iter()
            .map(|t| Triplet {
                row: t.row,
                col: t.col,
                val: *t.val,
            })
            .collect();
        match mass {
            Some(m) => triplets.extend(m.as_ref().triplet_iter().map(|t| Triplet {
                row: t.row,
                col: t.col,
                val: alpha * *t.val,
            })),
            None => triplets.extend((0..n).map(|i| Triplet {
                row: i,
                col: i,
                val: alpha,
            })),
        }

        let combined = SparseColMat::try_new_from_triplets(n, n, &triplets)
            .map_err(|e| FactorError::Backend(format!("{e:?}")))?;
        let lu = combined
            .as_ref()
            .sp_lu()
            .map_err(|e| FactorError::Backend(format!("{e:?}")))?;
        probe(SparseFactor { lu }, n)
    }
}
