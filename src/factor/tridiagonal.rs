//! Symmetric tridiagonal operators and their O(n) LU factorization.
//!
//! Shifted tridiagonal matrices are indefinite in general, so the factorization
//! uses partial pivoting. Row interchanges introduce a second superdiagonal in `U`,
//! which is stored in `du2`.

use super::{FactorError, Factorize, LinearSolve};
use crate::matrix::LinearOperator;
use faer::{MatMut, MatRef};

/// A symmetric tridiagonal matrix given by its diagonal and off-diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct SymTridiagonal {
    diag: Vec<f64>,
    off: Vec<f64>,
}

impl SymTridiagonal {
    /// Creates the matrix, checking that `off` has exactly one entry fewer than `diag`.
    pub fn new(diag: Vec<f64>, off: Vec<f64>) -> Result<Self, FactorError> {
        if diag.len() != off.len() + 1 && !(diag.is_empty() && off.is_empty()) {
            return Err(FactorError::DimensionMismatch(diag.len(), off.len()));
        }
        Ok(Self { diag, off })
    }

    /// The `n x n` one-dimensional Laplacian, `tridiag(-1, 2, -1)`.
    pub fn laplacian(n: usize) -> Self {
        Self {
            diag: vec![2.0; n],
            off: vec![-1.0; n.saturating_sub(1)],
        }
    }

    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    pub fn off(&self) -> &[f64] {
        &self.off
    }

    pub fn dim(&self) -> usize {
        self.diag.len()
    }
}

impl LinearOperator for SymTridiagonal {
    fn nrows(&self) -> usize {
        self.dim()
    }

    fn ncols(&self) -> usize {
        self.dim()
    }

    fn apply_into(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        let n = self.dim();
        assert_eq!(
            n,
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            n,
            rhs.nrows(),
        );
        for j in 0..rhs.ncols() {
            for i in 0..n {
                let mut acc = self.diag[i] * rhs[(i, j)];
                if i > 0 {
                    acc += self.off[i - 1] * rhs[(i - 1, j)];
                }
                if i + 1 < n {
                    acc += self.off[i] * rhs[(i + 1, j)];
                }
                out[(i, j)] = acc;
            }
        }
    }
}

/// LU factors `P * T = L * U` of a tridiagonal matrix.
///
/// `L` is unit lower bidiagonal with multipliers `dl`; `U` is upper triangular with
/// diagonal `d` and superdiagonals `du` and `du2`. `ipiv[i]` is either `i` or `i + 1`.
#[derive(Debug, Clone)]
pub struct TridiagonalLu {
    dl: Vec<f64>,
    d: Vec<f64>,
    du: Vec<f64>,
    du2: Vec<f64>,
    ipiv: Vec<usize>,
}

impl TridiagonalLu {
    /// Factors the general tridiagonal matrix with sub-diagonal `dl`, diagonal `d` and
    /// super-diagonal `du`.
    pub fn factor(
        mut dl: Vec<f64>,
        mut d: Vec<f64>,
        mut du: Vec<f64>,
    ) -> Result<Self, FactorError> {
        let n = d.len();
        let mut du2 = vec![0.0; n.saturating_sub(2)];
        let mut ipiv: Vec<usize> = (0..n).collect();

        for i in 0..n.saturating_sub(1) {
            if d[i].abs() >= dl[i].abs() {
                if d[i] != 0.0 {
                    let fact = dl[i] / d[i];
                    dl[i] = fact;
                    d[i + 1] -= fact * du[i];
                }
            } else {
                // Interchange rows i and i + 1.
                let fact = d[i] / dl[i];
                d[i] = dl[i];
                dl[i] = fact;
                let temp = du[i];
                du[i] = d[i + 1];
                d[i + 1] = temp - fact * d[i + 1];
                if i + 2 < n {
                    du2[i] = du[i + 1];
                    du[i + 1] = -fact * du[i + 1];
                }
                ipiv[i] = i + 1;
            }
        }

        if let Some(pivot) = d.iter().position(|&v| v == 0.0) {
            return Err(FactorError::Singular(pivot));
        }
        Ok(Self {
            dl,
            d,
            du,
            du2,
            ipiv,
        })
    }

    fn solve_in_place(&self, b: &mut [f64]) {
        let n = self.d.len();
        if n == 0 {
            return;
        }
        // L * y = P * b
        for i in 0..n - 1 {
            let ip = self.ipiv[i];
            let other = 2 * i + 1 - ip;
            let temp = b[other] - self.dl[i] * b[ip];
            b[i] = b[ip];
            b[i + 1] = temp;
        }
        // U * x = y
        b[n - 1] /= self.d[n - 1];
        if n > 1 {
            b[n - 2] = (b[n - 2] - self.du[n - 2] * b[n - 1]) / self.d[n - 2];
        }
        for i in (0..n.saturating_sub(2)).rev() {
            b[i] = (b[i] - self.du[i] * b[i + 1] - self.du2[i] * b[i + 2]) / self.d[i];
        }
    }
}

impl LinearSolve for TridiagonalLu {
    fn solve_into(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>) {
        let n = self.d.len();
        let mut column = vec![0.0; n];
        for j in 0..rhs.ncols() {
            for (i, value) in column.iter_mut().enumerate() {
                *value = rhs[(i, j)];
            }
            self.solve_in_place(&mut column);
            for (i, value) in column.iter().enumerate() {
                out[(i, j)] = *value;
            }
        }
    }
}

impl Factorize for SymTridiagonal {
    type Factor = TridiagonalLu;

    fn factor_combination(
        &self,
        alpha: f64,
        mass: Option<&Self>,
    ) -> Result<TridiagonalLu, FactorError> {
        let (d, off): (Vec<f64>, Vec<f64>) = match mass {
            Some(m) => {
                if m.dim() != self.dim() {
                    return Err(FactorError::DimensionMismatch(self.dim(), m.dim()));
                }
                (
                    self.diag.iter().zip(&m.diag).map(|(a, b)| a + alpha * b).collect(),
                    self.off.iter().zip(&m.off).map(|(a, b)| a + alpha * b).collect(),
                )
            }
            None => (self.diag.iter().map(|a| a + alpha).collect(), self.off.clone()),
        };
        TridiagonalLu::factor(off.clone(), d, off)
    }
}
