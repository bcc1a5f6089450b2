//! Copies extracted eigenpairs from the workspace into caller-owned buffers.
//!
//! The engine leaves eigenvalues in ascending algebraic order. Output position `i`
//! receives engine position `nev - 1 - i`, for the values and the vector columns
//! alike, whatever region was requested. Callers therefore see eigenvalues in
//! descending algebraic order.

use crate::workspace::Workspace;
use faer::MatMut;

/// Caller-owned destination of a solve.
pub struct EigsOutput<'o> {
    /// Exactly `nev` entries.
    pub eigenvalues: &'o mut [f64],
    /// `n x nev`, or `None` when only eigenvalues are wanted.
    pub eigenvectors: Option<MatMut<'o, f64>>,
}

impl<'o> EigsOutput<'o> {
    pub fn values(eigenvalues: &'o mut [f64]) -> Self {
        Self {
            eigenvalues,
            eigenvectors: None,
        }
    }

    pub fn with_vectors(eigenvalues: &'o mut [f64], eigenvectors: MatMut<'o, f64>) -> Self {
        Self {
            eigenvalues,
            eigenvectors: Some(eigenvectors),
        }
    }

    pub fn wants_vectors(&self) -> bool {
        self.eigenvectors.is_some()
    }
}

/// Writes the first `nev` extracted pairs into `output`, reversed.
///
/// Shapes are checked by the solver before the workspace is allocated.
pub(crate) fn reorder_into(ws: &Workspace, nev: usize, output: &mut EigsOutput<'_>) {
    for (i, value) in output.eigenvalues.iter_mut().take(nev).enumerate() {
        *value = ws.ritz[nev - 1 - i];
    }
    if let Some(vectors) = output.eigenvectors.as_mut() {
        let n = ws.n();
        for i in 0..nev {
            let source = nev - 1 - i;
            for row in 0..n {
                vectors[(row, i)] = ws.basis[(row, source)];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    #[test]
    fn test_reversal() {
        let (n, nev) = (4, 3);
        let mut ws = Workspace::new(n, 4);
        for k in 0..nev {
            ws.ritz[k] = k as f64 + 1.0;
            for row in 0..n {
                ws.basis[(row, k)] = (10 * k + row) as f64;
            }
        }
        // Entries past nev must not leak into the output.
        ws.ritz[nev] = 99.0;

        let mut values = vec![0.0; nev];
        let mut vectors = Mat::<f64>::zeros(n, nev);
        let mut output = EigsOutput::with_vectors(&mut values, vectors.as_mut());
        reorder_into(&ws, nev, &mut output);

        assert_eq!(values, vec![3.0, 2.0, 1.0]);
        for i in 0..nev {
            for row in 0..n {
                assert_eq!(vectors[(row, i)], (10 * (nev - 1 - i) + row) as f64);
            }
        }
    }

    #[test]
    fn test_values_only() {
        let mut ws = Workspace::new(2, 2);
        ws.ritz[0] = -1.0;
        let mut values = [0.0];
        let mut output = EigsOutput::values(&mut values);
        assert!(!output.wants_vectors());
        reorder_into(&ws, 1, &mut output);
        assert_eq!(values, [-1.0]);
    }
}
