//! Per-solve scratch storage shared by the engine, the driver and the extractor.
//!
//! All buffers are allocated once by [`Workspace::new`] and released when the
//! workspace is dropped, on every exit path of a solve.

use crate::{
    algorithms::Pointers,
    error::{EigsError, EigsErrorKind},
};
use faer::{Mat, MatMut, MatRef};

/// Number of columns of `workl` beyond the `ncv x ncv` projected matrix.
const WORKL_EXTRA_COLUMNS: usize = 8;

/// Scratch storage of a solve of dimension `n` with a subspace of `ncv` vectors.
#[derive(Debug)]
pub struct Workspace {
    pub(crate) resid: Mat<f64>,
    pub(crate) basis: Mat<f64>,
    pub(crate) workd: [Mat<f64>; 3],
    pub(crate) workl: Mat<f64>,
    pub(crate) select: Vec<bool>,
    pub(crate) ritz: Vec<f64>,
}

/// Disjoint mutable views of every buffer, for engines living outside the crate.
pub struct WorkspaceParts<'w> {
    /// Residual vector, `n x 1`.
    pub resid: MatMut<'w, f64>,
    /// Lanczos basis, `n x ncv`. Holds the Ritz vectors after extraction.
    pub basis: MatMut<'w, f64>,
    /// The three reverse-communication columns, each `n x 1`.
    pub workd: [MatMut<'w, f64>; 3],
    /// Projected-problem storage, `ncv x (ncv + 8)`.
    pub workl: MatMut<'w, f64>,
    pub select: &'w mut [bool],
    /// Ritz values, `2 * ncv` entries.
    pub ritz: &'w mut [f64],
}

/// The vectors a driver reads and writes while servicing one request.
pub struct RciVectors<'w> {
    pub x: MatRef<'w, f64>,
    pub y: MatMut<'w, f64>,
    /// `B * x`, present only when the engine designated it.
    pub bx: Option<MatRef<'w, f64>>,
}

impl Workspace {
    pub fn new(n: usize, ncv: usize) -> Self {
        Self {
            resid: Mat::zeros(n, 1),
            basis: Mat::zeros(n, ncv),
            workd: [Mat::zeros(n, 1), Mat::zeros(n, 1), Mat::zeros(n, 1)],
            workl: Mat::zeros(ncv, ncv + WORKL_EXTRA_COLUMNS),
            select: vec![false; ncv],
            ritz: vec![0.0; 2 * ncv],
        }
    }

    /// Problem dimension.
    pub fn n(&self) -> usize {
        self.resid.nrows()
    }

    /// Subspace size.
    pub fn ncv(&self) -> usize {
        self.basis.ncols()
    }

    pub fn basis(&self) -> MatRef<'_, f64> {
        self.basis.as_ref()
    }

    pub fn ritz(&self) -> &[f64] {
        &self.ritz
    }

    pub fn select(&self) -> &[bool] {
        &self.select
    }

    pub fn workd(&self, column: usize) -> Option<MatRef<'_, f64>> {
        self.workd.get(column).map(Mat::as_ref)
    }

    pub fn parts_mut(&mut self) -> WorkspaceParts<'_> {
        let [x, y, bx] = &mut self.workd;
        WorkspaceParts {
            resid: self.resid.as_mut(),
            basis: self.basis.as_mut(),
            workd: [x.as_mut(), y.as_mut(), bx.as_mut()],
            workl: self.workl.as_mut(),
            select: &mut self.select,
            ritz: &mut self.ritz,
        }
    }

    /// Borrows the columns designated by `pointers` for a driver.
    ///
    /// Fails if a pointer is out of range or two pointers alias the same column.
    pub fn rci_vectors(&mut self, pointers: &Pointers) -> Result<RciVectors<'_>, EigsError> {
        let [a, b, c] = &mut self.workd;
        let mut slots = [Some(a), Some(b), Some(c)];
        let mut take = |index: usize, what: &'static str| {
            slots
                .get_mut(index)
                .and_then(Option::take)
                .ok_or(EigsError::from(EigsErrorKind::Protocol(what)))
        };

        let y = take(pointers.y, "output column is invalid")?;
        let x: &Mat<f64> = take(pointers.x, "input column is invalid or aliases the output")?;
        let bx = match pointers.bx {
            Some(index) => {
                let bx: &Mat<f64> = take(index, "B*x column is invalid or aliases another column")?;
                Some(bx.as_ref())
            }
            None => None,
        };
        Ok(RciVectors {
            x: x.as_ref(),
            y: y.as_mut(),
            bx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let ws = Workspace::new(12, 5);
        assert_eq!(ws.n(), 12);
        assert_eq!(ws.ncv(), 5);
        assert_eq!(ws.workl.nrows(), 5);
        assert_eq!(ws.workl.ncols(), 13);
        assert_eq!(ws.ritz().len(), 10);
        assert_eq!(ws.select().len(), 5);
        assert!(ws.workd(3).is_none());
    }

    #[test]
    fn test_rci_vectors_are_distinct_columns() {
        let mut ws = Workspace::new(3, 2);
        ws.workd[0][(1, 0)] = 4.0;
        ws.workd[2][(1, 0)] = 7.0;

        let pointers = Pointers {
            x: 0,
            y: 1,
            bx: Some(2),
        };
        let mut io = ws.rci_vectors(&pointers).unwrap();
        io.y[(1, 0)] = io.x[(1, 0)] + io.bx.map_or(0.0, |bx| bx[(1, 0)]);
        assert_eq!(ws.workd(1).unwrap()[(1, 0)], 11.0);
    }

    #[test]
    fn test_rci_vectors_reject_aliasing() {
        let mut ws = Workspace::new(3, 2);
        let aliased = Pointers {
            x: 1,
            y: 1,
            bx: None,
        };
        assert_eq!(ws.rci_vectors(&aliased).err().map(|e| e.code()), Some(-9));

        let out_of_range = Pointers {
            x: 0,
            y: 1,
            bx: Some(3),
        };
        assert!(ws.rci_vectors(&out_of_range).is_err());
    }
}
