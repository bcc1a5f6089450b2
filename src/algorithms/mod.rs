//! Iteration engines and the reverse-communication protocol they speak.
//!
//! An engine never touches `A` or `M` directly. Each call to
//! [`IterationEngine::iterate`] advances its internal state until it needs an operator
//! application, stores a [`Request`] together with the [`Pointers`] designating the
//! input and output columns of the workspace, and returns. The caller services the
//! request (through a driver) and calls `iterate` again, until the engine answers
//! [`Request::Done`]. The final status is left in [`ReverseComm::info`].

pub mod lanczos;

use crate::{
    mode::{MatrixKind, SpectralRegion, SpectralTransform},
    workspace::Workspace,
};
use std::fmt;

pub use lanczos::ThickRestartLanczos;

/// The action an engine asks its caller to perform.
///
/// The discriminants are the classic `ido` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Request {
    /// Nothing has happened yet; the first `iterate` call starts the engine.
    Start = 0,
    /// `y = OP * x`, where no `B * x` is available. Used for starting vectors.
    ApplyOpInit = -1,
    /// `y = OP * x`, with `B * x` available in the `bx` column for modes that need it.
    ApplyOp = 1,
    /// `y = B * x`.
    ApplyB = 2,
    /// The iteration finished; see [`ReverseComm::info`].
    Done = 99,
}

impl Request {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::ApplyOpInit => "OP*x without B*x",
            Self::ApplyOp => "OP*x",
            Self::ApplyB => "B*x",
            Self::Done => "done",
        };
        write!(f, "{label} ({})", self.code())
    }
}

/// Workspace columns an engine designates for the current request.
///
/// Indices refer to the three columns of [`Workspace::workd`](crate::workspace::Workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointers {
    pub x: usize,
    pub y: usize,
    pub bx: Option<usize>,
}

/// Input column of every request.
pub const COL_X: usize = 0;
/// Output column of every request.
pub const COL_Y: usize = 1;
/// Column holding `B * x` during an [`Request::ApplyOp`].
pub const COL_BX: usize = 2;

impl Default for Pointers {
    fn default() -> Self {
        Self {
            x: COL_X,
            y: COL_Y,
            bx: None,
        }
    }
}

/// The mutable state shared between an engine and its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseComm {
    pub ido: Request,
    pub info: i32,
    pub pointers: Pointers,
}

impl ReverseComm {
    pub fn new() -> Self {
        Self {
            ido: Request::Start,
            info: 0,
            pointers: Pointers::default(),
        }
    }
}

impl Default for ReverseComm {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only parameters of an iteration, fixed for a whole solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationParams {
    pub n: usize,
    pub matrix: MatrixKind,
    pub region: SpectralRegion,
    pub transform: SpectralTransform,
    pub nev: usize,
    pub ncv: usize,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub sigma: f64,
}

/// Counters reported by an engine once it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationStats {
    /// Restart cycles performed.
    pub iterations: usize,
    /// Ritz values that met the tolerance in the last cycle.
    pub converged: usize,
    pub op_applications: usize,
    pub b_applications: usize,
    pub reorthogonalizations: usize,
}

/// A reverse-communication eigensolver for symmetric problems.
pub trait IterationEngine {
    /// Advances the engine until it needs an operator application or finishes.
    fn iterate(&mut self, rci: &mut ReverseComm, params: &IterationParams, ws: &mut Workspace);

    /// Computes the Ritz values of the finished iteration and, if requested, the
    /// Ritz vectors.
    ///
    /// On success the first `nev` entries of the workspace Ritz-value array hold the
    /// eigenvalues of the original pencil in ascending order, and the first `nev`
    /// columns of the basis hold the matching vectors. Errors are engine status codes.
    fn extract(
        &mut self,
        want_vectors: bool,
        params: &IterationParams,
        ws: &mut Workspace,
    ) -> Result<(), i32>;

    fn stats(&self) -> IterationStats;
}

/// Returns the threshold below which a residual norm counts as a breakdown.
pub(crate) fn breakdown_tolerance() -> f64 {
    f64::EPSILON.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_codes() {
        assert_eq!(Request::Start.code(), 0);
        assert_eq!(Request::ApplyOpInit.code(), -1);
        assert_eq!(Request::ApplyOp.code(), 1);
        assert_eq!(Request::ApplyB.code(), 2);
        assert_eq!(Request::Done.code(), 99);
        assert_eq!(Request::ApplyOpInit.to_string(), "OP*x without B*x (-1)");
    }

    #[test]
    fn test_fresh_state() {
        let rci = ReverseComm::new();
        assert_eq!(rci.ido, Request::Start);
        assert_eq!(rci.info, 0);
        assert_eq!(rci.pointers.bx, None);
    }
}
