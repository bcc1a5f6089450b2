//! This module defines the custom error types for the library.
//!
//! Every way a solve can fail is collected into a single enum, [`EigsErrorKind`],
//! wrapped by the public [`EigsError`]. The wrapper exposes the integer status code
//! of the failure through [`EigsError::code`], so callers that speak the classic
//! "0 on success, negative on failure" convention can keep doing so.
//!
//! Using the [`thiserror`] crate allows us to create idiomatic error types with minimal
//! boilerplate. Diagnostics coming from the iteration engine are carried as a
//! translated [`EngineStatus`] rather than a bare integer.
use crate::{algorithms::Request, mode::ProblemMode, status::EngineStatus};
use thiserror::Error;

/// Represents all possible errors that can occur during an eigenvalue solve.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct EigsError(#[from] EigsErrorKind);

/// The distinct kinds of errors.
///
/// The first group (dimensions, subspace size, selectors, output shape) is always
/// detected before any workspace is allocated.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum EigsErrorKind {
    /// The problem has no rows or no eigenvalue was requested.
    #[error("Problem dimension and eigenvalue count must be positive (n = {n}, nev = {nev}).")]
    EmptyProblem { n: usize, nev: usize },

    /// More eigenvalues were requested than the problem has.
    #[error("Condition \"nev <= n\" is not met (nev = {nev}, n = {n}).")]
    TooManyEigenvalues { nev: usize, n: usize },

    /// The Lanczos subspace size is outside `nev+1 ..= n`.
    #[error("Condition \"nev+1 <= ncv <= n\" is not met (nev = {nev}, ncv = {ncv}, n = {n}).")]
    InvalidSubspace { nev: usize, ncv: usize, n: usize },

    /// A raw spectral-region selector did not match any known region.
    #[error("Invalid eigenvalue order type: {0}.")]
    InvalidOrder(String),

    /// A raw problem-mode selector did not match any known mode.
    #[error("Invalid eigs mode: {0}.")]
    InvalidMode(String),

    /// The driver registry has no driver for the requested mode.
    #[error("Unable to find a driver for mode {mode}.")]
    MissingDriver { mode: ProblemMode },

    /// A driver could not set itself up, e.g. a factorization failed.
    #[error("Driver '{driver}' failed to initialize: {reason}")]
    DriverInit { driver: &'static str, reason: String },

    /// A driver failed while servicing a reverse-communication request.
    #[error("Driver '{driver}' failed while servicing {request}: {reason}")]
    DriverApply {
        driver: &'static str,
        request: Request,
        reason: String,
    },

    /// A caller-provided buffer or operator does not match the problem dimension.
    #[error("Dimension mismatch: {what} is {actual} but the problem requires {expected}.")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The iteration engine reported a hard failure.
    #[error("Error with the iteration engine, info = {code}: {status}")]
    Engine { code: i32, status: EngineStatus },

    /// The iteration engine could not extract the converged eigenpairs.
    #[error("Error extracting eigenpairs, ierr = {code}: {status}")]
    Extraction { code: i32, status: EngineStatus },

    /// The engine designated workspace vectors that cannot be handed to a driver.
    #[error("Reverse-communication protocol violation: {0}")]
    Protocol(&'static str),
}

impl EigsError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &EigsErrorKind {
        &self.0
    }

    /// Returns the negative integer status code associated with this error.
    pub fn code(&self) -> i32 {
        match self.0 {
            EigsErrorKind::EmptyProblem { .. } | EigsErrorKind::TooManyEigenvalues { .. } => -1,
            EigsErrorKind::InvalidSubspace { .. } => -2,
            EigsErrorKind::InvalidOrder(_) => -3,
            EigsErrorKind::InvalidMode(_) => -4,
            EigsErrorKind::MissingDriver { .. } => -5,
            EigsErrorKind::DriverInit { .. } => -6,
            EigsErrorKind::DriverApply { .. } => -7,
            EigsErrorKind::DimensionMismatch { .. } => -8,
            EigsErrorKind::Engine { .. }
            | EigsErrorKind::Extraction { .. }
            | EigsErrorKind::Protocol(_) => -9,
        }
    }

    /// Builds a [`EigsErrorKind::DriverInit`] error.
    pub fn driver_init(driver: &'static str, reason: impl ToString) -> Self {
        EigsErrorKind::DriverInit {
            driver,
            reason: reason.to_string(),
        }
        .into()
    }

    /// Builds a [`EigsErrorKind::DriverApply`] error.
    pub fn driver_apply(driver: &'static str, request: Request, reason: impl ToString) -> Self {
        EigsErrorKind::DriverApply {
            driver,
            request,
            reason: reason.to_string(),
        }
        .into()
    }
}

// Manually implement PartialEq for the public error type.
// We compare the inner `EigsErrorKind`.
impl PartialEq for EigsError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

// Unit tests to ensure error messages and codes are what callers rely on.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_eigenvalues_message() {
        let error = EigsError(EigsErrorKind::TooManyEigenvalues { nev: 12, n: 10 });
        assert_eq!(
            error.to_string(),
            "Condition \"nev <= n\" is not met (nev = 12, n = 10)."
        );
        assert_eq!(error.code(), -1);
    }

    #[test]
    fn test_invalid_subspace_message() {
        let error = EigsError(EigsErrorKind::InvalidSubspace {
            nev: 5,
            ncv: 5,
            n: 100,
        });
        assert_eq!(
            error.to_string(),
            "Condition \"nev+1 <= ncv <= n\" is not met (nev = 5, ncv = 5, n = 100)."
        );
        assert_eq!(error.code(), -2);
    }

    #[test]
    fn test_driver_errors() {
        let error = EigsError::driver_init("standard-shift-invert", "matrix is singular");
        assert_eq!(
            error.to_string(),
            "Driver 'standard-shift-invert' failed to initialize: matrix is singular"
        );
        assert_eq!(error.code(), -6);

        let error = EigsError::driver_apply("generalized-cayley", Request::ApplyB, "boom");
        assert_eq!(
            error.to_string(),
            "Driver 'generalized-cayley' failed while servicing B*x (2): boom"
        );
        assert_eq!(error.code(), -7);
    }

    #[test]
    fn test_engine_error_message() {
        let error = EigsError(EigsErrorKind::Engine {
            code: -9,
            status: EngineStatus::from_code(-9),
        });
        assert_eq!(
            error.to_string(),
            "Error with the iteration engine, info = -9: Starting vector is zero."
        );
        assert_eq!(error.code(), -9);
    }

    #[test]
    fn test_selector_codes_are_distinct() {
        let order = EigsError(EigsErrorKind::InvalidOrder("XY".to_string()));
        let mode = EigsError(EigsErrorKind::InvalidMode("7".to_string()));
        assert_eq!(order.code(), -3);
        assert_eq!(mode.code(), -4);
        assert_ne!(order, mode);
    }
}
