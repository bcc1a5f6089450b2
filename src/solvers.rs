//! This module provides the high-level API: one call runs a complete eigenvalue solve.
//!
//! A solve proceeds in a fixed order. Options are resolved and the problem dimensions
//! are validated before anything is allocated. The (region, mode) pair is dispatched,
//! the driver for the mode is looked up and initialized, and only then is the
//! [`Workspace`] allocated. The reverse-communication loop hands every engine request
//! to the driver context until the engine reports completion, after which the engine
//! status is translated, the eigenpairs are extracted and written to the caller's
//! buffers in reversed order.
//!
//! The driver context and the workspace are owned by the solve and dropped on every
//! exit path, successful or not.

use crate::{
    algorithms::{
        IterationEngine, IterationParams, IterationStats, Request, ReverseComm,
        ThickRestartLanczos,
    },
    driver::DriverRegistry,
    error::{EigsError, EigsErrorKind},
    extract::{self, EigsOutput},
    mode::{ProblemMode, SpectralRegion, dispatch},
    options::{self, EigsOptions, ResolvedOptions},
    problem::Problem,
    status::{EngineStatus, Severity},
    workspace::Workspace,
};

/// What a successful solve reports besides the eigenpairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// A soft engine warning, e.g. the iteration cap was reached. The eigenpairs are
    /// the best approximations available; the caller decides whether to accept them.
    pub warning: Option<EngineStatus>,
    pub stats: IterationStats,
    /// Subspace size actually used.
    pub ncv: usize,
    /// Convergence tolerance actually used.
    pub tolerance: f64,
}

impl SolveReport {
    pub fn is_clean(&self) -> bool {
        self.warning.is_none()
    }
}

/// Computes `nev` eigenpairs with the built-in drivers and engine.
///
/// # Arguments
/// * `problem`: The operators and the problem size.
/// * `region`: Which eigenvalues of the iteration operator are wanted.
/// * `mode`: The problem formulation; selects the driver.
/// * `registry`: Drivers to use instead of the built-in ones.
/// * `options`: Solver tunables; `None` selects every default.
/// * `output`: Caller-owned buffers for `nev` eigenvalues and, optionally, `n x nev` eigenvectors.
///
/// # Returns
/// A [`SolveReport`] on success (possibly carrying a soft warning), or an [`EigsError`]
/// whose [`EigsError::code`] is the classic negative status.
pub fn solve<Op>(
    problem: &Problem<'_, Op>,
    region: SpectralRegion,
    mode: ProblemMode,
    registry: Option<&DriverRegistry<Op>>,
    options: Option<&EigsOptions>,
    output: EigsOutput<'_>,
) -> Result<SolveReport, EigsError>
where
    DriverRegistry<Op>: Default,
{
    let mut engine = ThickRestartLanczos::new();
    match registry {
        Some(registry) => {
            solve_with_engine(problem, region, mode, registry, options, output, &mut engine)
        }
        None => {
            let registry = DriverRegistry::default();
            solve_with_engine(problem, region, mode, &registry, options, output, &mut engine)
        }
    }
}

/// Like [`solve`], for operator types that have no default registry.
pub fn solve_with_registry<Op: ?Sized>(
    problem: &Problem<'_, Op>,
    region: SpectralRegion,
    mode: ProblemMode,
    registry: &DriverRegistry<Op>,
    options: Option<&EigsOptions>,
    output: EigsOutput<'_>,
) -> Result<SolveReport, EigsError> {
    let mut engine = ThickRestartLanczos::new();
    solve_with_engine(problem, region, mode, registry, options, output, &mut engine)
}

/// Runs a solve with a caller-supplied iteration engine.
pub fn solve_with_engine<Op, E>(
    problem: &Problem<'_, Op>,
    region: SpectralRegion,
    mode: ProblemMode,
    registry: &DriverRegistry<Op>,
    options: Option<&EigsOptions>,
    mut output: EigsOutput<'_>,
    engine: &mut E,
) -> Result<SolveReport, EigsError>
where
    Op: ?Sized,
    E: IterationEngine + ?Sized,
{
    let (n, nev) = (problem.n(), problem.nev());
    let resolved = options::resolve(options, n, nev);
    validate(n, nev, &resolved)?;
    check_output(n, nev, &output)?;

    let dispatched = dispatch(region, mode);
    log::debug!(
        "Dispatching {mode} (bmat = {}, transform = {}) for {region} with n = {n}, nev = {nev}, ncv = {}.",
        dispatched.matrix.tag(),
        dispatched.transform.code(),
        resolved.ncv
    );

    let driver = registry
        .get(mode)
        .ok_or(EigsErrorKind::MissingDriver { mode })?;
    let mut context = driver.init(problem, &resolved)?;
    let mut ws = Workspace::new(n, resolved.ncv);

    let params = IterationParams {
        n,
        matrix: dispatched.matrix,
        region,
        transform: dispatched.transform,
        nev,
        ncv: resolved.ncv,
        tolerance: resolved.tolerance,
        max_iterations: resolved.max_iterations,
        sigma: resolved.sigma,
    };

    let mut rci = ReverseComm::new();
    loop {
        engine.iterate(&mut rci, &params, &mut ws);
        if rci.ido == Request::Done {
            break;
        }
        let io = ws.rci_vectors(&rci.pointers)?;
        context.apply(rci.ido, io)?;
    }

    let status = EngineStatus::from_code(rci.info);
    if status.severity() == Severity::Error {
        log::error!("Error with the iteration engine, info = {}: {status}", rci.info);
        return Err(EigsErrorKind::Engine {
            code: rci.info,
            status,
        }
        .into());
    }

    engine
        .extract(output.wants_vectors(), &params, &mut ws)
        .map_err(|code| {
            let status = EngineStatus::from_code(code);
            log::error!("Error extracting eigenpairs, ierr = {code}: {status}");
            EigsError::from(EigsErrorKind::Extraction { code, status })
        })?;

    let warning = match status.severity() {
        Severity::Warning => {
            log::warn!("Iteration engine warning, info = {}: {status}", rci.info);
            Some(status)
        }
        _ => None,
    };

    extract::reorder_into(&ws, nev, &mut output);

    let stats = engine.stats();
    log::info!(
        "Solved {mode} for {nev} eigenvalues: {} restarts, {} OP and {} B applications.",
        stats.iterations,
        stats.op_applications,
        stats.b_applications
    );
    Ok(SolveReport {
        warning,
        stats,
        ncv: resolved.ncv,
        tolerance: resolved.tolerance,
    })
}

/// Checks the problem size against the resolved subspace size.
fn validate(n: usize, nev: usize, resolved: &ResolvedOptions) -> Result<(), EigsError> {
    if n == 0 || nev == 0 {
        return Err(EigsErrorKind::EmptyProblem { n, nev }.into());
    }
    if nev > n {
        return Err(EigsErrorKind::TooManyEigenvalues { nev, n }.into());
    }
    let ncv = resolved.ncv;
    if ncv <= nev || ncv > n {
        return Err(EigsErrorKind::InvalidSubspace { nev, ncv, n }.into());
    }
    Ok(())
}

fn check_output(n: usize, nev: usize, output: &EigsOutput<'_>) -> Result<(), EigsError> {
    let mismatch = |what, expected, actual| -> Result<(), EigsError> {
        Err(EigsErrorKind::DimensionMismatch {
            what,
            expected,
            actual,
        }
        .into())
    };
    if output.eigenvalues.len() != nev {
        return mismatch("eigenvalue buffer length", nev, output.eigenvalues.len());
    }
    if let Some(vectors) = &output.eigenvectors {
        if vectors.nrows() != n {
            return mismatch("eigenvector row count", n, vectors.nrows());
        }
        if vectors.ncols() != nev {
            return mismatch("eigenvector column count", nev, vectors.ncols());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    fn diagonal(n: usize) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| if i == j { (i + 1) as f64 } else { 0.0 })
    }

    #[test]
    fn test_validation_codes() {
        let a = diagonal(10);
        let mut values = vec![0.0; 11];

        let problem = Problem::standard(&a, 11);
        let err = solve(
            &problem,
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            None,
            None,
            EigsOutput::values(&mut values),
        )
        .unwrap_err();
        assert_eq!(err.code(), -1);

        // Auto ncv is clamped to n, which leaves no room for nev = n.
        let problem = Problem::standard(&a, 10);
        let err = solve(
            &problem,
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            None,
            None,
            EigsOutput::values(&mut values[..10]),
        )
        .unwrap_err();
        assert_eq!(err.code(), -2);

        let problem = Problem::standard(&a, 0);
        let err = solve(
            &problem,
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            None,
            None,
            EigsOutput::values(&mut values[..0]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), &EigsErrorKind::EmptyProblem { n: 10, nev: 0 });
    }

    #[test]
    fn test_output_shape_is_checked() {
        let a = diagonal(10);
        let problem = Problem::standard(&a, 2);
        let mut values = vec![0.0; 2];
        let mut vectors = Mat::<f64>::zeros(9, 2);
        let err = solve(
            &problem,
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            None,
            None,
            EigsOutput::with_vectors(&mut values, vectors.as_mut()),
        )
        .unwrap_err();
        assert_eq!(
            err.kind(),
            &EigsErrorKind::DimensionMismatch {
                what: "eigenvector row count",
                expected: 10,
                actual: 9
            }
        );
        assert_eq!(err.code(), -8);
    }

    #[test]
    fn test_missing_driver() {
        let a = diagonal(10);
        let problem = Problem::standard(&a, 2);
        let registry = DriverRegistry::<Mat<f64>>::matrix_free();
        let mut values = vec![0.0; 2];
        let err = solve_with_registry(
            &problem,
            SpectralRegion::LargestMagnitude,
            ProblemMode::StandardShiftInvert,
            &registry,
            None,
            EigsOutput::values(&mut values),
        )
        .unwrap_err();
        assert_eq!(
            err.kind(),
            &EigsErrorKind::MissingDriver {
                mode: ProblemMode::StandardShiftInvert
            }
        );
        assert_eq!(err.code(), -5);
    }

    #[test]
    fn test_small_solve_reports_statistics() {
        let a = diagonal(10);
        let problem = Problem::standard(&a, 2);
        let mut values = vec![0.0; 2];
        let options = EigsOptions {
            ncv: 6,
            tolerance: 1e-10,
            ..Default::default()
        };
        let report = solve(
            &problem,
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            None,
            Some(&options),
            EigsOutput::values(&mut values),
        )
        .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.ncv, 6);
        assert!(report.stats.op_applications > 0);
        assert_eq!(report.stats.b_applications, 0);
        assert!((values[0] - 10.0).abs() < 1e-8);
        assert!((values[1] - 9.0).abs() < 1e-8);
    }
}
