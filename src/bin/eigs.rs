//! Command-line front end for the eigensolver.
//!
//! Solves a standard or generalized symmetric eigenproblem read from Matrix Market
//! files, or a synthetic test problem, with any of the six modes and any of the three
//! storage backends. The computed eigenvalues are printed, and can be written to a
//! CSV file together with relative residuals when eigenvectors are requested.

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use faer::{
    Mat, MatRef,
    sparse::{SparseColMat, Triplet},
};
use krylov_eigs::{
    DriverRegistry, EigsOptions, EigsOutput, Problem, ProblemMode, SpectralRegion, solve,
    matrix::LinearOperator,
    utils::data_loader::{load_matrix_market, to_tridiagonal},
};
use serde::Serialize;
use std::{path::PathBuf, time::Instant};

/// Synthetic problems available without input files.
#[derive(ValueEnum, Clone, Debug, Copy)]
enum SyntheticProblem {
    /// The 1D Laplacian `tridiag(-1, 2, -1)`, with the linear finite-element mass
    /// matrix `tridiag(1, 4, 1) / 6` for generalized modes.
    Laplacian,
    /// `diag(1, 2, ..., n)`, with the same mass matrix.
    Diagonal,
}

/// Storage format handed to the solver.
#[derive(ValueEnum, Clone, Debug, Copy)]
enum Backend {
    Dense,
    Sparse,
    Tridiagonal,
}

/// Command-line arguments for a single eigenvalue solve.
#[derive(Parser, Debug)]
#[clap(
    name = "eigs",
    about = "Computes a few eigenpairs of a sparse symmetric (generalized) eigenproblem."
)]
struct EigsArgs {
    /// Number of eigenvalues to compute.
    #[clap(long, default_value_t = 6)]
    nev: usize,

    /// Wanted part of the spectrum of the iteration operator: LA, SA, LM, SM or BE.
    #[clap(long, default_value = "LM")]
    region: SpectralRegion,

    /// Problem mode, by name (e.g. `standard-shift-invert`) or slot number 0-5.
    #[clap(long, default_value = "standard-regular")]
    mode: ProblemMode,

    /// Spectral shift for the shift-invert, buckling and Cayley modes.
    #[clap(long, default_value_t = 0.0)]
    sigma: f64,

    /// Lanczos subspace size, capped at the problem dimension; 0 picks it automatically.
    #[clap(long, default_value_t = 40)]
    ncv: usize,

    /// Convergence tolerance; 0 means machine precision.
    #[clap(long, default_value_t = 1e-10)]
    tol: f64,

    /// Maximum number of restart cycles.
    #[clap(long, default_value_t = 300)]
    max_iter: usize,

    /// Storage backend.
    #[clap(long, value_enum, default_value_t = Backend::Sparse)]
    backend: Backend,

    /// Matrix Market file with the operator A. Overrides the synthetic problem.
    #[clap(long, value_name = "PATH")]
    matrix: Option<PathBuf>,

    /// Matrix Market file with the mass matrix M.
    #[clap(long, value_name = "PATH")]
    mass: Option<PathBuf>,

    /// Synthetic problem used when no matrix file is given.
    #[clap(long, value_enum, default_value_t = SyntheticProblem::Laplacian)]
    problem: SyntheticProblem,

    /// Dimension of the synthetic problem.
    #[clap(long, default_value_t = 1000)]
    n: usize,

    /// Also compute eigenvectors and report residuals.
    #[clap(long)]
    vectors: bool,

    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Represents a single row of the results CSV.
#[derive(Debug, Serialize)]
struct EigenRecord {
    index: usize,
    eigenvalue: f64,
    /// `||A x - λ M x|| / max(1, |λ|)`, present when eigenvectors were computed.
    relative_residual: Option<f64>,
}

fn tridiagonal_triplets(n: usize, diag: f64, off: f64) -> Vec<Triplet<usize, usize, f64>> {
    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        triplets.push(Triplet {
            row: i,
            col: i,
            val: diag,
        });
        if i + 1 < n {
            triplets.push(Triplet {
                row: i,
                col: i + 1,
                val: off,
            });
            triplets.push(Triplet {
                row: i + 1,
                col: i,
                val: off,
            });
        }
    }
    triplets
}

fn synthetic_operator(problem: SyntheticProblem, n: usize) -> Result<SparseColMat<usize, f64>> {
    let triplets = match problem {
        SyntheticProblem::Laplacian => tridiagonal_triplets(n, 2.0, -1.0),
        SyntheticProblem::Diagonal => (0..n)
            .map(|i| Triplet {
                row: i,
                col: i,
                val: (i + 1) as f64,
            })
            .collect(),
    };
    Ok(SparseColMat::try_new_from_triplets(n, n, &triplets)?)
}

fn synthetic_mass(n: usize) -> Result<SparseColMat<usize, f64>> {
    let triplets = tridiagonal_triplets(n, 4.0 / 6.0, 1.0 / 6.0);
    Ok(SparseColMat::try_new_from_triplets(n, n, &triplets)?)
}

/// `||A x - λ M x|| / max(1, |λ|)` for a single column `x`.
fn relative_residual<Op: LinearOperator>(
    a: &Op,
    m: Option<&Op>,
    x: MatRef<'_, f64>,
    lambda: f64,
) -> f64 {
    let ax = a.apply(x);
    let mx = match m {
        Some(m) => m.apply(x),
        None => x.to_owned(),
    };
    let r = Mat::from_fn(x.nrows(), 1, |i, _| ax[(i, 0)] - lambda * mx[(i, 0)]);
    r.norm_l2() / lambda.abs().max(1.0)
}

fn solver_options(args: &EigsArgs, n: usize) -> EigsOptions {
    EigsOptions {
        max_iterations: args.max_iter,
        tolerance: args.tol,
        sigma: args.sigma,
        ncv: args.ncv.min(n),
    }
}

fn run<Op>(
    args: &EigsArgs,
    options: &EigsOptions,
    a: &Op,
    m: Option<&Op>,
) -> Result<Vec<EigenRecord>>
where
    Op: LinearOperator,
    DriverRegistry<Op>: Default,
{
    let n = a.nrows();
    let problem = match m {
        Some(m) => Problem::generalized(a, m, args.nev),
        None => Problem::standard(a, args.nev),
    };

    let mut values = vec![0.0; args.nev];
    let mut vectors = args.vectors.then(|| Mat::<f64>::zeros(n, args.nev));
    let output = match vectors.as_mut() {
        Some(v) => EigsOutput::with_vectors(&mut values, v.as_mut()),
        None => EigsOutput::values(&mut values),
    };

    let start = Instant::now();
    let report = solve(&problem, args.region, args.mode, None, Some(options), output)?;
    log::info!(
        "Finished in {:.3?} with ncv = {}, tol = {:e} ({} restarts, {} reorthogonalizations).",
        start.elapsed(),
        report.ncv,
        report.tolerance,
        report.stats.iterations,
        report.stats.reorthogonalizations
    );
    if let Some(warning) = report.warning {
        log::warn!("Results may be inaccurate: {warning}");
    }

    let records = values
        .iter()
        .enumerate()
        .map(|(i, &eigenvalue)| EigenRecord {
            index: i,
            eigenvalue,
            relative_residual: vectors
                .as_ref()
                .map(|x| relative_residual(a, m, x.as_ref().get(.., i..i + 1), eigenvalue)),
        })
        .collect();
    Ok(records)
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()?;
    let args = EigsArgs::parse();
    let (major, minor) = krylov_eigs::version();
    log::info!("krylov_eigs {major}.{minor}: {} for {}", args.mode, args.region);

    let a = match &args.matrix {
        Some(path) => load_matrix_market(path)
            .with_context(|| format!("Failed to load the operator from {}", path.display()))?,
        None => synthetic_operator(args.problem, args.n)?,
    };
    let n = a.as_ref().nrows();
    ensure!(
        n == a.as_ref().ncols(),
        "The operator must be square, got {n}x{}.",
        a.as_ref().ncols()
    );

    let m = if args.mode.matrix_kind().is_generalized() {
        Some(match &args.mass {
            Some(path) => load_matrix_market(path).with_context(|| {
                format!("Failed to load the mass matrix from {}", path.display())
            })?,
            None => synthetic_mass(n)?,
        })
    } else {
        if args.mass.is_some() {
            log::warn!("Mode {} is standard; ignoring the mass matrix.", args.mode);
        }
        None
    };

    let options = solver_options(&args, n);

    let records = match args.backend {
        Backend::Sparse => run(&args, &options, &a, m.as_ref())?,
        Backend::Dense => {
            let a = a.as_ref().to_dense();
            let m = m.map(|m| m.as_ref().to_dense());
            run(&args, &options, &a, m.as_ref())?
        }
        Backend::Tridiagonal => {
            let a = to_tridiagonal(&a)?;
            let m = m.as_ref().map(to_tridiagonal).transpose()?;
            run(&args, &options, &a, m.as_ref())?
        }
    };

    for record in &records {
        match record.relative_residual {
            Some(residual) => println!(
                "lambda[{}] = {:.12e}   residual = {:.3e}",
                record.index, record.eigenvalue, residual
            ),
            None => println!("lambda[{}] = {:.12e}", record.index, record.eigenvalue),
        }
    }

    if let Some(path) = &args.output {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        log::info!("Results written to {}", path.display());
    }
    Ok(())
}
