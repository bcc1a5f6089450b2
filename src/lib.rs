//! Reverse-communication Lanczos eigensolver for large sparse symmetric eigenproblems.
//!
//! This crate computes a few eigenpairs of a symmetric eigenproblem, either standard,
//! A x = λ x, or generalized, A x = λ M x. The iteration itself is an implicitly
//! restarted (thick-restart) Lanczos engine that never touches the matrices: it asks
//! the caller, through a reverse-communication protocol, to apply the iteration
//! operator OP or the mass matrix B to vectors that live in a shared [`Workspace`].
//!
//! Built on the [`faer`] linear algebra framework, the operators can be dense
//! ([`faer::Mat`]), sparse ([`faer::sparse::SparseColMat`]), symmetric tridiagonal
//! ([`factor::SymTridiagonal`]) or any user type implementing [`LinearOperator`].
//!
//! ## Modes
//!
//! Six problem formulations are supported, each served by a [`driver::Driver`]:
//!
//! | Mode | Problem | OP | B |
//! |---|---|---|---|
//! | standard regular | A x = λ x | A | I |
//! | standard shift-invert | A x = λ x | (A - σI)⁻¹ | I |
//! | generalized regular-inverse | A x = λ M x | M⁻¹A | M |
//! | generalized shift-invert | A x = λ M x | (A - σM)⁻¹M | M |
//! | generalized buckling | K x = λ KG x | (K - σKG)⁻¹K | K |
//! | generalized Cayley | A x = λ M x | (A - σM)⁻¹(A + σM) | M |
//!
//! The driver owns whatever factorization the mode needs; the solver only routes
//! requests between the engine and the driver, translates status codes and returns
//! the eigenpairs in descending order.
//!
//! ## Example Usage
//!
//! The following example computes the three largest eigenvalues of the 1D Laplacian
//! `tridiag(-1, 2, -1)` of size 50, whose spectrum is known in closed form.
//!
//! ```rust
//! use krylov_eigs::{
//!     EigsOptions, EigsOutput, Problem, ProblemMode, SpectralRegion, factor::SymTridiagonal,
//!     solve,
//! };
//!
//! let n = 50;
//! let a = SymTridiagonal::laplacian(n);
//! let problem = Problem::standard(&a, 3);
//!
//! let mut values = vec![0.0; 3];
//! let options = EigsOptions {
//!     tolerance: 1e-10,
//!     ..Default::default()
//! };
//! solve(
//!     &problem,
//!     SpectralRegion::LargestAlgebraic,
//!     ProblemMode::StandardRegular,
//!     None,
//!     Some(&options),
//!     EigsOutput::values(&mut values),
//! )
//! .unwrap();
//!
//! for (k, value) in values.iter().enumerate() {
//!     let j = (n - k) as f64;
//!     let exact = 2.0 - 2.0 * (j * std::f64::consts::PI / (n + 1) as f64).cos();
//!     assert!((value - exact).abs() < 1e-8);
//! }
//! ```
//!
//! Failures are reported as [`EigsError`], whose [`EigsError::code`] gives the classic
//! negative status of the C-style interface.

pub mod algorithms;
pub mod driver;
pub mod error;
pub mod extract;
pub mod factor;
pub mod matrix;
pub mod mode;
pub mod options;
pub mod problem;
pub mod solvers;
pub mod status;
pub mod utils;
pub mod workspace;

// Re-export the main API for convenient access.
pub use driver::{Driver, DriverContext, DriverRegistry};
pub use error::{EigsError, EigsErrorKind};
pub use extract::EigsOutput;
pub use matrix::LinearOperator;
pub use mode::{ProblemMode, SpectralRegion};
pub use options::EigsOptions;
pub use problem::Problem;
pub use solvers::{SolveReport, solve, solve_with_engine, solve_with_registry};
pub use status::EngineStatus;
pub use workspace::Workspace;

/// Returns the `(major, minor)` version of the library.
pub fn version() -> (u32, u32) {
    let major = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0);
    let minor = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0);
    (major, minor)
}
