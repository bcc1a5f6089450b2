//! The six built-in drivers.
//!
//! | Driver | `OP` | `B` |
//! |---|---|---|
//! | [`StandardRegular`] | `A` | `I` |
//! | [`StandardShiftInvert`] | `(A - σI)^-1` | `I` |
//! | [`GeneralizedRegularInverse`] | `M^-1 A` | `M` |
//! | [`GeneralizedShiftInvert`] | `(A - σM)^-1 M` | `M` |
//! | [`GeneralizedBuckling`] | `(A - σM)^-1 A` | `A` |
//! | [`GeneralizedCayley`] | `(A - σM)^-1 (A + σM)` | `M` |
//!
//! Only the standard regular driver works with any [`LinearOperator`]; the others need
//! an operator type that can factor itself ([`Factorize`]).

use super::{Driver, DriverContext};
use crate::{
    algorithms::Request,
    error::EigsError,
    factor::{FactorError, Factorize, LinearSolve},
    matrix::LinearOperator,
    mode::ProblemMode,
    options::ResolvedOptions,
    problem::Problem,
    workspace::RciVectors,
};
use faer::{Mat, MatMut, MatRef};

/// `OP = A`, no factorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRegular;

/// `OP = (A - σI)^-1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardShiftInvert;

/// `OP = M^-1 A` with `M` symmetric positive definite.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedRegularInverse;

/// `OP = (A - σM)^-1 M`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedShiftInvert;

/// `OP = (K - σKG)^-1 K`, with `K` passed as `A` and `KG` as `M`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedBuckling;

/// `OP = (A - σM)^-1 (A + σM)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedCayley;

/// How a factored driver builds the right-hand side of its solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// `y = F^-1 (B x)`.
    SolveB,
    /// `y = F^-1 (A x)`.
    SolveA,
    /// `y = F^-1 (A x + σ B x)`.
    Cayley,
}

struct MatVecContext<'a, Op: ?Sized> {
    name: &'static str,
    a: &'a Op,
}

struct FactoredContext<'a, Op: ?Sized, F> {
    name: &'static str,
    form: Form,
    a: &'a Op,
    /// `None` stands for the identity.
    b: Option<&'a Op>,
    factor: F,
    sigma: f64,
    tmp: Mat<f64>,
}

impl<Op: LinearOperator + ?Sized> DriverContext for MatVecContext<'_, Op> {
    fn apply(&mut self, request: Request, io: RciVectors<'_>) -> Result<(), EigsError> {
        let RciVectors { x, mut y, .. } = io;
        match request {
            Request::ApplyOp | Request::ApplyOpInit => self.a.apply_into(y.as_mut(), x),
            Request::ApplyB => y.copy_from(x),
            Request::Start | Request::Done => return Err(unsupported(self.name, request)),
        }
        check_finite(self.name, request, y.as_ref())
    }
}

impl<Op: LinearOperator + ?Sized, F: LinearSolve> FactoredContext<'_, Op, F> {
    fn apply_op(
        &mut self,
        mut y: MatMut<'_, f64>,
        x: MatRef<'_, f64>,
        bx: Option<MatRef<'_, f64>>,
    ) {
        match self.form {
            Form::SolveA => {
                self.a.apply_into(self.tmp.as_mut(), x);
                self.factor.solve_into(y, self.tmp.as_ref());
            }
            Form::SolveB => match bx {
                Some(bx) => self.factor.solve_into(y, bx),
                None => {
                    apply_b(self.b, self.tmp.as_mut(), x);
                    self.factor.solve_into(y, self.tmp.as_ref());
                }
            },
            Form::Cayley => {
                self.a.apply_into(self.tmp.as_mut(), x);
                // `y` doubles as scratch for B x.
                let shifted = match bx {
                    Some(bx) => bx,
                    None => {
                        apply_b(self.b, y.as_mut(), x);
                        y.as_ref()
                    }
                };
                for i in 0..self.tmp.nrows() {
                    self.tmp[(i, 0)] += self.sigma * shifted[(i, 0)];
                }
                self.factor.solve_into(y, self.tmp.as_ref());
            }
        }
    }
}

impl<Op: LinearOperator + ?Sized, F: LinearSolve> DriverContext for FactoredContext<'_, Op, F> {
    fn apply(&mut self, request: Request, io: RciVectors<'_>) -> Result<(), EigsError> {
        let RciVectors { x, mut y, bx } = io;
        match request {
            Request::ApplyOp => self.apply_op(y.as_mut(), x, bx),
            // No B x is available yet for a fresh vector.
            Request::ApplyOpInit => self.apply_op(y.as_mut(), x, None),
            Request::ApplyB => apply_b(self.b, y.as_mut(), x),
            Request::Start | Request::Done => return Err(unsupported(self.name, request)),
        }
        check_finite(self.name, request, y.as_ref())
    }
}

fn apply_b<Op: LinearOperator + ?Sized>(
    b: Option<&Op>,
    mut out: MatMut<'_, f64>,
    x: MatRef<'_, f64>,
) {
    match b {
        Some(b) => b.apply_into(out, x),
        None => out.copy_from(x),
    }
}

fn unsupported(name: &'static str, request: Request) -> EigsError {
    EigsError::driver_apply(name, request, "request is not part of the protocol")
}

fn check_finite(name: &'static str, request: Request, y: MatRef<'_, f64>) -> Result<(), EigsError> {
    for i in 0..y.nrows() {
        if !y[(i, 0)].is_finite() {
            return Err(EigsError::driver_apply(
                name,
                request,
                format!("non-finite value in output entry {i}"),
            ));
        }
    }
    Ok(())
}

fn check_operator<Op: LinearOperator + ?Sized>(
    name: &'static str,
    label: &str,
    op: &Op,
    n: usize,
) -> Result<(), EigsError> {
    if op.nrows() != n || op.ncols() != n {
        return Err(EigsError::driver_init(
            name,
            format!(
                "operator {label} is {}x{} but the problem dimension is {n}",
                op.nrows(),
                op.ncols()
            ),
        ));
    }
    Ok(())
}

fn require_mass<'a, Op: LinearOperator + ?Sized>(
    name: &'static str,
    problem: &Problem<'a, Op>,
) -> Result<&'a Op, EigsError> {
    let m = problem
        .mass()
        .ok_or_else(|| EigsError::driver_init(name, "this mode needs a mass matrix M"))?;
    check_operator(name, "M", m, problem.n())?;
    Ok(m)
}

fn require_shift(name: &'static str, sigma: f64) -> Result<(), EigsError> {
    if sigma == 0.0 || !sigma.is_finite() {
        return Err(EigsError::driver_init(
            name,
            format!("this mode needs a finite, non-zero shift (sigma = {sigma})"),
        ));
    }
    Ok(())
}

fn factored<'a, Op: Factorize>(
    name: &'static str,
    form: Form,
    problem: &Problem<'a, Op>,
    b: Option<&'a Op>,
    factor: Result<Op::Factor, FactorError>,
    sigma: f64,
) -> Result<Box<dyn DriverContext + 'a>, EigsError> {
    let factor = factor.map_err(|e| EigsError::driver_init(name, e))?;
    log::debug!("Driver '{name}' factored its operator (n = {}).", problem.n());
    Ok(Box::new(FactoredContext {
        name,
        form,
        a: problem.operator(),
        b,
        factor,
        sigma,
        tmp: Mat::zeros(problem.n(), 1),
    }))
}

impl<Op: LinearOperator + ?Sized> Driver<Op> for StandardRegular {
    fn name(&self) -> &'static str {
        ProblemMode::StandardRegular.name()
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::StandardRegular
    }

    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        _options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a,
    {
        let name = Driver::<Op>::name(self);
        check_operator(name, "A", problem.operator(), problem.n())?;
        Ok(Box::new(MatVecContext {
            name,
            a: problem.operator(),
        }))
    }
}

impl<Op: Factorize> Driver<Op> for StandardShiftInvert {
    fn name(&self) -> &'static str {
        ProblemMode::StandardShiftInvert.name()
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::StandardShiftInvert
    }

    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a,
    {
        let name = Driver::<Op>::name(self);
        let a = problem.operator();
        check_operator(name, "A", a, problem.n())?;
        let factor = a.factor_combination(-options.sigma, None);
        factored(name, Form::SolveB, problem, None, factor, options.sigma)
    }
}

impl<Op: Factorize> Driver<Op> for GeneralizedRegularInverse {
    fn name(&self) -> &'static str {
        ProblemMode::GeneralizedRegularInverse.name()
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::GeneralizedRegularInverse
    }

    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a,
    {
        let name = Driver::<Op>::name(self);
        check_operator(name, "A", problem.operator(), problem.n())?;
        let m = require_mass(name, problem)?;
        factored(name, Form::SolveA, problem, Some(m), m.factor_definite(), options.sigma)
    }
}

impl<Op: Factorize> Driver<Op> for GeneralizedShiftInvert {
    fn name(&self) -> &'static str {
        ProblemMode::GeneralizedShiftInvert.name()
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::GeneralizedShiftInvert
    }

    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a,
    {
        let name = Driver::<Op>::name(self);
        let a = problem.operator();
        check_operator(name, "A", a, problem.n())?;
        let m = require_mass(name, problem)?;
        let factor = a.factor_combination(-options.sigma, Some(m));
        factored(name, Form::SolveB, problem, Some(m), factor, options.sigma)
    }
}

impl<Op: Factorize> Driver<Op> for GeneralizedBuckling {
    fn name(&self) -> &'static str {
        ProblemMode::GeneralizedBuckling.name()
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::GeneralizedBuckling
    }

    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a,
    {
        let name = Driver::<Op>::name(self);
        let a = problem.operator();
        check_operator(name, "A", a, problem.n())?;
        let m = require_mass(name, problem)?;
        require_shift(name, options.sigma)?;
        let factor = a.factor_combination(-options.sigma, Some(m));
        // The inner product is the one induced by K.
        factored(name, Form::SolveB, problem, Some(a), factor, options.sigma)
    }
}

impl<Op: Factorize> Driver<Op> for GeneralizedCayley {
    fn name(&self) -> &'static str {
        ProblemMode::GeneralizedCayley.name()
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::GeneralizedCayley
    }

    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a,
    {
        let name = Driver::<Op>::name(self);
        let a = problem.operator();
        check_operator(name, "A", a, problem.n())?;
        let m = require_mass(name, problem)?;
        require_shift(name, options.sigma)?;
        let factor = a.factor_combination(-options.sigma, Some(m));
        factored(name, Form::Cayley, problem, Some(m), factor, options.sigma)
    }
}
