//! The immutable description of an eigenproblem.

use crate::matrix::LinearOperator;

/// `A x = λ x` or `A x = λ M x`, asking for `nev` eigenpairs of an `n x n` problem.
///
/// The problem borrows its operators; it never copies or modifies them.
pub struct Problem<'a, Op: ?Sized> {
    n: usize,
    nev: usize,
    a: &'a Op,
    m: Option<&'a Op>,
}

impl<'a, Op: ?Sized> Problem<'a, Op> {
    /// Describes a problem of explicit dimension `n`.
    ///
    /// The dimension is checked against the operators by the drivers, not here.
    pub fn new(n: usize, nev: usize, a: &'a Op) -> Self {
        Self { n, nev, a, m: None }
    }

    /// Attaches the mass matrix `M` (or the geometric stiffness `KG` in buckling mode).
    pub fn with_mass(mut self, m: &'a Op) -> Self {
        self.m = Some(m);
        self
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn nev(&self) -> usize {
        self.nev
    }

    pub fn operator(&self) -> &'a Op {
        self.a
    }

    pub fn mass(&self) -> Option<&'a Op> {
        self.m
    }

    pub fn is_generalized(&self) -> bool {
        self.m.is_some()
    }
}

impl<'a, Op: LinearOperator + ?Sized> Problem<'a, Op> {
    /// A standard problem whose dimension is taken from `A`.
    pub fn standard(a: &'a Op, nev: usize) -> Self {
        Self::new(a.nrows(), nev, a)
    }

    /// A generalized problem whose dimension is taken from `A`.
    pub fn generalized(a: &'a Op, m: &'a Op, nev: usize) -> Self {
        Self::new(a.nrows(), nev, a).with_mass(m)
    }
}

impl<Op: ?Sized> Clone for Problem<'_, Op> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Op: ?Sized> Copy for Problem<'_, Op> {}
