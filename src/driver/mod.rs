//! The pluggable driver contract and the registry that maps modes to drivers.
//!
//! A [`Driver`] knows how to apply the iteration operator `OP` (and the inner-product
//! matrix `B`) of one [`ProblemMode`] for some operator type `Op`. Everything a driver
//! prepares for a particular solve, such as a factorization of `A - σM`, lives in the
//! [`DriverContext`] returned by [`Driver::init`]. The context is released when it is
//! dropped, which the solver guarantees on every exit path.
//!
//! The [`DriverRegistry`] has one slot per mode. Callers may replace individual slots
//! with their own drivers, or leave slots empty; asking for an empty slot fails
//! before any workspace is allocated.

pub mod modes;

use crate::{
    algorithms::Request, error::EigsError, factor::Factorize, matrix::LinearOperator,
    mode::ProblemMode, options::ResolvedOptions, problem::Problem, workspace::RciVectors,
};

pub use modes::{
    GeneralizedBuckling, GeneralizedCayley, GeneralizedRegularInverse, GeneralizedShiftInvert,
    StandardRegular, StandardShiftInvert,
};

/// Knows how to service reverse-communication requests for one problem mode.
pub trait Driver<Op: ?Sized>: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// The mode this driver implements.
    fn mode(&self) -> ProblemMode;

    /// Prepares per-solve state, e.g. factors the shifted operator.
    ///
    /// Returning an error aborts the solve before the workspace is allocated.
    fn init<'a>(
        &self,
        problem: &Problem<'a, Op>,
        options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Op: 'a;
}

/// Per-solve driver state. Dropping the context releases it.
pub trait DriverContext {
    /// Services one request, writing the result into `io.y`.
    ///
    /// `io.bx` holds `B * x` when the engine provides it.
    fn apply(&mut self, request: Request, io: RciVectors<'_>) -> Result<(), EigsError>;
}

/// Fixed table of six driver slots, one per [`ProblemMode`].
pub struct DriverRegistry<Op: ?Sized> {
    slots: [Option<Box<dyn Driver<Op>>>; 6],
}

impl<Op: ?Sized> DriverRegistry<Op> {
    /// A registry with every slot empty.
    pub fn empty() -> Self {
        Self {
            slots: [None, None, None, None, None, None],
        }
    }

    /// Installs `driver` in the slot of its own mode.
    pub fn with_driver(mut self, driver: impl Driver<Op> + 'static) -> Self {
        self.set(driver.mode(), Some(Box::new(driver)));
        self
    }

    /// Replaces the slot of `mode`, returning the previous driver.
    ///
    /// A driver may be installed in a slot other than its own mode; the solver calls
    /// whatever occupies the slot.
    pub fn set(
        &mut self,
        mode: ProblemMode,
        driver: Option<Box<dyn Driver<Op>>>,
    ) -> Option<Box<dyn Driver<Op>>> {
        std::mem::replace(&mut self.slots[mode.slot()], driver)
    }

    pub fn get(&self, mode: ProblemMode) -> Option<&dyn Driver<Op>> {
        self.slots[mode.slot()].as_deref()
    }
}

impl<Op: LinearOperator + ?Sized> DriverRegistry<Op> {
    /// Only the standard-regular slot, for operators that can only be multiplied.
    pub fn matrix_free() -> Self {
        Self::empty().with_driver(StandardRegular)
    }
}

impl<Op: Factorize> DriverRegistry<Op> {
    /// All six built-in drivers.
    pub fn factorizing() -> Self {
        Self::empty()
            .with_driver(StandardRegular)
            .with_driver(StandardShiftInvert)
            .with_driver(GeneralizedRegularInverse)
            .with_driver(GeneralizedShiftInvert)
            .with_driver(GeneralizedBuckling)
            .with_driver(GeneralizedCayley)
    }
}

impl<Op: Factorize> Default for DriverRegistry<Op> {
    fn default() -> Self {
        Self::factorizing()
    }
}
