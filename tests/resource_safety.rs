//! Checks that a solve releases everything it allocates, on every exit path.
//!
//! A counting global allocator keeps per-thread totals of live bytes and of
//! allocation calls. Each test measures a window around a solve: the live byte count
//! must be back where it started once the window closes, whether the solve
//! succeeded or failed. Parameter errors must be reported without allocating at all.
//!
//! faer is pinned to sequential execution so that no work, and no allocation, moves
//! to pool threads the counters cannot see.

use faer::{Mat, Par};
use krylov_eigs::{
    Driver, DriverContext, DriverRegistry, EigsError, EigsOptions, EigsOutput, Problem,
    ProblemMode, SpectralRegion, algorithms::Request, algorithms::ThickRestartLanczos,
    options::ResolvedOptions, solve, solve_with_engine, workspace::RciVectors,
};
use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
};

struct CountingAllocator;

thread_local! {
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn record(bytes: isize, calls: usize) {
    // Ignore allocations made while a thread is being torn down.
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + bytes));
    let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + calls));
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record(layout.size() as isize, 1);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record(layout.size() as isize, 1);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record(-(layout.size() as isize), 0);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new = unsafe { System.realloc(ptr, layout, new_size) };
        if !new.is_null() {
            record(new_size as isize - layout.size() as isize, 1);
        }
        new
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

fn live_bytes() -> isize {
    LIVE_BYTES.with(Cell::get)
}

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

/// Runs `f` and returns the change in live bytes it caused.
fn net_bytes(f: impl FnOnce()) -> isize {
    let before = live_bytes();
    f();
    live_bytes() - before
}

fn diagonal(n: usize) -> Mat<f64> {
    Mat::from_fn(n, n, |i, j| if i == j { (i + 1) as f64 } else { 0.0 })
}

/// Runs one complete solve so that one-time lazy initialization happens outside
/// the measured windows.
fn warm_up(a: &Mat<f64>) {
    faer::set_global_parallelism(Par::Seq);
    let mut values = vec![0.0; 2];
    let options = EigsOptions {
        sigma: 2.5,
        tolerance: 1e-8,
        ..Default::default()
    };
    let _ = solve(
        &Problem::standard(a, 2),
        SpectralRegion::LargestMagnitude,
        ProblemMode::StandardShiftInvert,
        None,
        Some(&options),
        EigsOutput::values(&mut values),
    );
}

/// A driver whose context fails on the first `OP * x` request.
struct FailingDriver;

struct FailingContext;

impl Driver<Mat<f64>> for FailingDriver {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn mode(&self) -> ProblemMode {
        ProblemMode::StandardRegular
    }

    fn init<'a>(
        &self,
        _problem: &Problem<'a, Mat<f64>>,
        _options: &ResolvedOptions,
    ) -> Result<Box<dyn DriverContext + 'a>, EigsError>
    where
        Mat<f64>: 'a,
    {
        Ok(Box::new(FailingContext))
    }
}

impl DriverContext for FailingContext {
    fn apply(&mut self, request: Request, _io: RciVectors<'_>) -> Result<(), EigsError> {
        Err(EigsError::driver_apply("failing", request, "always fails"))
    }
}

#[test]
fn test_successful_solves_release_everything() {
    let a = diagonal(40);
    let m = Mat::from_fn(40, 40, |i, j| if i == j { 2.0 } else { 0.0 });
    warm_up(&a);
    let mut values = vec![0.0; 3];
    let mut vectors = Mat::<f64>::zeros(40, 3);

    for mode in ProblemMode::ALL {
        let options = EigsOptions {
            sigma: 10.3,
            tolerance: 1e-8,
            ..Default::default()
        };
        let problem = if mode.matrix_kind().is_generalized() {
            Problem::generalized(&a, &m, 3)
        } else {
            Problem::standard(&a, 3)
        };
        let delta = net_bytes(|| {
            let result = solve(
                &problem,
                SpectralRegion::LargestMagnitude,
                mode,
                None,
                Some(&options),
                EigsOutput::with_vectors(&mut values, vectors.as_mut()),
            );
            assert!(result.is_ok(), "{mode}: {result:?}");
        });
        assert_eq!(delta, 0, "{mode} leaked {delta} bytes");
    }
}

#[test]
fn test_failed_solves_release_everything() {
    let a = diagonal(30);
    warm_up(&a);
    let mut values = vec![0.0; 3];

    // Driver init: the shift is an eigenvalue, so A - σI is singular.
    let delta = net_bytes(|| {
        let options = EigsOptions {
            sigma: 3.0,
            ..Default::default()
        };
        let err = solve(
            &Problem::standard(&a, 3),
            SpectralRegion::LargestMagnitude,
            ProblemMode::StandardShiftInvert,
            None,
            Some(&options),
            EigsOutput::values(&mut values),
        )
        .unwrap_err();
        assert_eq!(err.code(), -6);
    });
    assert_eq!(delta, 0, "driver init failure leaked {delta} bytes");

    // Driver apply, inside the loop with the workspace allocated.
    let delta = net_bytes(|| {
        let registry = DriverRegistry::empty().with_driver(FailingDriver);
        let err = solve(
            &Problem::standard(&a, 3),
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            Some(&registry),
            None,
            EigsOutput::values(&mut values),
        )
        .unwrap_err();
        assert_eq!(err.code(), -7);
    });
    assert_eq!(delta, 0, "driver apply failure leaked {delta} bytes");

    // Engine failure after the workspace and the context exist.
    let delta = net_bytes(|| {
        let options = EigsOptions {
            max_iterations: 0,
            ..Default::default()
        };
        let err = solve(
            &Problem::standard(&a, 3),
            SpectralRegion::LargestAlgebraic,
            ProblemMode::StandardRegular,
            None,
            Some(&options),
            EigsOutput::values(&mut values),
        )
        .unwrap_err();
        assert_eq!(err.code(), -9);
    });
    assert_eq!(delta, 0, "engine failure leaked {delta} bytes");

    // A generalized driver without a mass matrix.
    let delta = net_bytes(|| {
        let err = solve(
            &Problem::standard(&a, 3),
            SpectralRegion::LargestAlgebraic,
            ProblemMode::GeneralizedShiftInvert,
            None,
            None,
            EigsOutput::values(&mut values),
        )
        .unwrap_err();
        assert_eq!(err.code(), -6);
    });
    assert_eq!(delta, 0, "missing mass matrix leaked {delta} bytes");
}

#[test]
fn test_parameter_errors_allocate_nothing() {
    let a = diagonal(20);
    warm_up(&a);
    let registry = DriverRegistry::<Mat<f64>>::matrix_free();
    let mut engine = ThickRestartLanczos::new();
    let mut values = vec![0.0; 21];
    let mut vectors = Mat::<f64>::zeros(19, 2);

    let cases: [(usize, EigsOptions, ProblemMode, i32); 5] = [
        // nev > n
        (21, EigsOptions::default(), ProblemMode::StandardRegular, -1),
        // nev = 0
        (0, EigsOptions::default(), ProblemMode::StandardRegular, -1),
        // ncv <= nev
        (
            4,
            EigsOptions {
                ncv: 4,
                ..Default::default()
            },
            ProblemMode::StandardRegular,
            -2,
        ),
        // ncv > n
        (
            4,
            EigsOptions {
                ncv: 21,
                ..Default::default()
            },
            ProblemMode::StandardRegular,
            -2,
        ),
        // No driver in the slot.
        (2, EigsOptions::default(), ProblemMode::GeneralizedCayley, -5),
    ];

    for (nev, options, mode, code) in cases {
        let before = allocations();
        let err = solve_with_engine(
            &Problem::standard(&a, nev),
            SpectralRegion::LargestAlgebraic,
            mode,
            &registry,
            Some(&options),
            EigsOutput::values(&mut values[..nev]),
            &mut engine,
        )
        .unwrap_err();
        assert_eq!(allocations(), before, "nev = {nev}, {options:?}, {mode}");
        assert_eq!(err.code(), code);
    }

    // A request for more eigenvalues than fit in a usize subspace.
    let before = allocations();
    let err = solve_with_engine(
        &Problem::standard(&a, usize::MAX),
        SpectralRegion::LargestAlgebraic,
        ProblemMode::StandardRegular,
        &registry,
        None,
        EigsOutput::values(&mut []),
        &mut engine,
    )
    .unwrap_err();
    assert_eq!(allocations(), before);
    assert_eq!(err.code(), -1);

    // Output shape is checked before anything is allocated too.
    let before = allocations();
    let err = solve_with_engine(
        &Problem::standard(&a, 2),
        SpectralRegion::LargestAlgebraic,
        ProblemMode::StandardRegular,
        &registry,
        None,
        EigsOutput::with_vectors(&mut values[..2], vectors.as_mut()),
        &mut engine,
    )
    .unwrap_err();
    assert_eq!(allocations(), before);
    assert_eq!(err.code(), -8);
}
