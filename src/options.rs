//! Tunables of a solve and their default policy.

use serde::{Deserialize, Serialize};

/// Caller-facing options. Zero or negative values request the documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigsOptions {
    /// Maximum number of restart cycles of the iteration engine.
    pub max_iterations: usize,
    /// Convergence tolerance; `<= 0` means machine precision.
    pub tolerance: f64,
    /// Spectral shift, only used by the shift-invert, buckling and Cayley modes.
    pub sigma: f64,
    /// Number of Lanczos basis vectors; `0` selects it from `nev` and `n`.
    pub ncv: usize,
}

impl Default for EigsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            tolerance: 0.0,
            sigma: 0.0,
            ncv: 0,
        }
    }
}

/// Options with every default filled in. Read-only for the duration of a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
    pub sigma: f64,
    pub ncv: usize,
}

/// Smallest subspace chosen automatically, unless the problem itself is smaller.
const MIN_AUTO_NCV: usize = 20;

impl EigsOptions {
    /// Resolves the defaults for a problem of dimension `n` asking for `nev` eigenpairs.
    ///
    /// An explicit `ncv` is taken as given; checking it against `nev` and `n` is the
    /// solver's job.
    pub fn resolve(&self, n: usize, nev: usize) -> ResolvedOptions {
        let ncv = if self.ncv == 0 {
            // Work per restart grows like n * ncv^2.
            nev.saturating_mul(2).max(MIN_AUTO_NCV).min(n)
        } else {
            self.ncv
        };
        let tolerance = if self.tolerance > 0.0 {
            self.tolerance
        } else {
            f64::EPSILON
        };
        ResolvedOptions {
            max_iterations: self.max_iterations,
            tolerance,
            sigma: self.sigma,
            ncv,
        }
    }
}

/// Resolves optional options, falling back to [`EigsOptions::default`].
pub fn resolve(options: Option<&EigsOptions>, n: usize, nev: usize) -> ResolvedOptions {
    options.copied().unwrap_or_default().resolve(n, nev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let resolved = resolve(None, 1000, 4);
        assert_eq!(resolved.max_iterations, 300);
        assert_eq!(resolved.tolerance, f64::EPSILON);
        assert_eq!(resolved.sigma, 0.0);
        assert_eq!(resolved.ncv, 20);
    }

    #[test]
    fn test_auto_ncv() {
        assert_eq!(resolve(None, 1000, 15).ncv, 30);
        // Never larger than the problem.
        assert_eq!(resolve(None, 12, 3).ncv, 12);
        assert_eq!(resolve(None, 30, 20).ncv, 30);
    }

    #[test]
    fn test_auto_ncv_with_huge_nev() {
        // Rejecting nev > n is left to the solver.
        assert_eq!(resolve(None, 10, usize::MAX).ncv, 10);
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let options = EigsOptions {
            max_iterations: 50,
            tolerance: 1e-9,
            sigma: 2.5,
            ncv: 7,
        };
        let resolved = options.resolve(100, 3);
        assert_eq!(resolved.max_iterations, 50);
        assert_eq!(resolved.tolerance, 1e-9);
        assert_eq!(resolved.sigma, 2.5);
        assert_eq!(resolved.ncv, 7);
    }

    #[test]
    fn test_negative_tolerance_means_machine_precision() {
        let options = EigsOptions {
            tolerance: -1.0,
            ..Default::default()
        };
        assert_eq!(options.resolve(50, 2).tolerance, f64::EPSILON);
    }
}
