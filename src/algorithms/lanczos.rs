//! Thick-restart symmetric Lanczos, driven by reverse communication.
//!
//! The engine builds a $\mathbf{B}$-orthonormal basis $\mathbf{V}_m$ of a Krylov subspace of
//! the iteration operator $\mathrm{OP}$ together with the projected symmetric matrix
//! $\mathbf{T}_m = \mathbf{V}_m^T \mathbf{B}\, \mathrm{OP}\, \mathbf{V}_m$. After each cycle of
//! `m = ncv` steps it computes the Ritz pairs of $\mathbf{T}_m$ and checks them against the
//! convergence criterion
//!
//! $$ \beta_m |u_{m,i}| \le \mathrm{tol} \cdot \max(\varepsilon^{2/3}, |\theta_i|). $$
//!
//! If fewer than `nev` wanted Ritz values have converged, the basis is compressed onto
//! the `k = nev + (m - nev) / 2` most wanted Ritz vectors and the iteration continues
//! from the residual. The compressed $\mathbf{T}_{k+1}$ is an arrowhead matrix: the kept
//! Ritz values on the diagonal, coupled to the residual direction by
//! $s_i = \beta_m u_{m,i}$.
//!
//! Orthogonality is maintained by full classical Gram-Schmidt against the stored basis
//! with DGKS refinement, so no selective reorthogonalization bookkeeping is needed.
//!
//! The engine never owns the operator. Every product $\mathrm{OP}\,x$ or $\mathbf{B}x$ is
//! requested through [`ReverseComm`] and serviced by the caller, and the engine picks up
//! where it left off on the next call to [`IterationEngine::iterate`].

use super::{
    COL_BX, COL_X, COL_Y, IterationEngine, IterationParams, IterationStats, Pointers, Request,
    ReverseComm, breakdown_tolerance,
};
use crate::{
    mode::{SpectralRegion, SpectralTransform},
    workspace::Workspace,
};
use faer::{Accum, Mat, MatRef, Par, Side, linalg::matmul::matmul};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Seed of the starting-vector generator. Repeated solves see the same vectors.
const DEFAULT_SEED: u64 = 42;

/// A projection is refined while it shrinks the vector below this fraction of its norm.
const DGKS_RATIO: f64 = 0.717;

const MAX_REFINEMENTS: usize = 2;

/// Random vectors tried before an invariant subspace is declared a failure.
const MAX_RESTART_VECTOR_ATTEMPTS: usize = 3;

const CODE_ZERO_START: i32 = -9;
const CODE_EIGEN_FAILURE: i32 = -8;
const CODE_NOTHING_TO_EXTRACT: i32 = -14;
const CODE_BREAKDOWN: i32 = -9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    StartVectorOp,
    StartVectorB,
    ExpandOp { j: usize },
    ExpandB { j: usize },
    RestartVectorOp { j: usize, attempt: usize },
    RestartVectorB { j: usize, attempt: usize },
    Finished { info: i32 },
}

/// The default [`IterationEngine`].
///
/// Keeps `B * V` next to the basis so that generalized problems need a single `B`
/// application per step.
pub struct ThickRestartLanczos {
    phase: Phase,
    seed: u64,
    rng: StdRng,
    bbasis: Mat<f64>,
    bresid: Mat<f64>,
    rnorm: f64,
    stats: IterationStats,
}

struct Orthogonalized {
    coefficients: Mat<f64>,
    rnorm: f64,
    breakdown: bool,
}

struct RitzPairs {
    values: Vec<f64>,
    vectors: Mat<f64>,
}

impl ThickRestartLanczos {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            phase: Phase::Start,
            seed,
            rng: StdRng::seed_from_u64(seed),
            bbasis: Mat::new(),
            bresid: Mat::new(),
            rnorm: 0.0,
            stats: IterationStats::default(),
        }
    }

    fn request(&mut self, rci: &mut ReverseComm, ido: Request, pointers: Pointers, next: Phase) {
        rci.ido = ido;
        rci.pointers = pointers;
        self.phase = next;
    }

    fn request_b(&mut self, rci: &mut ReverseComm, next: Phase) {
        self.request(rci, Request::ApplyB, Pointers::default(), next);
    }

    fn finish(&mut self, rci: &mut ReverseComm, info: i32) {
        log::debug!(
            "Lanczos finished with info = {info} after {} restarts ({} converged).",
            self.stats.iterations,
            self.stats.converged
        );
        rci.ido = Request::Done;
        rci.info = info;
        self.phase = Phase::Finished { info };
    }

    fn start(&mut self, rci: &mut ReverseComm, params: &IterationParams, ws: &mut Workspace) {
        if let Err(code) = check_params(params, ws) {
            return self.finish(rci, code);
        }
        self.rng = StdRng::seed_from_u64(self.seed);
        self.bbasis = Mat::zeros(params.n, params.ncv);
        self.bresid = Mat::zeros(params.n, 1);
        self.rnorm = 0.0;
        self.stats = IterationStats::default();
        rci.info = 0;

        self.randomize(ws);
        if params.matrix.is_generalized() {
            // Push the random vector into the range of OP before B-normalizing it.
            self.request(rci, Request::ApplyOpInit, Pointers::default(), Phase::StartVectorOp);
        } else {
            copy_workd(ws, COL_X, COL_Y);
            self.accept_start_vector(rci, params, ws);
        }
    }

    /// Takes `x` in the X column and `B * x` in the Y column as the first basis vector.
    fn accept_start_vector(
        &mut self,
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        let squared = dot(ws.workd[COL_X].as_ref(), ws.workd[COL_Y].as_ref());
        if !(squared > 0.0) || !squared.is_finite() {
            return self.finish(rci, CODE_ZERO_START);
        }
        let norm = squared.sqrt();
        for i in 0..params.n {
            ws.basis[(i, 0)] = ws.workd[COL_X][(i, 0)] / norm;
            self.bbasis[(i, 0)] = ws.workd[COL_Y][(i, 0)] / norm;
        }
        self.issue_expand(0, rci, params, ws);
    }

    /// Requests `OP * v_j`.
    fn issue_expand(
        &mut self,
        j: usize,
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        for i in 0..params.n {
            ws.workd[COL_X][(i, 0)] = ws.basis[(i, j)];
        }
        let bx = if params.matrix.is_generalized() {
            for i in 0..params.n {
                ws.workd[COL_BX][(i, 0)] = self.bbasis[(i, j)];
            }
            Some(COL_BX)
        } else {
            None
        };
        let pointers = Pointers {
            x: COL_X,
            y: COL_Y,
            bx,
        };
        self.request(rci, Request::ApplyOp, pointers, Phase::ExpandOp { j });
    }

    /// Completes step `j` with `w = OP * v_j` in the X column and `B * w` in the Y column.
    fn lanczos_step(
        &mut self,
        j: usize,
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        let m = params.ncv;
        let step = self.orthogonalize(j + 1, ws);
        ws.workl[(j, j)] = step.coefficients[(j, 0)];

        if step.breakdown {
            log::debug!("Invariant subspace found at step {j}.");
            if j + 1 < m {
                ws.workl[(j, j + 1)] = 0.0;
                ws.workl[(j + 1, j)] = 0.0;
                return self.draw_restart_vector(j, 0, rci, params, ws);
            }
            self.rnorm = 0.0;
            for i in 0..params.n {
                ws.resid[(i, 0)] = 0.0;
                self.bresid[(i, 0)] = 0.0;
            }
        } else if j + 1 < m {
            let beta = step.rnorm;
            for i in 0..params.n {
                ws.basis[(i, j + 1)] = ws.workd[COL_X][(i, 0)] / beta;
                self.bbasis[(i, j + 1)] = ws.workd[COL_Y][(i, 0)] / beta;
            }
            ws.workl[(j, j + 1)] = beta;
            ws.workl[(j + 1, j)] = beta;
            return self.issue_expand(j + 1, rci, params, ws);
        } else {
            self.rnorm = step.rnorm;
            for i in 0..params.n {
                ws.resid[(i, 0)] = ws.workd[COL_X][(i, 0)];
                self.bresid[(i, 0)] = ws.workd[COL_Y][(i, 0)];
            }
        }
        self.check_convergence(rci, params, ws);
    }

    /// Starts a random replacement for basis vector `j + 1` after a breakdown.
    fn draw_restart_vector(
        &mut self,
        j: usize,
        attempt: usize,
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        if attempt >= MAX_RESTART_VECTOR_ATTEMPTS {
            log::warn!("Could not extend the Lanczos basis beyond {} vectors.", j + 1);
            return self.finish(rci, CODE_BREAKDOWN);
        }
        self.randomize(ws);
        if params.matrix.is_generalized() {
            let next = Phase::RestartVectorOp { j, attempt };
            self.request(rci, Request::ApplyOpInit, Pointers::default(), next);
        } else {
            copy_workd(ws, COL_X, COL_Y);
            self.accept_restart_vector(j, attempt, rci, params, ws);
        }
    }

    fn accept_restart_vector(
        &mut self,
        j: usize,
        attempt: usize,
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        let step = self.orthogonalize(j + 1, ws);
        if step.breakdown {
            return self.draw_restart_vector(j, attempt + 1, rci, params, ws);
        }
        for i in 0..params.n {
            ws.basis[(i, j + 1)] = ws.workd[COL_X][(i, 0)] / step.rnorm;
            self.bbasis[(i, j + 1)] = ws.workd[COL_Y][(i, 0)] / step.rnorm;
        }
        self.issue_expand(j + 1, rci, params, ws);
    }

    /// B-orthogonalizes the X column (with `B * x` in the Y column) against the first
    /// `cols` basis vectors.
    fn orthogonalize(&mut self, cols: usize, ws: &mut Workspace) -> Orthogonalized {
        let [w, bw, _] = &mut ws.workd;
        let v = ws.basis.as_ref().get(.., 0..cols);
        let bv = self.bbasis.as_ref().get(.., 0..cols);

        let mut coefficients = Mat::<f64>::zeros(cols, 1);
        let mut correction = Mat::<f64>::zeros(cols, 1);
        let initial = dot(w.as_ref(), bw.as_ref()).max(0.0).sqrt();
        let mut rnorm = initial;
        let mut accepted = false;

        for pass in 0..=MAX_REFINEMENTS {
            if pass > 0 {
                self.stats.reorthogonalizations += 1;
            }
            // c = V^T (B w);  w -= V c;  B w -= (B V) c
            matmul(correction.as_mut(), Accum::Replace, v.transpose(), bw.as_ref(), 1.0, Par::Seq);
            matmul(w.as_mut(), Accum::Add, v, correction.as_ref(), -1.0, Par::Seq);
            matmul(bw.as_mut(), Accum::Add, bv, correction.as_ref(), -1.0, Par::Seq);
            for i in 0..cols {
                coefficients[(i, 0)] += correction[(i, 0)];
            }

            let previous = rnorm;
            rnorm = dot(w.as_ref(), bw.as_ref()).max(0.0).sqrt();
            if rnorm > DGKS_RATIO * previous {
                accepted = true;
                break;
            }
        }

        Orthogonalized {
            coefficients,
            rnorm,
            breakdown: !accepted || rnorm <= breakdown_tolerance() * initial,
        }
    }

    fn check_convergence(
        &mut self,
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        let m = params.ncv;
        self.stats.iterations += 1;

        let ritz = match ritz_pairs(ws.workl.as_ref(), m) {
            Ok(ritz) => ritz,
            Err(code) => return self.finish(rci, code),
        };
        let ranked = rank(&ritz.values, params.region);
        let floor = f64::EPSILON.powf(2.0 / 3.0);

        let mut converged = 0;
        for (position, &i) in ranked.iter().enumerate() {
            let theta = ritz.values[i];
            let bound = self.rnorm * ritz.vectors[(m - 1, i)].abs();
            ws.workl[(i, m)] = theta;
            ws.workl[(i, m + 1)] = bound;
            if position < params.nev && bound <= params.tolerance * theta.abs().max(floor) {
                converged += 1;
            }
        }
        self.stats.converged = converged;
        log::trace!(
            "Restart cycle {}: {converged}/{} Ritz values converged, residual norm {:e}.",
            self.stats.iterations,
            params.nev,
            self.rnorm
        );

        if converged >= params.nev {
            self.finish(rci, 0);
        } else if self.stats.iterations >= params.max_iterations {
            self.finish(rci, 1);
        } else {
            self.restart(&ritz, &ranked, rci, params, ws);
        }
    }

    /// Compresses the basis onto the most wanted Ritz vectors and continues from the residual.
    fn restart(
        &mut self,
        ritz: &RitzPairs,
        ranked: &[usize],
        rci: &mut ReverseComm,
        params: &IterationParams,
        ws: &mut Workspace,
    ) {
        let (n, m) = (params.n, params.ncv);
        let k = (params.nev + (m - params.nev) / 2).min(m - 1);
        let keep = &ranked[..k];

        let y = Mat::from_fn(m, k, |row, col| ritz.vectors[(row, keep[col])]);
        let mut scratch = Mat::<f64>::zeros(n, k);
        matmul(scratch.as_mut(), Accum::Replace, ws.basis.as_ref(), y.as_ref(), 1.0, Par::Seq);
        ws.basis.as_mut().get_mut(.., 0..k).copy_from(scratch.as_ref());
        matmul(scratch.as_mut(), Accum::Replace, self.bbasis.as_ref(), y.as_ref(), 1.0, Par::Seq);
        self.bbasis.as_mut().get_mut(.., 0..k).copy_from(scratch.as_ref());

        for col in 0..m {
            for row in 0..m {
                ws.workl[(row, col)] = 0.0;
            }
        }
        for (c, &i) in keep.iter().enumerate() {
            let coupling = self.rnorm * ritz.vectors[(m - 1, i)];
            ws.workl[(c, c)] = ritz.values[i];
            ws.workl[(c, k)] = coupling;
            ws.workl[(k, c)] = coupling;
        }

        if self.rnorm > 0.0 {
            for i in 0..n {
                ws.basis[(i, k)] = ws.resid[(i, 0)] / self.rnorm;
                self.bbasis[(i, k)] = self.bresid[(i, 0)] / self.rnorm;
            }
            self.issue_expand(k, rci, params, ws);
        } else {
            self.draw_restart_vector(k - 1, 0, rci, params, ws);
        }
    }

    fn randomize(&mut self, ws: &mut Workspace) {
        let x = &mut ws.workd[COL_X];
        for i in 0..x.nrows() {
            x[(i, 0)] = self.rng.random_range(-1.0..1.0);
        }
    }
}

impl Default for ThickRestartLanczos {
    fn default() -> Self {
        Self::new()
    }
}

impl IterationEngine for ThickRestartLanczos {
    fn iterate(&mut self, rci: &mut ReverseComm, params: &IterationParams, ws: &mut Workspace) {
        match self.phase {
            Phase::Start => self.start(rci, params, ws),
            Phase::StartVectorOp => {
                self.stats.op_applications += 1;
                copy_workd(ws, COL_Y, COL_X);
                self.request_b(rci, Phase::StartVectorB);
            }
            Phase::StartVectorB => {
                self.stats.b_applications += 1;
                self.accept_start_vector(rci, params, ws);
            }
            Phase::ExpandOp { j } => {
                self.stats.op_applications += 1;
                copy_workd(ws, COL_Y, COL_X);
                if params.matrix.is_generalized() {
                    self.request_b(rci, Phase::ExpandB { j });
                } else {
                    self.lanczos_step(j, rci, params, ws);
                }
            }
            Phase::ExpandB { j } => {
                self.stats.b_applications += 1;
                self.lanczos_step(j, rci, params, ws);
            }
            Phase::RestartVectorOp { j, attempt } => {
                self.stats.op_applications += 1;
                copy_workd(ws, COL_Y, COL_X);
                self.request_b(rci, Phase::RestartVectorB { j, attempt });
            }
            Phase::RestartVectorB { j, attempt } => {
                self.stats.b_applications += 1;
                self.accept_restart_vector(j, attempt, rci, params, ws);
            }
            Phase::Finished { info } => self.finish(rci, info),
        }
    }

    fn extract(
        &mut self,
        want_vectors: bool,
        params: &IterationParams,
        ws: &mut Workspace,
    ) -> Result<(), i32> {
        match self.phase {
            Phase::Finished { info } if info >= 0 => {}
            _ => return Err(CODE_NOTHING_TO_EXTRACT),
        }
        let (n, m, nev) = (params.n, params.ncv, params.nev);
        let ritz = ritz_pairs(ws.workl.as_ref(), m)?;
        let ranked = rank(&ritz.values, params.region);

        let mut wanted: Vec<(f64, usize)> = ranked[..nev]
            .iter()
            .map(|&i| (params.transform.recover(ritz.values[i], params.sigma), i))
            .collect();
        wanted.sort_by(|a, b| a.0.total_cmp(&b.0));

        ws.select.iter_mut().for_each(|selected| *selected = false);
        for (position, &(lambda, i)) in wanted.iter().enumerate() {
            ws.ritz[position] = lambda;
            ws.select[i] = true;
        }

        if want_vectors {
            let y = Mat::from_fn(m, nev, |row, col| ritz.vectors[(row, wanted[col].1)]);
            let mut x = Mat::<f64>::zeros(n, nev);
            matmul(x.as_mut(), Accum::Replace, ws.basis.as_ref(), y.as_ref(), 1.0, Par::Seq);
            ws.basis.as_mut().get_mut(.., 0..nev).copy_from(x.as_ref());
        }
        Ok(())
    }

    fn stats(&self) -> IterationStats {
        self.stats
    }
}

fn check_params(params: &IterationParams, ws: &Workspace) -> Result<(), i32> {
    if params.n == 0 {
        return Err(-1);
    }
    if params.nev == 0 {
        return Err(-2);
    }
    if params.ncv <= params.nev || params.ncv > params.n {
        return Err(-3);
    }
    if params.max_iterations == 0 {
        return Err(-4);
    }
    if ws.n() != params.n
        || ws.ncv() != params.ncv
        || ws.workl.nrows() < params.ncv
        || ws.workl.ncols() < params.ncv + 2
        || ws.ritz.len() < params.ncv
    {
        return Err(-7);
    }
    if params.transform == SpectralTransform::Regular && params.matrix.is_generalized() {
        return Err(-11);
    }
    if params.region == SpectralRegion::BothEnds && params.nev == 1 {
        return Err(-13);
    }
    Ok(())
}

/// Eigenpairs of the leading `m x m` block of `workl`.
fn ritz_pairs(workl: MatRef<'_, f64>, m: usize) -> Result<RitzPairs, i32> {
    let t = workl.get(0..m, 0..m);
    let evd = t
        .self_adjoint_eigen(Side::Lower)
        .map_err(|_| CODE_EIGEN_FAILURE)?;
    let s = evd.S();
    let values: Vec<f64> = (0..m).map(|i| s[i]).collect();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CODE_EIGEN_FAILURE);
    }
    Ok(RitzPairs {
        values,
        vectors: evd.U().to_owned(),
    })
}

/// Orders Ritz value indices from most to least wanted.
fn rank(values: &[f64], region: SpectralRegion) -> Vec<usize> {
    let mut ascending: Vec<usize> = (0..values.len()).collect();
    ascending.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    match region {
        SpectralRegion::LargestAlgebraic => ascending.into_iter().rev().collect(),
        SpectralRegion::SmallestAlgebraic => ascending,
        SpectralRegion::LargestMagnitude => {
            ascending.sort_by(|&a, &b| values[b].abs().total_cmp(&values[a].abs()));
            ascending
        }
        SpectralRegion::SmallestMagnitude => {
            ascending.sort_by(|&a, &b| values[a].abs().total_cmp(&values[b].abs()));
            ascending
        }
        SpectralRegion::BothEnds => {
            // Alternate between the two ends, starting from the top.
            let mut order = Vec::with_capacity(ascending.len());
            let (mut low, mut high) = (0, ascending.len());
            while low < high {
                high -= 1;
                order.push(ascending[high]);
                if low < high {
                    order.push(ascending[low]);
                    low += 1;
                }
            }
            order
        }
    }
}

fn copy_workd(ws: &mut Workspace, from: usize, to: usize) {
    for i in 0..ws.n() {
        let value = ws.workd[from][(i, 0)];
        ws.workd[to][(i, 0)] = value;
    }
}

fn dot(a: MatRef<'_, f64>, b: MatRef<'_, f64>) -> f64 {
    (0..a.nrows()).map(|i| a[(i, 0)] * b[(i, 0)]).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::IterationParams,
        mode::{MatrixKind, ProblemMode},
    };

    fn params(n: usize, nev: usize, ncv: usize, region: SpectralRegion) -> IterationParams {
        IterationParams {
            n,
            matrix: MatrixKind::Standard,
            region,
            transform: SpectralTransform::Regular,
            nev,
            ncv,
            tolerance: 1e-12,
            max_iterations: 500,
            sigma: 0.0,
        }
    }

    /// Runs the engine against `diag(d)`, servicing requests in place.
    fn run_diagonal(
        d: &[f64],
        params: &IterationParams,
    ) -> (ReverseComm, Workspace, ThickRestartLanczos) {
        let mut engine = ThickRestartLanczos::new();
        let mut ws = Workspace::new(params.n, params.ncv);
        let mut rci = ReverseComm::new();
        loop {
            engine.iterate(&mut rci, params, &mut ws);
            if rci.ido == Request::Done {
                break;
            }
            assert_eq!(rci.ido, Request::ApplyOp);
            let io = ws.rci_vectors(&rci.pointers).unwrap();
            let (x, mut y) = (io.x, io.y);
            for i in 0..params.n {
                y[(i, 0)] = d[i] * x[(i, 0)];
            }
        }
        (rci, ws, engine)
    }

    #[test]
    fn test_rank_orders() {
        let values = [-5.0, -1.0, 0.5, 2.0, 3.0];
        assert_eq!(rank(&values, SpectralRegion::LargestAlgebraic), vec![4, 3, 2, 1, 0]);
        assert_eq!(rank(&values, SpectralRegion::SmallestAlgebraic), vec![0, 1, 2, 3, 4]);
        assert_eq!(rank(&values, SpectralRegion::LargestMagnitude), vec![0, 4, 3, 1, 2]);
        assert_eq!(rank(&values, SpectralRegion::SmallestMagnitude), vec![2, 1, 3, 4, 0]);
        assert_eq!(rank(&values, SpectralRegion::BothEnds), vec![4, 0, 3, 1, 2]);
    }

    #[test]
    fn test_largest_of_diagonal() {
        let n = 40;
        let d: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        let p = params(n, 3, 12, SpectralRegion::LargestAlgebraic);
        let (rci, mut ws, mut engine) = run_diagonal(&d, &p);
        assert_eq!(rci.info, 0);
        assert!(engine.stats().op_applications >= p.ncv);

        engine.extract(true, &p, &mut ws).unwrap();
        for (i, expected) in [38.0, 39.0, 40.0].into_iter().enumerate() {
            assert!((ws.ritz()[i] - expected).abs() < 1e-9, "{:?}", &ws.ritz()[..3]);
        }
        assert_eq!(ws.select().iter().filter(|&&s| s).count(), 3);

        // The Ritz vector of 40 is +-e_40.
        assert!((ws.basis()[(n - 1, 2)].abs() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_parameter_errors() {
        let mut engine = ThickRestartLanczos::new();
        let mut ws = Workspace::new(10, 4);
        let mut rci = ReverseComm::new();

        let p = params(10, 4, 4, SpectralRegion::LargestAlgebraic);
        engine.iterate(&mut rci, &p, &mut ws);
        assert_eq!((rci.ido, rci.info), (Request::Done, -3));

        let mut engine = ThickRestartLanczos::new();
        let mut p = params(10, 1, 4, SpectralRegion::BothEnds);
        engine.iterate(&mut rci, &p, &mut ws);
        assert_eq!(rci.info, -13);

        let mut engine = ThickRestartLanczos::new();
        p.region = SpectralRegion::LargestAlgebraic;
        p.matrix = ProblemMode::GeneralizedRegularInverse.matrix_kind();
        engine.iterate(&mut rci, &p, &mut ws);
        assert_eq!(rci.info, -11);

        let mut engine = ThickRestartLanczos::new();
        let p = params(12, 3, 4, SpectralRegion::LargestAlgebraic);
        engine.iterate(&mut rci, &p, &mut ws);
        assert_eq!(rci.info, -7);
        assert_eq!(engine.extract(false, &p, &mut ws), Err(-14));
    }

    #[test]
    fn test_extract_before_finish() {
        let mut engine = ThickRestartLanczos::new();
        let mut ws = Workspace::new(10, 4);
        let p = params(10, 2, 4, SpectralRegion::LargestAlgebraic);
        assert_eq!(engine.extract(false, &p, &mut ws), Err(-14));
    }

    #[test]
    fn test_max_iterations_is_a_warning() {
        let n = 200;
        let d: Vec<f64> = (1..=n).map(|i| 1.0 + 1e-3 * i as f64).collect();
        let mut p = params(n, 5, 8, SpectralRegion::SmallestMagnitude);
        p.max_iterations = 1;
        let (rci, mut ws, mut engine) = run_diagonal(&d, &p);
        assert_eq!(rci.info, 1);
        assert_eq!(engine.stats().iterations, 1);
        assert!(engine.extract(false, &p, &mut ws).is_ok());
    }
}
