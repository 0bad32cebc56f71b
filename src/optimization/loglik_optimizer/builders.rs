//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Hide argmin's generic wiring behind small builders so the entry points
//! can request a configured solver without touching argmin types.
//!
//! Key behaviors
//! -------------
//! - L-BFGS with Hager–Zhang or More–Thuente line search, tolerances taken
//!   from [`MLEOptions`] through [`configure_lbfgs`].
//! - Nelder–Mead with an initial simplex that stays inside the box, used as
//!   the gradient-free fallback of the mode search.
//!
//! Conventions
//! -----------
//! - Builders never set `theta0` or `max_iters` on the executor; the
//!   runners in [`super::run`] do.
//! - argmin errors surface as [`OptError`](crate::optimization::errors::OptError)
//!   through the crate's `From<argmin::core::Error>`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::{BoxConstraints, MLEOptions},
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, NelderMeadSolver, Theta,
        },
    },
};

/// Relative edge length of the initial Nelder–Mead simplex.
const SIMPLEX_STEP: f64 = 0.1;

/// Simplex standard-deviation tolerance used when no cost tolerance is set.
const DEFAULT_SD_TOL: f64 = 1e-8;

/// Construct L-BFGS with Hager–Zhang line search.
///
/// # Errors
/// `OptError` when argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// # Errors
/// `OptError` when argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply the optional gradient and cost tolerances of `opts` to an L-BFGS
/// solver, whatever its line search. `None` keeps argmin's default.
///
/// # Errors
/// `OptError` when `with_tolerance_grad` or `with_tolerance_cost` fails.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// build_nelder_mead — simplex solver seeded at `theta0`.
///
/// Purpose
/// -------
/// Build the gradient-free fallback used when the quasi-Newton run fails.
///
/// Parameters
/// ----------
/// - `theta0`: first vertex of the simplex.
/// - `bounds`: when present, each extra vertex moves coordinate `i` by
///   `SIMPLEX_STEP · (upper_i − lower_i)` toward the interior, so every
///   vertex starts inside the box. Without bounds the step is
///   `SIMPLEX_STEP · max(|θ_i|, 1)`.
/// - `opts`: `tols.tol_cost` doubles as the simplex sd tolerance.
///
/// Returns
/// -------
/// A [`NelderMeadSolver`] with `theta0.len() + 1` vertices.
///
/// Errors
/// ------
/// `OptError` when argmin rejects the sd tolerance.
pub fn build_nelder_mead(
    theta0: &Theta, bounds: Option<&BoxConstraints>, opts: &MLEOptions,
) -> OptResult<NelderMeadSolver> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut v = theta0.clone();
        v[i] += match bounds {
            Some(b) => {
                let step = SIMPLEX_STEP * (b.upper[i] - b.lower[i]);
                if theta0[i] + step <= b.upper[i] { step } else { -step }
            }
            None => SIMPLEX_STEP * theta0[i].abs().max(1.0),
        };
        vertices.push(v);
    }
    let sd_tol = opts.tols.tol_cost.unwrap_or(DEFAULT_SD_TOL);
    Ok(NelderMeadSolver::new(vertices).with_sd_tolerance(sd_tol)?)
}
