//! Executors that run an `argmin` solver on an [`ArgMinAdapter`] and return
//! a crate-level [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
        types::NelderMeadSolver,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, IterState, Solver, State};
use argmin_math::ArgminL2Norm;

/// Run an L-BFGS solver (either line search) on `problem` from `theta0`.
///
/// When `opts.verbose` is set the starting objective and gradient norm are
/// logged at `debug` level; with the `obs_slog` feature a terminal slog
/// observer is also attached to the executor.
///
/// # Errors
/// - argmin runtime errors (line-search failure, observer failure) mapped
///   through `From<argmin::core::Error>`.
/// - Validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver).configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut state = optimizer.run()?.state().clone();
    let grad = state.take_gradient();
    into_outcome(state, grad)
}

/// Run a Nelder–Mead solver on `problem`; the simplex already carries the
/// starting point, so only `max_iters` is configured here.
///
/// # Errors
/// Same as [`run_lbfgs`]. No gradient norm is reported.
pub fn run_nelder_mead<'a, F>(
    opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: NelderMeadSolver,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
{
    let mut optimizer = Executor::new(problem, solver);
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }
    let state = optimizer.run()?.state().clone();
    into_outcome(state, None)
}

// ---- Helper Methods ----

fn into_outcome<G>(
    mut state: IterState<Theta, G, (), (), (), f64>, grad: Option<Grad>,
) -> OptResult<OptimOutcome> {
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let value = -state.get_best_cost();
    OptimOutcome::new(state.take_best_param(), value, termination, iterations, fn_evals, grad)
}

fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    tracing::debug!(ell_theta0 = ll0, grad_norm = ?g0n, "optimizer start");
    Ok(())
}
