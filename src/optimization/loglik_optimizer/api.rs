//! High-level entry points for maximizing a [`LogLikelihood`].
//!
//! [`maximize`] runs L-BFGS with the configured line search;
//! [`maximize_nelder_mead`] runs the gradient-free simplex on the same
//! penalized objective. Both accept an optional [`BoxConstraints`].
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_nelder_mead, build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{run_lbfgs, run_nelder_mead},
        traits::{BoxConstraints, LineSearcher, LogLikelihood, MLEOptions},
        validation::validate_theta_input,
    },
};

/// Maximize `ℓ(θ)` with L-BFGS.
///
/// # Behavior
/// - Checks `theta0` is finite, matches the box dimension, and passes
///   `f.check`.
/// - Wraps `(f, data, bounds)` in an [`ArgMinAdapter`].
/// - Builds L-BFGS with the line search in `opts.line_searcher` and runs it.
///
/// With a box, `theta_hat` in the outcome is the solver's raw iterate; the
/// caller projects it.
///
/// # Errors
/// - [`OptError::InvalidThetaInput`] / [`OptError::BoxDimMismatch`].
/// - Errors from `f.check`, the builders, or the run.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_bvar::optimization::errors::OptResult;
/// use rust_bvar::optimization::loglik_optimizer::{
///     maximize, LogLikelihood, MLEOptions, Theta,
/// };
///
/// struct Bowl;
/// impl LogLikelihood for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.1, -0.2], &(), None, &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), rust_bvar::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, bounds: Option<&BoxConstraints>, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    check_start(f, &theta0, data, bounds)?;
    let problem = match bounds {
        Some(b) => ArgMinAdapter::with_bounds(f, data, b),
        None => ArgMinAdapter::new(f, data),
    };
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

/// Maximize `ℓ(θ)` with Nelder–Mead from a simplex built around `theta0`.
///
/// # Errors
/// Same as [`maximize`].
pub fn maximize_nelder_mead<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, bounds: Option<&BoxConstraints>, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    check_start(f, &theta0, data, bounds)?;
    let solver = build_nelder_mead(&theta0, bounds, opts)?;
    let problem = match bounds {
        Some(b) => ArgMinAdapter::with_bounds(f, data, b),
        None => ArgMinAdapter::new(f, data),
    };
    run_nelder_mead(opts, problem, solver)
}

fn check_start<F: LogLikelihood>(
    f: &F, theta0: &Theta, data: &F::Data, bounds: Option<&BoxConstraints>,
) -> OptResult<()> {
    validate_theta_input(theta0)?;
    if let Some(b) = bounds {
        if b.dim() != theta0.len() {
            return Err(OptError::BoxDimMismatch { expected: theta0.len(), found: b.dim() });
        }
    }
    f.check(theta0, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::{Cost, Grad, Tolerances};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// ℓ(θ) = -Σ (θ_i - c_i)², maximized at `c`.
    struct ShiftedBowl {
        center: Theta,
    }

    impl LogLikelihood for ShiftedBowl {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            let d = theta - &self.center;
            Ok(-d.dot(&d))
        }

        fn check(&self, theta: &Theta, _: &()) -> OptResult<()> {
            if theta.len() != self.center.len() {
                return Err(OptError::GradientDimMismatch {
                    expected: self.center.len(),
                    found: theta.len(),
                });
            }
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok((theta - &self.center).mapv(|v| -2.0 * v))
        }
    }

    #[test]
    // Purpose
    // -------
    // Unconstrained L-BFGS finds the interior maximum with both line
    // searches.
    //
    // Given
    // -----
    // - Bowl centred at (1, -2), start at the origin.
    //
    // Expect
    // ------
    // - θ̂ ≈ (1, -2), value ≈ 0.
    fn maximize_finds_interior_optimum_with_both_line_searches() {
        // Arrange
        let f = ShiftedBowl { center: array![1.0, -2.0] };
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = MLEOptions { line_searcher: ls, ..MLEOptions::default() };

            // Act
            let out = maximize(&f, array![0.0, 0.0], &(), None, &opts).unwrap();

            // Assert
            assert_abs_diff_eq!(out.theta_hat[0], 1.0, epsilon = 1e-4);
            assert_abs_diff_eq!(out.theta_hat[1], -2.0, epsilon = 1e-4);
            assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // A box that contains the optimum does not disturb L-BFGS.
    //
    // Given
    // -----
    // - Bowl centred at 0.4, box `[0, 1]`, start 0.9.
    //
    // Expect
    // ------
    // - θ̂ ≈ 0.4 and inside the box.
    fn maximize_with_box_keeps_interior_optimum() {
        // Arrange
        let f = ShiftedBowl { center: array![0.4] };
        let bounds = BoxConstraints::new(array![0.0], array![1.0], 1e4).unwrap();

        // Act
        let out = maximize(&f, array![0.9], &(), Some(&bounds), &MLEOptions::default()).unwrap();

        // Assert
        assert_abs_diff_eq!(out.theta_hat[0], 0.4, epsilon = 1e-4);
        assert!(bounds.contains(&out.theta_hat));
    }

    #[test]
    // Purpose
    // -------
    // With the optimum outside the box, the simplex run ends on the nearest
    // face once projected.
    //
    // Given
    // -----
    // - Bowl centred at 3, box `[0, 1]`, start 0.5.
    //
    // Expect
    // ------
    // - Projection of θ̂ ≈ 1.
    fn maximize_nelder_mead_with_box_stops_on_nearest_face() {
        // Arrange
        let f = ShiftedBowl { center: array![3.0] };
        let bounds = BoxConstraints::new(array![0.0], array![1.0], 1e4).unwrap();
        let tols = Tolerances::new(None, Some(1e-12), Some(2_000)).unwrap();
        let opts = MLEOptions { tols, ..MLEOptions::default() };

        // Act
        let out = maximize_nelder_mead(&f, array![0.5], &(), Some(&bounds), &opts).unwrap();
        let projected = bounds.project(&out.theta_hat);

        // Assert
        assert_abs_diff_eq!(projected[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // The simplex fallback reaches the same interior optimum.
    fn maximize_nelder_mead_finds_interior_optimum() {
        // Arrange
        let f = ShiftedBowl { center: array![0.3, 0.7] };
        let bounds = BoxConstraints::new(array![0.0, 0.0], array![1.0, 1.0], 1e3).unwrap();
        let tols = Tolerances::new(None, Some(1e-10), Some(2_000)).unwrap();
        let opts = MLEOptions { tols, ..MLEOptions::default() };

        // Act
        let out = maximize_nelder_mead(&f, array![0.5, 0.5], &(), Some(&bounds), &opts).unwrap();

        // Assert
        assert_abs_diff_eq!(out.theta_hat[0], 0.3, epsilon = 1e-3);
        assert_abs_diff_eq!(out.theta_hat[1], 0.7, epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // Start-point checks run before any solver is built.
    fn maximize_rejects_bad_start_points() {
        let f = ShiftedBowl { center: array![0.0] };
        let bounds = BoxConstraints::new(array![0.0, 0.0], array![1.0, 1.0], 1.0).unwrap();

        assert!(matches!(
            maximize(&f, array![f64::NAN], &(), None, &MLEOptions::default()),
            Err(OptError::InvalidThetaInput { .. })
        ));
        assert!(matches!(
            maximize(&f, array![0.5], &(), Some(&bounds), &MLEOptions::default()),
            Err(OptError::BoxDimMismatch { .. })
        ));
    }
}
