//! mode — posterior-mode search and the MH proposal built around it.
//!
//! Purpose
//! -------
//! Maximize the log marginal likelihood over the hyperparameter box, then
//! turn the optimum into the Gaussian proposal the independence sampler
//! draws from.
//!
//! Key behaviors
//! -------------
//! - [`MarginalLikelihood`] implements [`LogLikelihood`]; rejected points
//!   map to [`REJECTED_LOG_ML`] so the line search can back off.
//! - [`find_posterior_mode`] runs L-BFGS from the prior modes with the box
//!   handled by projection plus a quadratic penalty, falls back to
//!   Nelder–Mead on failure, and reports the projected optimum.
//! - [`ProposalDistribution`] has covariance `HH = J H Jᵀ` with
//!   `H = I·scale_hess` and `J_i = σ(p_i)σ(−p_i)·(max_i − min_i)`; a
//!   non-PSD `HH` is repaired by taking absolute eigenvalues.
//!
//! Invariants & assumptions
//! ------------------------
//! - The reported mode lies inside the box and evaluates as accepted.
//! - The proposal mean never changes; only its scale is adapted.
use crate::{
    bvar::{
        core::{
            linalg::{abs_eigen_reconstruct, eigen_sqrt_factor, is_psd, symmetrize},
            options::ModeOptions,
        },
        errors::{BvarError, BvarResult},
        ml::MarginalLikelihood,
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            BoxConstraints, Cost, LogLikelihood, OptimOutcome, Theta, maximize,
            maximize_nelder_mead,
        },
        numerical_stability::logistic_derivative,
    },
};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

/// Objective value reported to the optimizer at a rejected point.
pub const REJECTED_LOG_ML: f64 = -1e16;

impl LogLikelihood for MarginalLikelihood {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<Cost> {
        Ok(self.evaluate(theta).log_ml().unwrap_or(REJECTED_LOG_ML))
    }

    fn check(&self, theta: &Theta, _data: &()) -> OptResult<()> {
        let expected = self.priors().layout().len();
        if theta.len() != expected {
            return Err(OptError::BoxDimMismatch { expected, found: theta.len() });
        }
        Ok(())
    }
}

/// Solver that produced the reported mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeMethod {
    Lbfgs,
    NelderMead,
}

impl fmt::Display for ModeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeMethod::Lbfgs => write!(f, "L-BFGS"),
            ModeMethod::NelderMead => write!(f, "Nelder-Mead"),
        }
    }
}

/// Projected optimum of the log marginal likelihood.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorModeResult {
    pub mode: Theta,
    pub log_ml: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub method: ModeMethod,
}

/// Maximize the log marginal likelihood over the hyperparameter box.
///
/// Starts from the prior modes. An L-BFGS failure is logged at `warn` and,
/// when `opts.nelder_mead_fallback` is set, retried with Nelder–Mead.
///
/// # Errors
/// - `BvarError::Optimization` if the box is invalid or every solver fails.
/// - `BvarError::ModeRejected` if the projected optimum is rejected.
pub fn find_posterior_mode(
    ml: &MarginalLikelihood, opts: &ModeOptions,
) -> BvarResult<PosteriorModeResult> {
    let layout = ml.priors().layout();
    let bounds = BoxConstraints::new(layout.lower.clone(), layout.upper.clone(), opts.penalty)?;
    let start = layout.modes.clone();

    let (outcome, method) = match maximize(ml, start.clone(), &(), Some(&bounds), &opts.mle) {
        Ok(out) => (out, ModeMethod::Lbfgs),
        Err(err) if opts.nelder_mead_fallback => {
            tracing::warn!(error = %err, "L-BFGS mode search failed; retrying with Nelder-Mead");
            let out = maximize_nelder_mead(ml, start, &(), Some(&bounds), &opts.mle)?;
            (out, ModeMethod::NelderMead)
        }
        Err(err) => return Err(err.into()),
    };
    finish(ml, &bounds, outcome, method)
}

fn finish(
    ml: &MarginalLikelihood, bounds: &BoxConstraints, outcome: OptimOutcome, method: ModeMethod,
) -> BvarResult<PosteriorModeResult> {
    let mode = bounds.project(&outcome.theta_hat);
    let log_ml = ml.evaluate(&mode).log_ml().ok_or(BvarError::ModeRejected)?;
    tracing::info!(
        %method,
        log_ml,
        iterations = outcome.iterations,
        status = %outcome.status,
        "posterior mode found"
    );
    Ok(PosteriorModeResult {
        mode,
        log_ml,
        converged: outcome.converged,
        status: outcome.status,
        iterations: outcome.iterations,
        method,
    })
}

/// Gaussian proposal `N(mode, HH)` with a rescalable covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalDistribution {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    factor: DMatrix<f64>,
}

impl ProposalDistribution {
    /// Build `HH = J (I·scale_hess) Jᵀ` around `mode`.
    ///
    /// # Errors
    /// - `BvarError::HyperLengthMismatch` if the bounds disagree with `mode`.
    /// - `BvarError::InvalidMhOption` if `scale_hess` is not finite and > 0.
    pub fn new(mode: &Theta, lower: &Theta, upper: &Theta, scale_hess: f64) -> BvarResult<Self> {
        let n = mode.len();
        for len in [lower.len(), upper.len()] {
            if len != n {
                return Err(BvarError::HyperLengthMismatch { expected: n, found: len });
            }
        }
        if !scale_hess.is_finite() || scale_hess <= 0.0 {
            return Err(BvarError::InvalidMhOption {
                field: "scale_hess",
                value: scale_hess,
                reason: "Must be finite and > 0.",
            });
        }
        let jacobian = DVector::from_iterator(
            n,
            mode.iter().zip(lower.iter().zip(upper.iter())).map(|(&p, (&lo, &hi))| {
                logistic_derivative(p) * (hi - lo)
            }),
        );
        let j = DMatrix::from_diagonal(&jacobian);
        let h = DMatrix::<f64>::identity(n, n) * scale_hess;
        let mut covariance = &j * h * j.transpose();
        symmetrize(&mut covariance);
        if !is_psd(&covariance) {
            covariance = abs_eigen_reconstruct(&covariance);
        }
        let factor = eigen_sqrt_factor(&covariance);
        Ok(Self { mean: DVector::from_iterator(n, mode.iter().copied()), covariance, factor })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Multiply the covariance by `factor`.
    pub fn rescale(&mut self, factor: f64) {
        self.covariance *= factor;
        self.factor *= factor.sqrt();
    }

    /// One draw `mode + S z` with `S Sᵀ = HH`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Theta {
        let z = DVector::<f64>::from_fn(self.dim(), |_, _| rng.sample(StandardNormal));
        let v = &self.mean + &self.factor * z;
        Theta::from_iter(v.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvar::core::{data::Dataset, priors::PriorSpec};
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};
    use rand::{SeedableRng, rngs::StdRng};

    fn data() -> Dataset {
        let mut rng = StdRng::seed_from_u64(11);
        let mut levels = Array2::<f64>::zeros((60, 2));
        for t in 1..60 {
            let e0: f64 = rng.sample(StandardNormal);
            let e1: f64 = rng.sample(StandardNormal);
            levels[[t, 0]] = 0.6 * levels[[t - 1, 0]] + e0;
            levels[[t, 1]] = 0.3 * levels[[t - 1, 0]] + 0.5 * levels[[t - 1, 1]] + e1;
        }
        Dataset::from_levels(&levels, 1).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The mode search ends inside the box at a point no worse than the
    // prior modes it starts from.
    //
    // Given
    // -----
    // - Simulated VAR(1), default priors (lambda, psi1, psi2 sampled).
    //
    // Expect
    // ------
    // - Mode inside the box, log ML ≥ log ML at the start.
    fn mode_search_improves_on_prior_modes() {
        // Arrange
        let d = data();
        let priors = PriorSpec::builder().build(&d).unwrap();
        let ml = MarginalLikelihood::new(&d, &priors).unwrap();
        let start = ml.evaluate(&priors.layout().modes).log_ml().unwrap();

        // Act
        let res = find_posterior_mode(&ml, &ModeOptions::default()).unwrap();

        // Assert
        assert!(priors.layout().contains(&res.mode));
        assert!(res.log_ml >= start - 1e-8);
        assert_eq!(res.mode.len(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Rejected points reach the optimizer as the large negative constant.
    fn rejected_point_maps_to_sentinel_value() {
        let d = data();
        let priors = PriorSpec::builder().build(&d).unwrap();
        let ml = MarginalLikelihood::new(&d, &priors).unwrap();
        let mut theta = priors.layout().modes.clone();
        theta[0] = -1.0;

        let v = ml.value(&theta, &()).unwrap();

        assert_eq!(v, REJECTED_LOG_ML);
        assert!(ml.check(&array![0.2], &()).is_err());
    }

    #[test]
    // Purpose
    // -------
    // The proposal covariance is diagonal with `(J_i)² · scale_hess`, and
    // rescaling multiplies it exactly.
    //
    // Given
    // -----
    // - mode (0, 1), bounds [0, 2] × [0, 4], scale_hess 0.5.
    //
    // Expect
    // ------
    // - HH = diag((0.25·2)²·0.5, (σ(1)σ(−1)·4)²·0.5); after rescale(2), twice that.
    fn proposal_covariance_follows_jacobian() {
        // Arrange
        let s1 = logistic_derivative(1.0);

        // Act
        let mut p =
            ProposalDistribution::new(&array![0.0, 1.0], &array![0.0, 0.0], &array![2.0, 4.0], 0.5)
                .unwrap();
        let before = p.covariance().clone();
        p.rescale(2.0);

        // Assert
        assert_relative_eq!(before[(0, 0)], 0.125, max_relative = 1e-12);
        assert_relative_eq!(before[(1, 1)], (s1 * 4.0).powi(2) * 0.5, max_relative = 1e-12);
        assert_relative_eq!(before[(0, 1)], 0.0);
        assert_relative_eq!(p.covariance()[(1, 1)], 2.0 * before[(1, 1)], max_relative = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Draws are centred on the mode with the requested spread.
    fn proposal_draws_match_moments() {
        // Arrange
        let p = ProposalDistribution::new(&array![0.0], &array![-1.0], &array![1.0], 4.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let n = 20_000;

        // Act
        let xs: Vec<f64> = (0..n).map(|_| p.draw(&mut rng)[0]).collect();

        // Assert
        let mean = xs.iter().sum::<f64>() / n as f64;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05);
        assert_relative_eq!(var, p.covariance()[(0, 0)], max_relative = 0.05);
    }

    #[test]
    // Purpose
    // -------
    // Mismatched bounds and a bad scale fail at construction.
    fn proposal_rejects_bad_inputs() {
        let bad_len = ProposalDistribution::new(&array![0.0], &array![0.0, 0.0], &array![1.0], 1.0);
        let bad_scale = ProposalDistribution::new(&array![0.0], &array![0.0], &array![1.0], 0.0);

        assert!(matches!(bad_len, Err(BvarError::HyperLengthMismatch { .. })));
        assert!(matches!(bad_scale, Err(BvarError::InvalidMhOption { .. })));
    }
}
