//! Public surface of the hyperparameter optimizer.
//!
//! - [`LogLikelihood`]: objective trait; the BVAR marginal likelihood
//!   implements it.
//! - [`BoxConstraints`]: coordinate-wise bounds with projection and an
//!   out-of-box penalty weight.
//! - [`MLEOptions`] and [`Tolerances`]: solver configuration.
//! - [`LineSearcher`]: line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result of a run.
//!
//! Convention: the objective `ℓ(θ)` is *maximized* by minimizing
//! `c(θ) = -ℓ(θ)`. Analytic gradients, when provided, are gradients of `ℓ`.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{
            validate_box, validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad,
        },
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Objective maximized by the optimizer.
///
/// - `type Data`: read-only context passed to every call.
/// - `value` evaluates `ℓ(θ)`. Implementations that cannot evaluate a point
///   should return a large negative finite value rather than an error so the
///   line search can back off.
/// - `check` is called once on the starting point before any solver runs.
/// - `grad` is optional; the default reports
///   [`OptError::GradientNotImplemented`] and the adapter falls back to
///   finite differences.
pub trait LogLikelihood {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Coordinate-wise box `[lower_i, upper_i]` for the optimizer.
///
/// Quasi-Newton steps are unconstrained, so the adapter evaluates the
/// objective at [`BoxConstraints::project`]`(θ)` and subtracts
/// `penalty · dist²(θ, box)`. Inside the box the objective is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxConstraints {
    pub lower: Theta,
    pub upper: Theta,
    pub penalty: f64,
}

impl BoxConstraints {
    /// Build a validated box.
    ///
    /// # Errors
    /// - [`OptError::BoxDimMismatch`] / [`OptError::InvalidBox`] from
    ///   [`validate_box`].
    /// - [`OptError::InvalidPenalty`] if `penalty` is not finite and positive.
    pub fn new(lower: Theta, upper: Theta, penalty: f64) -> OptResult<Self> {
        validate_box(&lower, &upper)?;
        if !penalty.is_finite() || penalty <= 0.0 {
            return Err(OptError::InvalidPenalty { value: penalty });
        }
        Ok(Self { lower, upper, penalty })
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Clamp every coordinate of `theta` into its interval.
    pub fn project(&self, theta: &Theta) -> Theta {
        let mut out = theta.clone();
        out.iter_mut()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .for_each(|(v, (&lo, &hi))| *v = v.clamp(lo, hi));
        out
    }

    /// Squared Euclidean distance from `theta` to the box.
    pub fn distance_sq(&self, theta: &Theta) -> f64 {
        theta
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .map(|(&v, (&lo, &hi))| {
                let d = if v < lo {
                    lo - v
                } else if v > hi {
                    v - hi
                } else {
                    0.0
                };
                d * d
            })
            .sum()
    }

    /// Inclusive membership test.
    pub fn contains(&self, theta: &Theta) -> bool {
        theta.len() == self.dim()
            && theta
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

/// Line search used inside L-BFGS.
///
/// Parsed case-insensitively from `"MoreThuente"` or `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 500`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None` (uses [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM))
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// # Errors
    /// [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits.
///
/// Any field can be `None` but at least one must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Result of a `maximize` call.
///
/// - `value` is the objective `ℓ(θ̂)`, not the cost.
/// - `converged` is `true` for any termination status other than
///   `NotTerminated`.
/// - `fn_evals` carries argmin's counters (`cost_count`, `gradient_count`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// Propagates [`validate_theta_hat`] and [`validate_value`] failures.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
