//! ml — closed-form log marginal likelihood of the hierarchical Minnesota prior.
//!
//! Purpose
//! -------
//! Evaluate `log p(Y | θ) + log p(θ)` for a hyperparameter vector `θ` and
//! return the sufficient statistics the conjugate posterior drawer needs.
//!
//! Key behaviors
//! -------------
//! - Out-of-box vectors, failed Cholesky solves and non-finite results map to
//!   [`EvaluationOutcome::Rejected`]; no numeric sentinel leaves this module.
//! - Prior variances: `ω₀ = var` for the intercept and
//!   `ω[1+(l−1)M+j] = λ² / l^α / ψ_j` for lag `l`, variable `j`.
//! - Dummy rows (soc / sur) are stacked on top of `X` and `Y`; the same
//!   closed form evaluated on the dummy rows alone is subtracted.
//! - With `d = M + 2`, `A = diag(√ω) XX diag(√ω)` and
//!   `B = diag(1/√ψ)(sse + (β̂−b)ᵀ Ω⁻¹ (β̂−b)) diag(1/√ψ)`:
//!
//!   `log ML = −MN ln π/2 + Σ_{i<M}[lnΓ((N+d−i)/2) − lnΓ((d−i)/2)]
//!             − N Σ ln ψ/2 − M Σ ln eig(I+A)/2 − (N+d) Σ ln eig(I+B)/2`
//!
//!   with eigenvalues below `EIGEN_EPS` clamped to zero before the shift.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`MarginalLikelihood::evaluate`] is a pure function of `θ`: repeated
//!   calls return bit-identical results.
//! - Bounds are inclusive; a vector sitting on a bound is evaluated.
//!
//! Conventions
//! -----------
//! - Internals run on `nalgebra`; the cached data are copied once at
//!   construction.
//! - No logging here; the evaluator sits inside the sampler's hot loop.
use crate::{
    bvar::{
        core::{
            data::Dataset,
            dummy::dummy_observations,
            hyper::ResolvedHypers,
            linalg::{sum_log_eig_plus_one, symmetrize, to_dmatrix},
            priors::PriorSpec,
        },
        errors::{BvarError, BvarResult},
    },
    optimization::loglik_optimizer::Theta,
};
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

/// Sufficient statistics at one accepted hyperparameter vector.
///
/// `xx` and `n_obs` include the dummy rows when dummy priors are active.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub log_ml: f64,
    /// Augmented `XᵀX`, `K×K`.
    pub xx: DMatrix<f64>,
    /// Augmented sample size.
    pub n_obs: usize,
    /// Posterior mean of the coefficients, `K×M`.
    pub beta_hat: DMatrix<f64>,
    /// Residual cross product at `beta_hat`, `M×M`.
    pub sse: DMatrix<f64>,
    /// Diagonal of the prior precision `Ω⁻¹`.
    pub omega_inv: DVector<f64>,
    pub psi: Array1<f64>,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Accepted(EvaluationResult),
    Rejected,
}

impl EvaluationOutcome {
    pub fn log_ml(&self) -> Option<f64> {
        match self {
            EvaluationOutcome::Accepted(r) => Some(r.log_ml),
            EvaluationOutcome::Rejected => None,
        }
    }

    pub fn into_result(self) -> Option<EvaluationResult> {
        match self {
            EvaluationOutcome::Accepted(r) => Some(r),
            EvaluationOutcome::Rejected => None,
        }
    }
}

/// Marginal-likelihood evaluator with the data and prior cached.
#[derive(Debug, Clone)]
pub struct MarginalLikelihood {
    y: DMatrix<f64>,
    x: DMatrix<f64>,
    xx: DMatrix<f64>,
    xty: DMatrix<f64>,
    b: DMatrix<f64>,
    y0_mean: Array1<f64>,
    lags: usize,
    priors: PriorSpec,
}

/// Intermediate quantities of the conjugate closed form.
struct ConjugateFit {
    log_ml: f64,
    beta_hat: DMatrix<f64>,
    sse: DMatrix<f64>,
}

impl MarginalLikelihood {
    /// Cache `nalgebra` copies of the data and the prior.
    ///
    /// # Errors
    /// `BvarError::DimensionMismatch` if `priors` was built for data with a
    /// different number of variables or coefficients.
    pub fn new(data: &Dataset, priors: &PriorSpec) -> BvarResult<Self> {
        let (k, m) = priors.b().dim();
        if k != data.n_coef() {
            return Err(BvarError::DimensionMismatch {
                what: "prior mean rows",
                expected: data.n_coef(),
                found: k,
            });
        }
        if m != data.n_vars() {
            return Err(BvarError::DimensionMismatch {
                what: "prior mean columns",
                expected: data.n_vars(),
                found: m,
            });
        }
        let y = to_dmatrix(data.y());
        let x = to_dmatrix(data.x());
        let xx = to_dmatrix(data.xx());
        let xty = x.transpose() * &y;
        Ok(Self {
            y,
            x,
            xx,
            xty,
            b: to_dmatrix(priors.b()),
            y0_mean: data.y0_mean(),
            lags: data.lags(),
            priors: priors.clone(),
        })
    }

    pub fn priors(&self) -> &PriorSpec {
        &self.priors
    }

    pub fn prior_mean(&self) -> &DMatrix<f64> {
        &self.b
    }

    pub fn n_vars(&self) -> usize {
        self.y.ncols()
    }

    pub fn n_coef(&self) -> usize {
        self.x.ncols()
    }

    /// Evaluate the log marginal likelihood plus hyperprior at `theta`.
    pub fn evaluate(&self, theta: &Theta) -> EvaluationOutcome {
        let Some(h) = self.priors.resolve(theta) else {
            return EvaluationOutcome::Rejected;
        };
        let omega = self.prior_variances(&h);
        let omega_inv = omega.map(|w| 1.0 / w);

        let dummies = dummy_observations(&self.y0_mean, self.lags, h.soc, h.sur);
        let (fit, xx, n_obs) = match &dummies {
            None => {
                let (x, y) = (&self.x, &self.y);
                let Some(fit) =
                    self.conjugate_fit(x, y, &self.xx, &self.xty, &omega, &omega_inv, &h.psi)
                else {
                    return EvaluationOutcome::Rejected;
                };
                (fit, self.xx.clone(), self.y.nrows())
            }
            Some(d) => {
                let x = stack_rows(&d.x, &self.x);
                let y = stack_rows(&d.y, &self.y);
                let xx = x.transpose() * &x;
                let xty = x.transpose() * &y;
                let Some(fit) = self.conjugate_fit(&x, &y, &xx, &xty, &omega, &omega_inv, &h.psi)
                else {
                    return EvaluationOutcome::Rejected;
                };
                let xx_d = d.x.transpose() * &d.x;
                let xty_d = d.x.transpose() * &d.y;
                let Some(fit_d) =
                    self.conjugate_fit(&d.x, &d.y, &xx_d, &xty_d, &omega, &omega_inv, &h.psi)
                else {
                    return EvaluationOutcome::Rejected;
                };
                let n = y.nrows();
                (ConjugateFit { log_ml: fit.log_ml - fit_d.log_ml, ..fit }, xx, n)
            }
        };

        let log_ml = fit.log_ml + self.priors.log_hyperprior(&h);
        if !log_ml.is_finite() {
            return EvaluationOutcome::Rejected;
        }
        EvaluationOutcome::Accepted(EvaluationResult {
            log_ml,
            xx,
            n_obs,
            beta_hat: fit.beta_hat,
            sse: fit.sse,
            omega_inv,
            psi: h.psi,
        })
    }

    /// `ω₀ = var`, `ω[1+(l−1)M+j] = λ² / l^α / ψ_j`.
    fn prior_variances(&self, h: &ResolvedHypers) -> DVector<f64> {
        let m = self.n_vars();
        let mut omega = DVector::<f64>::zeros(self.n_coef());
        omega[0] = self.priors.intercept_variance();
        let lambda_sq = h.lambda * h.lambda;
        for l in 1..=self.lags {
            let decay = (l as f64).powf(h.alpha);
            for j in 0..m {
                omega[1 + (l - 1) * m + j] = lambda_sq / decay / h.psi[j];
            }
        }
        omega
    }

    /// Posterior mean, residual cross product and the conjugate log ML on
    /// the observations `(x, y)`; `None` when `XX + Ω⁻¹` has no Cholesky
    /// factor.
    #[allow(clippy::too_many_arguments)]
    fn conjugate_fit(
        &self, x: &DMatrix<f64>, y: &DMatrix<f64>, xx: &DMatrix<f64>, xty: &DMatrix<f64>,
        omega: &DVector<f64>, omega_inv: &DVector<f64>, psi: &Array1<f64>,
    ) -> Option<ConjugateFit> {
        let n = y.nrows();
        let m = y.ncols();

        let mut precision = xx.clone();
        for i in 0..precision.nrows() {
            precision[(i, i)] += omega_inv[i];
        }
        let mut rhs = xty.clone();
        for i in 0..rhs.nrows() {
            for j in 0..m {
                rhs[(i, j)] += omega_inv[i] * self.b[(i, j)];
            }
        }
        let beta_hat = precision.cholesky()?.solve(&rhs);

        let resid = y - x * &beta_hat;
        let mut sse = resid.transpose() * &resid;
        symmetrize(&mut sse);

        let diff = &beta_hat - &self.b;
        let mut weighted = diff.clone();
        for i in 0..weighted.nrows() {
            for j in 0..m {
                weighted[(i, j)] *= omega_inv[i];
            }
        }
        let mut scale = &sse + diff.transpose() * weighted;
        let inv_sqrt_psi: Vec<f64> = psi.iter().map(|p| 1.0 / p.sqrt()).collect();
        for i in 0..m {
            for j in 0..m {
                scale[(i, j)] *= inv_sqrt_psi[i] * inv_sqrt_psi[j];
            }
        }
        symmetrize(&mut scale);

        let sqrt_omega = omega.map(f64::sqrt);
        let mut a = xx.clone();
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                a[(i, j)] *= sqrt_omega[i] * sqrt_omega[j];
            }
        }
        symmetrize(&mut a);

        let d = (m + 2) as f64;
        let nf = n as f64;
        let mf = m as f64;
        let mut log_ml = -mf * nf * PI.ln() / 2.0;
        for i in 0..m {
            let fi = i as f64;
            log_ml += ln_gamma((nf + d - fi) / 2.0) - ln_gamma((d - fi) / 2.0);
        }
        log_ml -= nf * psi.iter().map(|p| p.ln()).sum::<f64>() / 2.0;
        log_ml -= mf * sum_log_eig_plus_one(a) / 2.0;
        log_ml -= (nf + d) * sum_log_eig_plus_one(scale) / 2.0;

        Some(ConjugateFit { log_ml, beta_hat, sse })
    }
}

fn stack_rows(top: &DMatrix<f64>, bottom: &DMatrix<f64>) -> DMatrix<f64> {
    let (rt, c) = top.shape();
    let rb = bottom.nrows();
    DMatrix::from_fn(rt + rb, c, |i, j| if i < rt { top[(i, j)] } else { bottom[(i - rt, j)] })
}
