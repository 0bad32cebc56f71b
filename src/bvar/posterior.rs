//! posterior — conjugate draws of (β, Σ) and the stored posterior sample.
//!
//! Purpose
//! -------
//! Given the sufficient statistics of an accepted hyperparameter vector,
//! draw the VAR coefficients and innovation covariance from their
//! Normal–Inverse-Wishart conditional posterior, and keep every retained
//! draw in pre-sized arrays.
//!
//! Key behaviors
//! -------------
//! - `S_post = diag(ψ) + sse + (β̂ − b)ᵀ Ω⁻¹ (β̂ − b)`, symmetrized.
//! - `Σ ~ IW(S_post, N + M + 2)` through the Bartlett decomposition of the
//!   Wishart draw of `Σ⁻¹`: with `S_post = U Uᵀ` and `A` lower triangular
//!   (`A_ii = √χ²(ν − i)`, standard normals below the diagonal),
//!   `Σ = U A⁻ᵀ A⁻¹ Uᵀ`.
//! - `β = β̂ + R⁻ᵀ Z Lᵀ` with `XX + Ω⁻¹ = R Rᵀ`, `Σ = L Lᵀ` and `Z` a `K×M`
//!   standard normal matrix; the `KM × KM` Kronecker covariance is never
//!   formed.
//! - A `Σ` without a Cholesky factor is redrawn up to `max_attempts` times.
//!
//! Conventions
//! -----------
//! - [`PosteriorSample`] stores slot-major arrays: `beta[[s, k, m]]`,
//!   `sigma[[s, i, j]]`, `hyper[[s, p]]`.
use crate::{
    bvar::{
        core::{
            hyper::HyperparameterVector,
            linalg::{symmetrize, to_array2},
        },
        errors::{BvarError, BvarResult},
        ml::EvaluationResult,
        mode::PosteriorModeResult,
        sampler::ChainStats,
    },
    optimization::loglik_optimizer::Theta,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Array3, Axis, s};
use rand::Rng;
use rand_distr::{ChiSquared, Distribution, StandardNormal};

/// One retained posterior draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Draw {
    pub hyper: HyperparameterVector,
    pub log_ml: f64,
    /// `K×M` coefficients; row 0 is the intercept.
    pub beta: Array2<f64>,
    /// `M×M` innovation covariance.
    pub sigma: Array2<f64>,
    /// Lower Cholesky factor of `sigma`.
    pub sigma_chol: Array2<f64>,
}

/// Draw `(β, Σ, chol Σ)` from the conjugate posterior at `result`.
///
/// # Errors
/// `BvarError::PosteriorDrawFailed` if no SPD `Σ` is produced within
/// `max_attempts`, or if `XX + Ω⁻¹` has no Cholesky factor.
pub fn conjugate_draw<R: Rng + ?Sized>(
    result: &EvaluationResult, b: &DMatrix<f64>, rng: &mut R, max_attempts: usize,
) -> BvarResult<(DMatrix<f64>, DMatrix<f64>, DMatrix<f64>)> {
    let fail = BvarError::PosteriorDrawFailed { attempts: max_attempts };
    let m = result.beta_hat.ncols();
    let k = result.beta_hat.nrows();

    let diff = &result.beta_hat - b;
    let mut weighted = diff.clone();
    for i in 0..k {
        for j in 0..m {
            weighted[(i, j)] *= result.omega_inv[i];
        }
    }
    let mut s_post = &result.sse + diff.transpose() * weighted;
    for j in 0..m {
        s_post[(j, j)] += result.psi[j];
    }
    symmetrize(&mut s_post);
    let u = s_post.cholesky().ok_or_else(|| fail.clone())?.l();

    let mut precision = result.xx.clone();
    for i in 0..k {
        precision[(i, i)] += result.omega_inv[i];
    }
    let r = precision.cholesky().ok_or_else(|| fail.clone())?.l();

    let dof = (result.n_obs + m + 2) as f64;
    for _ in 0..max_attempts {
        let Some(sigma) = inverse_wishart(&u, dof, rng) else {
            continue;
        };
        let Some(chol) = sigma.clone().cholesky() else {
            continue;
        };
        let l = chol.l();
        let z = DMatrix::<f64>::from_fn(k, m, |_, _| rng.sample(StandardNormal));
        let Some(shock) = r.tr_solve_lower_triangular(&z) else {
            return Err(fail);
        };
        let beta = &result.beta_hat + shock * l.transpose();
        return Ok((beta, sigma, l));
    }
    Err(fail)
}

/// `Σ = U A⁻ᵀ A⁻¹ Uᵀ` with `A` the Bartlett factor of a `W(I, dof)` draw.
fn inverse_wishart<R: Rng + ?Sized>(
    u: &DMatrix<f64>, dof: f64, rng: &mut R,
) -> Option<DMatrix<f64>> {
    let m = u.nrows();
    let mut a = DMatrix::<f64>::zeros(m, m);
    for i in 0..m {
        let chi = ChiSquared::new(dof - i as f64).ok()?;
        a[(i, i)] = chi.sample(rng).sqrt();
        for j in 0..i {
            a[(i, j)] = rng.sample(StandardNormal);
        }
    }
    let a_inv = a.solve_lower_triangular(&DMatrix::identity(m, m))?;
    let g = u * a_inv.transpose();
    let mut sigma = &g * g.transpose();
    symmetrize(&mut sigma);
    sigma.iter().all(|v| v.is_finite()).then_some(sigma)
}

/// Every retained draw of one estimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorSample {
    names: Vec<String>,
    hyper: Array2<f64>,
    log_ml: Array1<f64>,
    beta: Array3<f64>,
    sigma: Array3<f64>,
    sigma_chol: Array3<f64>,
    filled: usize,
    stats: Option<ChainStats>,
    mode: Option<PosteriorModeResult>,
}

impl PosteriorSample {
    /// Zeroed storage for `n_save` draws of a system with `k` coefficients
    /// per equation and `m` variables.
    pub fn with_capacity(n_save: usize, names: Vec<String>, k: usize, m: usize) -> Self {
        let p = names.len();
        Self {
            names,
            hyper: Array2::zeros((n_save, p)),
            log_ml: Array1::zeros(n_save),
            beta: Array3::zeros((n_save, k, m)),
            sigma: Array3::zeros((n_save, m, m)),
            sigma_chol: Array3::zeros((n_save, m, m)),
            filled: 0,
            stats: None,
            mode: None,
        }
    }

    /// Write the next draw into its slot.
    ///
    /// # Errors
    /// - `BvarError::DimensionMismatch` if the sample is full or a shape
    ///   disagrees with the storage.
    pub fn push(
        &mut self, hyper: &Theta, log_ml: f64, beta: &DMatrix<f64>, sigma: &DMatrix<f64>,
        sigma_chol: &DMatrix<f64>,
    ) -> BvarResult<()> {
        let slot = self.filled;
        if slot >= self.capacity() {
            return Err(BvarError::DimensionMismatch {
                what: "posterior sample slots",
                expected: self.capacity(),
                found: slot + 1,
            });
        }
        if hyper.len() != self.names.len() {
            return Err(BvarError::HyperLengthMismatch {
                expected: self.names.len(),
                found: hyper.len(),
            });
        }
        let (_, k, m) = self.beta.dim();
        if beta.shape() != (k, m) {
            return Err(BvarError::DimensionMismatch {
                what: "beta draw rows",
                expected: k,
                found: beta.nrows(),
            });
        }
        if sigma.shape() != (m, m) || sigma_chol.shape() != (m, m) {
            return Err(BvarError::DimensionMismatch {
                what: "sigma draw rows",
                expected: m,
                found: sigma.nrows(),
            });
        }
        self.hyper.row_mut(slot).assign(hyper);
        self.log_ml[slot] = log_ml;
        self.beta.slice_mut(s![slot, .., ..]).assign(&to_array2(beta));
        self.sigma.slice_mut(s![slot, .., ..]).assign(&to_array2(sigma));
        self.sigma_chol.slice_mut(s![slot, .., ..]).assign(&to_array2(sigma_chol));
        self.filled += 1;
        Ok(())
    }

    pub(crate) fn set_run_info(&mut self, stats: ChainStats, mode: PosteriorModeResult) {
        self.stats = Some(stats);
        self.mode = Some(mode);
    }

    pub fn capacity(&self) -> usize {
        self.log_ml.len()
    }

    /// Number of draws written so far.
    pub fn n_draws(&self) -> usize {
        self.filled
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `n_save × P` hyperparameter trace.
    pub fn hyper(&self) -> &Array2<f64> {
        &self.hyper
    }

    pub fn log_ml(&self) -> &Array1<f64> {
        &self.log_ml
    }

    /// `n_save × K × M`.
    pub fn beta(&self) -> &Array3<f64> {
        &self.beta
    }

    /// `n_save × M × M`.
    pub fn sigma(&self) -> &Array3<f64> {
        &self.sigma
    }

    pub fn sigma_chol(&self) -> &Array3<f64> {
        &self.sigma_chol
    }

    pub fn stats(&self) -> Option<&ChainStats> {
        self.stats.as_ref()
    }

    pub fn mode(&self) -> Option<&PosteriorModeResult> {
        self.mode.as_ref()
    }

    /// Sampling-phase acceptance rate, if the chain has run.
    pub fn acceptance_rate(&self) -> Option<f64> {
        self.stats.map(|s| s.acceptance_rate)
    }

    /// Copy of draw `slot`, or `None` past the filled range.
    pub fn draw(&self, slot: usize) -> Option<Draw> {
        (slot < self.filled).then(|| Draw {
            hyper: HyperparameterVector::from_parts(
                self.hyper.row(slot).to_owned(),
                self.names.clone(),
            ),
            log_ml: self.log_ml[slot],
            beta: self.beta.index_axis(Axis(0), slot).to_owned(),
            sigma: self.sigma.index_axis(Axis(0), slot).to_owned(),
            sigma_chol: self.sigma_chol.index_axis(Axis(0), slot).to_owned(),
        })
    }

    /// Posterior mean of the coefficients over the filled draws.
    pub fn coefficient_mean(&self) -> Option<Array2<f64>> {
        self.beta.slice(s![..self.filled, .., ..]).mean_axis(Axis(0))
    }

    /// Posterior mean of the innovation covariance over the filled draws.
    pub fn sigma_mean(&self) -> Option<Array2<f64>> {
        self.sigma.slice(s![..self.filled, .., ..]).mean_axis(Axis(0))
    }
}
