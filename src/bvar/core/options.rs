//! Estimation options: draw counts, MH tuning, mode search and run bundle.
//!
//! Every struct has a validating `new` and a `Default` matching the usual
//! hierarchical-BVAR settings:
//!
//! | option | default |
//! |---|---|
//! | `n_draw` / `n_burn` / `n_thin` | 10000 / 5000 / 1 |
//! | `scale_hess` | 0.01 |
//! | `adjust_acc` | false |
//! | `adjust_burn` | 0.75 |
//! | `acc_lower` / `acc_upper` | 0.25 / 0.45 |
//! | `acc_tighten` / `acc_loosen` | 0.99 / 1.01 |
use crate::{
    bvar::{
        core::validation::validate_open_interval,
        errors::{BvarError, BvarResult},
    },
    irf::options::IrfSpec,
    optimization::loglik_optimizer::MLEOptions,
};

/// Draw counts of the MH chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    pub n_draw: usize,
    pub n_burn: usize,
    pub n_thin: usize,
}

impl SamplerConfig {
    /// Errors
    /// ------
    /// `BvarError::InvalidSamplerConfig` unless `n_burn < n_draw`,
    /// `n_thin ≥ 1` and `n_thin ≤ (n_draw − n_burn) / 10`.
    pub fn new(n_draw: usize, n_burn: usize, n_thin: usize) -> BvarResult<Self> {
        let fail = |reason| Err(BvarError::InvalidSamplerConfig { n_draw, n_burn, n_thin, reason });
        if n_burn >= n_draw {
            return fail("n_burn must be smaller than n_draw.");
        }
        if n_thin == 0 {
            return fail("n_thin must be at least 1.");
        }
        if n_thin > (n_draw - n_burn) / 10 {
            return fail("n_thin must not exceed (n_draw - n_burn) / 10.");
        }
        Ok(Self { n_draw, n_burn, n_thin })
    }

    /// Number of stored draws, `(n_draw − n_burn) / n_thin`.
    pub fn n_save(&self) -> usize {
        (self.n_draw - self.n_burn) / self.n_thin
    }

    /// Number of post-burn-in iterations.
    pub fn n_sampling(&self) -> usize {
        self.n_draw - self.n_burn
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { n_draw: 10_000, n_burn: 5_000, n_thin: 1 }
    }
}

/// Metropolis–Hastings tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MhOptions {
    /// Scale of the identity Hessian the proposal is built from.
    pub scale_hess: f64,
    /// Rescale the proposal during burn-in.
    pub adjust_acc: bool,
    /// Share of burn-in during which adaptation runs, in (0, 1].
    pub adjust_burn: f64,
    pub acc_lower: f64,
    pub acc_upper: f64,
    /// Factor < 1 applied when acceptance is too low.
    pub acc_tighten: f64,
    /// Factor > 1 applied when acceptance is too high.
    pub acc_loosen: f64,
    /// Cap on proposals tried to find an accepted starting point.
    pub max_init_attempts: usize,
}

impl MhOptions {
    /// Errors
    /// ------
    /// - `BvarError::InvalidMhOption` for the first out-of-range value.
    /// - `BvarError::InvalidAttemptCap` if `max_init_attempts == 0`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scale_hess: f64, adjust_acc: bool, adjust_burn: f64, acc_lower: f64, acc_upper: f64,
        acc_tighten: f64, acc_loosen: f64, max_init_attempts: usize,
    ) -> BvarResult<Self> {
        if !scale_hess.is_finite() || scale_hess <= 0.0 {
            return Err(BvarError::InvalidMhOption {
                field: "scale_hess",
                value: scale_hess,
                reason: "Must be finite and > 0.",
            });
        }
        if !adjust_burn.is_finite() || adjust_burn <= 0.0 || adjust_burn > 1.0 {
            return Err(BvarError::InvalidMhOption {
                field: "adjust_burn",
                value: adjust_burn,
                reason: "Must lie in (0, 1].",
            });
        }
        validate_open_interval("acc_lower", acc_lower, 0.0, 1.0)?;
        validate_open_interval("acc_upper", acc_upper, acc_lower, 1.0)?;
        validate_open_interval("acc_tighten", acc_tighten, 0.0, 1.0)?;
        if !acc_loosen.is_finite() || acc_loosen <= 1.0 {
            return Err(BvarError::InvalidMhOption {
                field: "acc_loosen",
                value: acc_loosen,
                reason: "Must be finite and > 1.",
            });
        }
        if max_init_attempts == 0 {
            return Err(BvarError::InvalidAttemptCap { field: "max_init_attempts" });
        }
        Ok(Self {
            scale_hess,
            adjust_acc,
            adjust_burn,
            acc_lower,
            acc_upper,
            acc_tighten,
            acc_loosen,
            max_init_attempts,
        })
    }
}

impl Default for MhOptions {
    fn default() -> Self {
        Self {
            scale_hess: 0.01,
            adjust_acc: false,
            adjust_burn: 0.75,
            acc_lower: 0.25,
            acc_upper: 0.45,
            acc_tighten: 0.99,
            acc_loosen: 1.01,
            max_init_attempts: 1_000,
        }
    }
}

/// Posterior-mode search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeOptions {
    pub mle: MLEOptions,
    /// Weight of the squared out-of-box distance in the objective.
    pub penalty: f64,
    /// Retry with Nelder–Mead when L-BFGS fails.
    pub nelder_mead_fallback: bool,
}

impl ModeOptions {
    /// # Errors
    /// `BvarError::InvalidMhOption` if `penalty` is not finite and > 0.
    pub fn new(mle: MLEOptions, penalty: f64, nelder_mead_fallback: bool) -> BvarResult<Self> {
        if !penalty.is_finite() || penalty <= 0.0 {
            return Err(BvarError::InvalidMhOption {
                field: "penalty",
                value: penalty,
                reason: "Must be finite and > 0.",
            });
        }
        Ok(Self { mle, penalty, nelder_mead_fallback })
    }
}

impl Default for ModeOptions {
    fn default() -> Self {
        Self { mle: MLEOptions::default(), penalty: 1e4, nelder_mead_fallback: true }
    }
}

/// Everything [`BvarModel::estimate`](crate::bvar::models::BvarModel::estimate)
/// needs besides data and priors.
#[derive(Debug, Clone, PartialEq)]
pub struct BvarOptions {
    pub sampler: SamplerConfig,
    pub mh: MhOptions,
    pub mode: ModeOptions,
    /// Impulse responses computed after sampling, if set.
    pub irf: Option<IrfSpec>,
    pub seed: u64,
    /// Retries of a conjugate draw whose covariance is not SPD.
    pub max_draw_attempts: usize,
}

impl BvarOptions {
    /// # Errors
    /// `BvarError::InvalidAttemptCap` if `max_draw_attempts == 0`.
    pub fn new(
        sampler: SamplerConfig, mh: MhOptions, mode: ModeOptions, irf: Option<IrfSpec>, seed: u64,
        max_draw_attempts: usize,
    ) -> BvarResult<Self> {
        if max_draw_attempts == 0 {
            return Err(BvarError::InvalidAttemptCap { field: "max_draw_attempts" });
        }
        Ok(Self { sampler, mh, mode, irf, seed, max_draw_attempts })
    }
}

impl Default for BvarOptions {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            mh: MhOptions::default(),
            mode: ModeOptions::default(),
            irf: None,
            seed: 42,
            max_draw_attempts: 10,
        }
    }
}
