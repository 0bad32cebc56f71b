//! Errors for hierarchical BVAR estimation (data checks, prior and sampler
//! configuration, mode search and posterior draws).
//!
//! ## Conventions
//! - **Indices are 0-based**; rows are time, columns are variables.
//! - Configuration errors are raised at construction and never mid-run.
//! - Numerical degeneracy inside the marginal-likelihood evaluator is *not*
//!   an error; it is reported as `EvaluationOutcome::Rejected`.
//! - Optimizer failures arrive as [`BvarError::Optimization`] and IRF
//!   failures as [`BvarError::Irf`].
use crate::{irf::errors::IrfError, optimization::errors::OptError};
use thiserror::Error;

/// Result alias for BVAR operations.
pub type BvarResult<T> = Result<T, BvarError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BvarError {
    // ---- Input/data validation ----
    /// No rows or no columns.
    #[error("Input data is empty.")]
    EmptyData,

    /// Lag order must be at least one.
    #[error("Invalid lag order {lags}: {reason}")]
    InvalidLags { lags: usize, reason: &'static str },

    /// Not enough rows to build at least one regression observation.
    #[error("Need more than {lags} observations for {lags} lags; got {n_obs}.")]
    InsufficientObservations { n_obs: usize, lags: usize },

    /// A data point is NaN/±inf.
    #[error("Data point at row {row}, column {col} is non-finite: {value}")]
    NonFiniteData { row: usize, col: usize, value: f64 },

    /// Two inputs disagree on a dimension.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    // ---- Prior specification ----
    /// A hyperparameter's (min, mode, max) triple is inconsistent.
    #[error("Invalid bounds for '{name}': min {min}, mode {mode}, max {max}: {reason}")]
    InvalidHyperBounds { name: String, min: f64, mode: f64, max: f64, reason: &'static str },

    /// A hyperprior parameter is not finite and positive.
    #[error("Invalid hyperprior for '{name}': {value}: {reason}")]
    InvalidHyperprior { name: String, value: f64, reason: &'static str },

    /// At least one hyperparameter must be sampled.
    #[error("No hierarchical hyperparameters: at least one must be sampled.")]
    NoHierarchicalParameters,

    /// Intercept prior variance must be finite and > 0.
    #[error("Invalid intercept prior variance {value}: must be finite and > 0")]
    InvalidPriorVariance { value: f64 },

    /// Prior mean contains a non-finite entry.
    #[error("Prior mean entry ({row}, {col}) is non-finite: {value}")]
    InvalidPriorMean { row: usize, col: usize, value: f64 },

    // ---- Sampler / mode options ----
    /// Draw counts violate n_burn < n_draw, 1 ≤ n_thin ≤ (n_draw − n_burn)/10.
    #[error(
        "Invalid sampler configuration (n_draw {n_draw}, n_burn {n_burn}, n_thin {n_thin}): {reason}"
    )]
    InvalidSamplerConfig { n_draw: usize, n_burn: usize, n_thin: usize, reason: &'static str },

    /// A Metropolis–Hastings tuning value is out of range.
    #[error("Invalid MH option '{field}' = {value}: {reason}")]
    InvalidMhOption { field: &'static str, value: f64, reason: &'static str },

    /// Attempt caps must be positive.
    #[error("Invalid attempt cap '{field}': must be > 0")]
    InvalidAttemptCap { field: &'static str },

    // ---- Estimation ----
    /// The projected optimum evaluates as rejected.
    #[error("Posterior mode search ended at a point the evaluator rejects.")]
    ModeRejected,

    /// Optimizer failure (both the quasi-Newton run and the simplex fallback).
    #[error("Optimization failed: {0}")]
    Optimization(#[from] OptError),

    /// No accepted starting draw within the attempt cap.
    #[error("No accepted initial proposal after {attempts} attempts.")]
    InitialDrawFailed { attempts: usize },

    /// Conjugate draw kept producing a non-SPD covariance.
    #[error("Conjugate posterior draw failed after {attempts} attempts.")]
    PosteriorDrawFailed { attempts: usize },

    /// Hyperparameter vector length disagrees with the prior layout.
    #[error("Hyperparameter vector has length {found}, prior layout expects {expected}.")]
    HyperLengthMismatch { expected: usize, found: usize },

    /// Results requested before `estimate` was called.
    #[error("Model has not been estimated yet.")]
    ModelNotEstimated,

    // ---- Downstream ----
    #[error("Impulse response failure: {0}")]
    Irf(#[from] IrfError),
}
