//! Errors for impulse-response and variance-decomposition computation.
use thiserror::Error;

pub type IrfResult<T> = Result<T, IrfError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrfError {
    // ---- Configuration ----
    /// Horizon must be at least one step.
    #[error("Invalid IRF horizon {horizon}: must be >= 1")]
    InvalidHorizon { horizon: usize },

    /// Sign matrix must be M×M.
    #[error("Sign restriction matrix is {rows}x{cols}; expected {expected}x{expected}")]
    SignMatrixShape { rows: usize, cols: usize, expected: usize },

    /// Sign matrix entries must be -1, 0 or +1.
    #[error("Sign restriction entry ({row}, {col}) = {value}: must be -1, 0 or +1")]
    InvalidSignEntry { row: usize, col: usize, value: f64 },

    /// Restricted horizons must lie in 1..=horizon.
    #[error("Invalid restricted horizon count {sign_horizon} for IRF horizon {horizon}")]
    InvalidSignHorizon { sign_horizon: usize, horizon: usize },

    /// Rotation search cap must be positive.
    #[error("Sign restriction attempt cap must be > 0")]
    InvalidMaxAttempts,

    // ---- Inputs ----
    /// Coefficient or covariance shape inconsistent with the system.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    /// Innovation covariance has no Cholesky factor.
    #[error("Innovation covariance is not positive definite.")]
    SigmaNotPositiveDefinite,

    // ---- Identification ----
    /// No rotation satisfied the restrictions within the cap.
    #[error("No rotation satisfied the sign restrictions in {attempts} attempts.")]
    SignSearchExhausted { attempts: usize },

    /// Every draw of the ensemble failed identification.
    #[error("Sign restrictions failed for all {n_draws} draws.")]
    AllDrawsFailed { n_draws: usize },
}
