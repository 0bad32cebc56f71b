//! rust_bvar — hierarchical Bayesian VAR estimation.
//!
//! Purpose
//! -------
//! Serve as the crate root: expose the BVAR estimator, the impulse-response
//! engine and the argmin-backed optimizer they rely on.
//!
//! Key behaviors
//! -------------
//! - [`bvar`]: data, priors, closed-form marginal likelihood, posterior-mode
//!   search, adaptive Metropolis–Hastings over hyperparameters and
//!   conjugate posterior draws, tied together by
//!   [`BvarModel`](bvar::models::BvarModel).
//! - [`irf`]: Cholesky and sign-restricted impulse responses and FEVD for
//!   every posterior draw.
//! - [`optimization`]: box-constrained L-BFGS / Nelder–Mead maximization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated at construction; estimation itself fails only on
//!   optimizer failure or exhausted attempt caps.
//! - Runs are deterministic given `BvarOptions::seed`.
//!
//! Conventions
//! -----------
//! - Errors are reported per layer ([`bvar::BvarError`], [`irf::IrfError`],
//!   [`optimization::errors::OptError`]) and convert upward with `?`.
//! - Logging goes through `tracing`; the crate never installs a subscriber.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds the end-to-end
//!   pipeline run.

pub mod bvar;
pub mod irf;
pub mod optimization;

pub mod prelude {
    pub use crate::bvar::prelude::*;
    pub use crate::irf::prelude::*;
}
