//! optimization — box-constrained maximizer, numerical helpers, error surface.
//!
//! Purpose
//! -------
//! Provide the argmin-backed layer the BVAR mode search runs on. Callers
//! implement [`loglik_optimizer::LogLikelihood`], describe a box with
//! [`loglik_optimizer::BoxConstraints`], and get back an
//! [`loglik_optimizer::OptimOutcome`] without touching solver internals.
//!
//! Key behaviors
//! -------------
//! - L-BFGS (More–Thuente or Hager–Zhang line search) with finite-difference
//!   gradients of a projected, penalized cost.
//! - A Nelder–Mead entry point on the same cost, used as a fallback.
//! - Shared numeric helpers in [`numerical_stability`].
//! - A single error enum, [`errors::OptError`], with argmin errors mapped in.
//!
//! Conventions
//! -----------
//! - Objectives are maximized; internally the cost is `c(θ) = -ℓ(θ)`.
//! - Nothing here logs above `debug` level; the BVAR orchestration layer
//!   owns run-level reporting.
//!
//! Testing notes
//! -------------
//! - Submodule unit tests use toy quadratic objectives; the end-to-end mode
//!   search is exercised from `bvar::mode` and the integration test.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
