//! loglik_optimizer — argmin-powered maximizer for smooth objectives on a box.
//!
//! Purpose
//! -------
//! Maximize an objective `ℓ(θ)` (here, the hyperparameter log marginal
//! likelihood) over a coordinate box. Callers implement [`LogLikelihood`]
//! and call [`maximize`] (L-BFGS) or [`maximize_nelder_mead`] (simplex).
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ` into the argmin cost
//!   `c(θ) = -ℓ(Π(θ)) + penalty · dist²(θ, box)`.
//! - [`builders`] construct L-BFGS or Nelder–Mead solvers from
//!   [`MLEOptions`].
//! - [`run`] executes a solver and normalizes the state into an
//!   [`OptimOutcome`].
//! - [`finite_diff`] supplies central/forward gradients with error capture.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ℓ` is evaluated only at points inside the box once a box is attached.
//! - Configuration types are validated on construction.
//!
//! Conventions
//! -----------
//! - Parameters are raw hyperparameter values ([`Theta`]); no
//!   reparameterization happens in this layer.
//! - Errors bubble up as [`OptResult<T>`](crate::optimization::errors::OptResult).
//!
//! Testing notes
//! -------------
//! - Unit tests cover sign conventions and penalties ([`adapter`]), solver
//!   wiring ([`builders`]), FD fallbacks ([`finite_diff`]), validation, and
//!   end-to-end runs on shifted quadratic bowls ([`api`]).

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{maximize, maximize_nelder_mead};
pub use self::traits::{
    BoxConstraints, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::{maximize, maximize_nelder_mead};
    pub use super::traits::{
        BoxConstraints, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
