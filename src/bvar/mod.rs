//! bvar — hierarchical Bayesian VAR estimation.
//!
//! Purpose
//! -------
//! Estimate a VAR(p) under a Minnesota prior whose hyperparameters get their
//! own hyperpriors: the log marginal likelihood is available in closed form,
//! so the hyperparameters are sampled by Metropolis–Hastings and the VAR
//! coefficients and innovation covariance are drawn conjugately given them.
//!
//! Key behaviors
//! -------------
//! - [`ml`]: closed-form log marginal likelihood, [`ml::EvaluationOutcome`].
//! - [`mode`]: posterior-mode search and the Gaussian MH proposal.
//! - [`sampler`]: adaptive independence Metropolis–Hastings.
//! - [`posterior`]: Normal–Inverse-Wishart draws and stored samples.
//! - [`models`]: [`BvarModel`] orchestration.
//! - [`core`]: data, priors, hyperparameter layout and options.
//!
//! Invariants & assumptions
//! ------------------------
//! - Numerical failure inside the evaluator is a rejection, never an error
//!   or a panic; configuration errors surface at construction.
//! - Every run is reproducible from `BvarOptions::seed`.
//!
//! Conventions
//! -----------
//! - `Y` is `T×M`, `X` is `T×K` with `K = 1 + M·p` (intercept first, then
//!   lag blocks), coefficients are `K×M`.
//! - Public containers are `ndarray`; factorizations use `nalgebra`.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; `tests/integration_bvar_pipeline.rs`
//!   runs the full pipeline on simulated data.

pub mod core;
pub mod errors;
pub mod ml;
pub mod mode;
pub mod models;
pub mod posterior;
pub mod sampler;

pub use self::errors::{BvarError, BvarResult};
pub use self::ml::{EvaluationOutcome, EvaluationResult, MarginalLikelihood};
pub use self::mode::{ModeMethod, PosteriorModeResult, ProposalDistribution, find_posterior_mode};
pub use self::models::BvarModel;
pub use self::posterior::{Draw, PosteriorSample, conjugate_draw};
pub use self::sampler::{ChainStats, MhTarget, run_chain};

pub mod prelude {
    pub use super::core::{
        BvarOptions, Dataset, MhOptions, ModeOptions, PriorSpec, SamplerConfig, ScalarBlock,
    };
    pub use super::errors::{BvarError, BvarResult};
    pub use super::models::BvarModel;
    pub use super::posterior::PosteriorSample;
}
