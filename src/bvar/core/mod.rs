//! core — data, priors, hyperparameter layout and options for hierarchical BVARs.
//!
//! Purpose
//! -------
//! Collect the building blocks the evaluator, sampler and model sit on:
//! validated data ([`Dataset`]), the tagged prior specification
//! ([`PriorSpec`], [`HyperBlock`]), the mapping between flat hyperparameter
//! vectors and named values ([`HyperLayout`], [`ResolvedHypers`]),
//! dummy-observation rows, run options, and dense linear-algebra helpers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every container validates on construction; downstream code assumes
//!   finite data, consistent shapes and `min < mode < max` for sampled
//!   blocks.
//! - Column `1 + (l−1)·M + j` of `X` and row `1 + (l−1)·M + j` of any
//!   coefficient matrix refer to variable `j` at lag `l`.

pub mod data;
pub mod dummy;
pub mod hyper;
pub mod linalg;
pub mod options;
pub mod priors;
pub mod validation;

pub use self::data::Dataset;
pub use self::dummy::{DummyObservations, dummy_observations};
pub use self::hyper::{HyperCoord, HyperKind, HyperLayout, HyperparameterVector, ResolvedHypers};
pub use self::options::{BvarOptions, MhOptions, ModeOptions, SamplerConfig};
pub use self::priors::{
    HyperBlock, HyperBounds, Hyperprior, PriorSpec, PriorSpecBuilder, PsiBlock, ScalarBlock,
};
