//! numerical_stability — guarded scalar transforms and shared tolerances.
//!
//! Purpose
//! -------
//! Keep the small pieces of numerics that several layers share (the
//! logistic map used by the proposal Jacobian and the eigenvalue floor
//! used by the marginal likelihood and PSD repair) in one place.
//!
//! Conventions
//! -----------
//! - Pure functions on `f64`; no logging, no I/O, no global state.
//! - Inputs are assumed finite; callers validate upstream.

pub mod transformations;

pub use self::transformations::{EIGEN_EPS, logistic_derivative, safe_logistic};

pub mod prelude {
    pub use super::transformations::{EIGEN_EPS, logistic_derivative, safe_logistic};
}
