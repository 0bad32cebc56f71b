//! loglik_optimizer::finite_diff — finite-difference gradients with error capture.
//!
//! Purpose
//! -------
//! Approximate the gradient of the penalized cost when the objective has no
//! analytic derivative (the marginal likelihood never does). The
//! `finitediff` closures must return `f64`, so evaluation errors are parked
//! in a shared `RefCell` and surfaced after the difference sweep.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`] tries central differences first and falls back to
//!   forward differences when a closure evaluation failed or the central
//!   gradient is not finite.
//! - [`run_fd_diff`] is the forward-difference leg with validation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Gradients returned from this module always pass [`validate_grad`].
use crate::optimization::loglik_optimizer::{Grad, Theta, validation::validate_grad};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Central-then-forward finite-difference gradient of `func` at `theta`.
///
/// `func` must route evaluation failures into `closure_err` and return
/// `NaN`; the first captured error is returned if the forward pass also
/// fails.
///
/// # Errors
/// - The error captured from `func` during the forward pass.
/// - [`validate_grad`] failures on the forward-difference gradient.
pub fn fd_gradient<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let central = theta.central_diff(func);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    run_fd_diff(theta, func, closure_err)
}

/// Forward-difference gradient with error capture and validation.
///
/// Clears `closure_err`, runs `forward_diff`, then returns the captured
/// error if any, otherwise the validated gradient.
///
/// # Errors
/// - The error captured from `func`.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
