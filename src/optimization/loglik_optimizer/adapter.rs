//! Adapter that exposes a [`LogLikelihood`] as an `argmin` problem.
//!
//! Maximizing `ℓ(θ)` becomes minimizing `c(θ) = -ℓ(θ)`. When a
//! [`BoxConstraints`] is attached the cost is evaluated at the projection
//! of `θ` and a quadratic penalty on the distance to the box is added:
//!
//! `c(θ) = -ℓ(Π(θ)) + penalty · dist²(θ, box)`
//!
//! Analytic gradients are only used without a box; with a box the
//! projection makes the analytic gradient inconsistent with the cost, so
//! finite differences of the penalized cost are taken instead.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        finite_diff::fd_gradient,
        traits::{BoxConstraints, LogLikelihood},
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
    pub bounds: Option<&'a BoxConstraints>,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data, bounds: None }
    }

    pub fn with_bounds(f: &'a F, data: &'a F::Data, bounds: &'a BoxConstraints) -> Self {
        Self { f, data, bounds: Some(bounds) }
    }

    fn fd_cost_gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.cost(theta) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        fd_gradient(theta, &cost_func, &closure_err)
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Penalized cost at `θ`.
    ///
    /// # Errors
    /// - Any `OptError` from the objective's `value`.
    /// - `OptError::NonFiniteCost` if the objective is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let (output, penalty) = match self.bounds {
            Some(b) => {
                (self.f.value(&b.project(theta), self.data)?, b.penalty * b.distance_sq(theta))
            }
            None => (self.f.value(theta, self.data)?, 0.0),
        };
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output + penalty)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Gradient of the cost at `θ`.
    ///
    /// - Unbounded with an analytic gradient: validated `-∇ℓ(θ)`.
    /// - Otherwise: central-then-forward differences of the cost.
    ///
    /// # Errors
    /// Propagates objective errors other than `GradientNotImplemented`, and
    /// gradient validation failures.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        if self.bounds.is_some() {
            return self.fd_cost_gradient(theta);
        }
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => self.fd_cost_gradient(theta),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    struct NegSquare;

    impl LogLikelihood for NegSquare {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            Ok(-theta.dot(theta))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(theta.mapv(|v| -2.0 * v))
        }
    }

    #[test]
    // Purpose
    // -------
    // Without a box the cost is the negated objective and the analytic
    // gradient is negated.
    //
    // Given
    // -----
    // - ℓ(θ) = -θ·θ at θ = (1, -2).
    //
    // Expect
    // ------
    // - cost = 5, gradient = (2, -4).
    fn cost_and_gradient_flip_sign_without_box() {
        // Arrange
        let adapter = ArgMinAdapter::new(&NegSquare, &());
        let theta = array![1.0, -2.0];

        // Act
        let c = adapter.cost(&theta).unwrap();
        let g = adapter.gradient(&theta).unwrap();

        // Assert
        assert_abs_diff_eq!(c, 5.0);
        assert_abs_diff_eq!(g[0], 2.0);
        assert_abs_diff_eq!(g[1], -4.0);
    }

    #[test]
    // Purpose
    // -------
    // Outside the box the cost uses the projected point plus the penalty.
    //
    // Given
    // -----
    // - Box `[0.5, 2]`, penalty 100, θ = 0.0.
    //
    // Expect
    // ------
    // - cost = -ℓ(0.5) + 100·0.25 = 0.25 + 25.
    // - The gradient points back toward the box (negative).
    fn cost_penalizes_distance_outside_box() {
        // Arrange
        let bounds = BoxConstraints::new(array![0.5], array![2.0], 100.0).unwrap();
        let adapter = ArgMinAdapter::with_bounds(&NegSquare, &(), &bounds);
        let theta = array![0.0];

        // Act
        let c = adapter.cost(&theta).unwrap();
        let g = adapter.gradient(&theta).unwrap();

        // Assert
        assert_abs_diff_eq!(c, 25.25, epsilon = 1e-12);
        assert!(g[0] < 0.0);
    }
}
