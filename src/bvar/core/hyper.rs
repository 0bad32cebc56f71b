//! Hyperparameter coordinates, layouts and resolved values.
//!
//! Purpose
//! -------
//! Map between the flat vector the optimizer and sampler move around and
//! the named hyperparameters the evaluator needs.
//!
//! Key behaviors
//! -------------
//! - [`HyperLayout`] lists the sampled coordinates in a fixed order
//!   (`lambda`, `alpha`, `psi1..psiM`, `soc`, `sur`; fixed ones omitted)
//!   together with their modes and bounds.
//! - [`HyperparameterVector`] is a named, length-checked view of one point.
//! - [`ResolvedHypers`] holds every hyperparameter value in effect,
//!   sampled or fixed.
use crate::{
    bvar::errors::{BvarError, BvarResult},
    optimization::loglik_optimizer::Theta,
};
use ndarray::Array1;
use std::fmt;

/// Tag of a prior block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HyperKind {
    /// Overall tightness.
    Lambda,
    /// Lag decay.
    Alpha,
    /// Residual scale, one per variable.
    Psi,
    /// Sum-of-coefficients dummy.
    Soc,
    /// Single-unit-root dummy.
    Sur,
}

impl HyperKind {
    pub fn name(&self) -> &'static str {
        match self {
            HyperKind::Lambda => "lambda",
            HyperKind::Alpha => "alpha",
            HyperKind::Psi => "psi",
            HyperKind::Soc => "soc",
            HyperKind::Sur => "sur",
        }
    }
}

/// One coordinate of the sampled vector. `index` is the variable for psi
/// and 0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HyperCoord {
    pub kind: HyperKind,
    pub index: usize,
}

impl fmt::Display for HyperCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            HyperKind::Psi => write!(f, "psi{}", self.index + 1),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Ordered sampled coordinates with their modes and inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperLayout {
    pub coords: Vec<HyperCoord>,
    pub modes: Theta,
    pub lower: Theta,
    pub upper: Theta,
}

impl HyperLayout {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.coords.iter().map(|c| c.to_string()).collect()
    }

    /// Inclusive box test; also `false` on a length mismatch.
    pub fn contains(&self, theta: &Theta) -> bool {
        theta.len() == self.len()
            && theta
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// # Errors
    /// `BvarError::HyperLengthMismatch` if `theta.len() != self.len()`.
    pub fn check_len(&self, theta: &Theta) -> BvarResult<()> {
        if theta.len() != self.len() {
            return Err(BvarError::HyperLengthMismatch { expected: self.len(), found: theta.len() });
        }
        Ok(())
    }
}

/// Named point in hyperparameter space.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperparameterVector {
    values: Theta,
    names: Vec<String>,
}

impl HyperparameterVector {
    /// # Errors
    /// `BvarError::HyperLengthMismatch` if `values` does not match `layout`.
    pub fn new(values: Theta, layout: &HyperLayout) -> BvarResult<Self> {
        layout.check_len(&values)?;
        Ok(Self { values, names: layout.names() })
    }

    /// Pair `values` with names already checked against the same layout.
    pub(crate) fn from_parts(values: Theta, names: Vec<String>) -> Self {
        debug_assert_eq!(values.len(), names.len());
        Self { values, names }
    }

    pub fn values(&self) -> &Theta {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }
}

/// Every hyperparameter value in effect at one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHypers {
    pub lambda: f64,
    pub alpha: f64,
    pub psi: Array1<f64>,
    pub soc: Option<f64>,
    pub sur: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn layout() -> HyperLayout {
        HyperLayout {
            coords: vec![
                HyperCoord { kind: HyperKind::Lambda, index: 0 },
                HyperCoord { kind: HyperKind::Psi, index: 0 },
                HyperCoord { kind: HyperKind::Psi, index: 1 },
            ],
            modes: array![0.2, 1.0, 2.0],
            lower: array![1e-4, 0.01, 0.02],
            upper: array![5.0, 100.0, 200.0],
        }
    }

    #[test]
    // Purpose
    // -------
    // Coordinate names follow the `lambda`, `psi1..psiM` convention and the
    // named vector looks values up by them.
    fn names_and_lookup_follow_layout_order() {
        // Arrange
        let l = layout();

        // Act
        let v = HyperparameterVector::new(array![0.3, 1.5, 2.5], &l).unwrap();

        // Assert
        assert_eq!(l.names(), vec!["lambda", "psi1", "psi2"]);
        assert_eq!(v.get("psi2"), Some(2.5));
        assert_eq!(v.get("alpha"), None);
    }

    #[test]
    // Purpose
    // -------
    // Box membership is inclusive and length-aware.
    fn contains_is_inclusive_and_length_checked() {
        let l = layout();

        assert!(l.contains(&array![1e-4, 0.01, 200.0]));
        assert!(!l.contains(&array![1e-5, 1.0, 2.0]));
        assert!(!l.contains(&array![0.2, 1.0]));
        assert_eq!(
            HyperparameterVector::new(array![0.2], &l),
            Err(BvarError::HyperLengthMismatch { expected: 3, found: 1 })
        );
    }
}
