//! BVAR validation helpers — reusable checks for data, bounds and tuning values.
//!
//! Purpose
//! -------
//! Centralize the small checks that constructors in [`crate::bvar::core`]
//! run, so every entry point fails fast with the same structured
//! [`BvarError`] variants.
//!
//! Conventions
//! -----------
//! - Helpers return [`BvarResult`] and never panic on invalid inputs.
//! - Indices in errors are 0-based and point at the first offending entry.
//! - No I/O and no logging.
use crate::bvar::errors::{BvarError, BvarResult};
use ndarray::Array2;

/// Reject a matrix with any non-finite entry (row-major scan).
pub fn validate_finite_matrix(a: &Array2<f64>) -> BvarResult<()> {
    for ((row, col), &value) in a.indexed_iter() {
        if !value.is_finite() {
            return Err(BvarError::NonFiniteData { row, col, value });
        }
    }
    Ok(())
}

/// Check a hyperparameter's `(min, mode, max)` triple.
///
/// - All three finite, `min > 0` and `min < max`.
/// - Hierarchical parameters additionally need `min < mode < max`; fixed
///   ones only need a finite positive mode.
///
/// # Errors
/// `BvarError::InvalidHyperBounds` with a reason naming the broken rule.
pub fn validate_hyper_bounds(
    name: &str, min: f64, mode: f64, max: f64, hierarchical: bool,
) -> BvarResult<()> {
    let fail = |reason: &'static str| {
        Err(BvarError::InvalidHyperBounds { name: name.to_string(), min, mode, max, reason })
    };
    if !(min.is_finite() && mode.is_finite() && max.is_finite()) {
        return fail("Bounds and mode must be finite.");
    }
    if mode <= 0.0 {
        return fail("Mode must be strictly positive.");
    }
    if min <= 0.0 {
        return fail("Lower bound must be strictly positive.");
    }
    if min >= max {
        return fail("Lower bound must be below the upper bound.");
    }
    if hierarchical && !(min < mode && mode < max) {
        return fail("Mode must lie strictly inside the bounds.");
    }
    Ok(())
}

/// Require `value` finite and > 0; used for hyperprior parameters.
pub fn validate_positive(name: &str, value: f64) -> BvarResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BvarError::InvalidHyperprior {
            name: name.to_string(),
            value,
            reason: "Must be finite and > 0.",
        });
    }
    Ok(())
}

/// Require `value` in the open interval `(lo, hi)`; used for MH tuning.
pub fn validate_open_interval(field: &'static str, value: f64, lo: f64, hi: f64) -> BvarResult<()> {
    if !value.is_finite() || value <= lo || value >= hi {
        return Err(BvarError::InvalidMhOption {
            field,
            value,
            reason: "Value lies outside its admissible open interval.",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Hierarchical triples need a strictly interior mode; fixed ones do not.
    //
    // Given
    // -----
    // - (1, 1, 3): mode on the lower bound.
    //
    // Expect
    // ------
    // - Error when hierarchical, `Ok` when fixed.
    fn validate_hyper_bounds_requires_interior_mode_only_when_sampled() {
        // Arrange / Act
        let sampled = validate_hyper_bounds("alpha", 1.0, 1.0, 3.0, true);
        let fixed = validate_hyper_bounds("alpha", 1.0, 1.0, 3.0, false);

        // Assert
        assert!(matches!(sampled, Err(BvarError::InvalidHyperBounds { .. })));
        assert!(fixed.is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Inverted or non-positive bounds are rejected for any block.
    fn validate_hyper_bounds_rejects_inverted_and_non_positive_bounds() {
        assert!(validate_hyper_bounds("lambda", 5.0, 0.2, 1e-4, false).is_err());
        assert!(validate_hyper_bounds("lambda", 0.0, 0.2, 5.0, true).is_err());
        assert!(validate_hyper_bounds("lambda", 1e-4, 0.2, f64::INFINITY, true).is_err());
    }

    #[test]
    // Purpose
    // -------
    // The first non-finite entry is reported with its coordinates.
    fn validate_finite_matrix_reports_position() {
        let a = array![[1.0, 2.0], [f64::NEG_INFINITY, f64::NAN]];

        let err = validate_finite_matrix(&a).unwrap_err();

        assert!(matches!(err, BvarError::NonFiniteData { row: 1, col: 0, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Open-interval checks exclude the endpoints.
    fn validate_open_interval_excludes_endpoints() {
        assert!(validate_open_interval("adjust_burn", 0.75, 0.0, 1.0).is_ok());
        assert!(validate_open_interval("adjust_burn", 1.0, 0.0, 1.0).is_err());
        assert!(validate_positive("shape", -1.0).is_err());
    }
}
