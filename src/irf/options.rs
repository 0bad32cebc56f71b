//! IRF configuration: horizon, identification scheme and sign search caps.
use crate::irf::errors::{IrfError, IrfResult};
use ndarray::Array2;

/// Default cap on candidate rotations per draw.
pub const DEFAULT_SIGN_MAX_ATTEMPTS: usize = 10_000;

/// How structural shocks are identified.
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    /// Lower Cholesky factor of Σ (recursive ordering).
    Cholesky,
    /// `M×M` matrix of -1 / 0 / +1: the required sign of the response of
    /// variable `i` (row) to shock `j` (column); 0 leaves it free.
    SignRestriction(Array2<f64>),
}

/// Validated IRF settings.
#[derive(Debug, Clone, PartialEq)]
pub struct IrfSpec {
    pub horizon: usize,
    pub identification: Identification,
    /// Also compute the forecast-error variance decomposition.
    pub fevd: bool,
    /// Number of leading horizons (starting at impact) the signs must hold at.
    pub sign_horizon: usize,
    pub max_attempts: usize,
}

impl IrfSpec {
    /// # Errors
    /// - `IrfError::InvalidHorizon` if `horizon == 0`.
    /// - `IrfError::InvalidSignEntry` for a sign entry other than -1, 0, +1.
    /// - `IrfError::SignMatrixShape` if the sign matrix is not square.
    /// - `IrfError::InvalidSignHorizon` unless `1 ≤ sign_horizon ≤ horizon`.
    /// - `IrfError::InvalidMaxAttempts` if `max_attempts == 0`.
    pub fn new(
        horizon: usize, identification: Identification, fevd: bool, sign_horizon: usize,
        max_attempts: usize,
    ) -> IrfResult<Self> {
        if horizon == 0 {
            return Err(IrfError::InvalidHorizon { horizon });
        }
        if let Identification::SignRestriction(signs) = &identification {
            let (rows, cols) = signs.dim();
            if rows != cols || rows == 0 {
                return Err(IrfError::SignMatrixShape { rows, cols, expected: rows.max(cols) });
            }
            for ((row, col), &value) in signs.indexed_iter() {
                if value != -1.0 && value != 0.0 && value != 1.0 {
                    return Err(IrfError::InvalidSignEntry { row, col, value });
                }
            }
            if sign_horizon == 0 || sign_horizon > horizon {
                return Err(IrfError::InvalidSignHorizon { sign_horizon, horizon });
            }
            if max_attempts == 0 {
                return Err(IrfError::InvalidMaxAttempts);
            }
        }
        Ok(Self { horizon, identification, fevd, sign_horizon, max_attempts })
    }

    /// Recursive identification, FEVD on.
    pub fn cholesky(horizon: usize) -> IrfResult<Self> {
        Self::new(horizon, Identification::Cholesky, true, 1, DEFAULT_SIGN_MAX_ATTEMPTS)
    }

    /// Sign restrictions imposed on impact only, FEVD on.
    pub fn sign_restricted(horizon: usize, signs: Array2<f64>) -> IrfResult<Self> {
        Self::new(
            horizon,
            Identification::SignRestriction(signs),
            true,
            1,
            DEFAULT_SIGN_MAX_ATTEMPTS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Sign matrices are checked for shape, entries and restricted horizons.
    //
    // Given
    // -----
    // - A 2×3 matrix, an entry of 0.5, a restricted horizon beyond the IRF
    //   horizon.
    //
    // Expect
    // ------
    // - The matching error variant for each.
    fn sign_restriction_config_is_validated() {
        // Arrange
        let ok = array![[1.0, 0.0], [-1.0, 1.0]];

        // Act
        let shape = IrfSpec::sign_restricted(8, Array2::zeros((2, 3)));
        let entry = IrfSpec::sign_restricted(8, array![[0.5, 0.0], [0.0, 1.0]]);
        let horizon =
            IrfSpec::new(4, Identification::SignRestriction(ok.clone()), false, 5, 100);
        let good = IrfSpec::sign_restricted(8, ok);

        // Assert
        assert!(matches!(shape, Err(IrfError::SignMatrixShape { rows: 2, cols: 3, .. })));
        assert!(matches!(entry, Err(IrfError::InvalidSignEntry { row: 0, col: 0, .. })));
        assert_eq!(horizon, Err(IrfError::InvalidSignHorizon { sign_horizon: 5, horizon: 4 }));
        assert!(good.is_ok());
    }

    #[test]
    // Purpose
    // -------
    // A zero horizon is rejected for every identification scheme.
    //
    // Given
    // -----
    // - Horizon 0 with Cholesky and with a valid 2×2 sign matrix.
    //
    // Expect
    // ------
    // - `IrfError::InvalidHorizon { horizon: 0 }` from both constructors.
    fn zero_horizon_is_rejected() {
        // Arrange
        let signs = array![[1.0, 0.0], [0.0, 1.0]];

        // Act
        let cholesky = IrfSpec::cholesky(0);
        let signed = IrfSpec::sign_restricted(0, signs);

        // Assert
        assert_eq!(cholesky, Err(IrfError::InvalidHorizon { horizon: 0 }));
        assert_eq!(signed, Err(IrfError::InvalidHorizon { horizon: 0 }));
    }
}
