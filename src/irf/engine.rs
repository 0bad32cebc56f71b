//! engine — structural impulse responses and FEVD for one posterior draw.
//!
//! Purpose
//! -------
//! Turn one `(β, Σ)` draw into the `[M, horizon, M]` response tensor
//! (variable, step, shock) and, optionally, the matching variance
//! decomposition.
//!
//! Key behaviors
//! -------------
//! - `Θ_h = Φ_h P` with `P` the lower Cholesky factor of Σ.
//! - Sign restrictions search rotations `Q`: the identity first, then the
//!   `Q` factor of a Gaussian matrix with the signs of `R`'s diagonal folded
//!   in. `Θ_h Q` must match every non-zero sign for `h < sign_horizon`; a
//!   zero response never matches.
//! - `fevd[i, h, j] = Σ_{s≤h} Θ_s[i,j]² / Σ_{s≤h} Σ_k Θ_s[i,k]²`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rotations are orthogonal, so FEVD rows sum to one under either
//!   identification.
//! - The search is bounded by `max_attempts`.
use crate::irf::{
    companion::reduced_form_responses,
    errors::{IrfError, IrfResult},
    options::{Identification, IrfSpec},
};
use nalgebra::DMatrix;
use ndarray::{Array2, Array3};
use rand::Rng;
use rand_distr::StandardNormal;

/// Responses of one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    /// `irf[[i, h, j]]`: response of variable `i` at step `h` to shock `j`.
    pub irf: Array3<f64>,
    /// Same layout; shares over `j` sum to one.
    pub fevd: Option<Array3<f64>>,
}

/// Compute the identified responses for coefficients `beta` (`K×M`) and
/// covariance `sigma` (`M×M`).
///
/// # Errors
/// - `IrfError::DimensionMismatch` on inconsistent shapes.
/// - `IrfError::SigmaNotPositiveDefinite` if Σ has no Cholesky factor.
/// - `IrfError::SignMatrixShape` if the sign matrix is not `M×M`.
/// - `IrfError::SignSearchExhausted` if no rotation is accepted.
pub fn impulse_response<R: Rng + ?Sized>(
    beta: &Array2<f64>, sigma: &Array2<f64>, spec: &IrfSpec, rng: &mut R,
) -> IrfResult<ImpulseResponse> {
    let m = sigma.nrows();
    if sigma.ncols() != m {
        return Err(IrfError::DimensionMismatch {
            what: "sigma columns",
            expected: m,
            found: sigma.ncols(),
        });
    }
    if beta.ncols() != m {
        return Err(IrfError::DimensionMismatch {
            what: "beta columns",
            expected: m,
            found: beta.ncols(),
        });
    }
    let beta = DMatrix::from_fn(beta.nrows(), m, |i, j| beta[[i, j]]);
    let sigma = DMatrix::from_fn(m, m, |i, j| sigma[[i, j]]);
    let p = sigma.cholesky().ok_or(IrfError::SigmaNotPositiveDefinite)?.l();

    let thetas: Vec<DMatrix<f64>> =
        reduced_form_responses(&beta, spec.horizon)?.into_iter().map(|phi| phi * &p).collect();

    let thetas = match &spec.identification {
        Identification::Cholesky => thetas,
        Identification::SignRestriction(signs) => {
            if signs.dim() != (m, m) {
                return Err(IrfError::SignMatrixShape {
                    rows: signs.nrows(),
                    cols: signs.ncols(),
                    expected: m,
                });
            }
            let q = find_rotation(&thetas, signs, spec.sign_horizon, spec.max_attempts, rng)?;
            thetas.into_iter().map(|t| t * &q).collect()
        }
    };

    let irf = Array3::from_shape_fn((m, spec.horizon, m), |(i, h, j)| thetas[h][(i, j)]);
    let fevd = spec.fevd.then(|| variance_decomposition(&irf));
    Ok(ImpulseResponse { irf, fevd })
}

/// First rotation whose responses carry the required signs.
fn find_rotation<R: Rng + ?Sized>(
    thetas: &[DMatrix<f64>], signs: &Array2<f64>, sign_horizon: usize, max_attempts: usize,
    rng: &mut R,
) -> IrfResult<DMatrix<f64>> {
    let m = signs.nrows();
    for attempt in 0..max_attempts {
        let q = if attempt == 0 { DMatrix::identity(m, m) } else { random_rotation(m, rng) };
        if satisfies_signs(thetas, signs, sign_horizon, &q) {
            return Ok(q);
        }
    }
    Err(IrfError::SignSearchExhausted { attempts: max_attempts })
}

/// Haar-distributed orthogonal matrix: `Q` of a Gaussian matrix's QR with
/// columns flipped where `R` has a negative diagonal.
fn random_rotation<R: Rng + ?Sized>(m: usize, rng: &mut R) -> DMatrix<f64> {
    let g = DMatrix::<f64>::from_fn(m, m, |_, _| rng.sample(StandardNormal));
    let qr = g.qr();
    let r = qr.r();
    let mut q = qr.q();
    for j in 0..m {
        if r[(j, j)] < 0.0 {
            q.column_mut(j).neg_mut();
        }
    }
    q
}

fn satisfies_signs(
    thetas: &[DMatrix<f64>], signs: &Array2<f64>, sign_horizon: usize, q: &DMatrix<f64>,
) -> bool {
    thetas.iter().take(sign_horizon).all(|theta| {
        let rotated = theta * q;
        signs.indexed_iter().all(|((i, j), &s)| {
            let v = rotated[(i, j)];
            s == 0.0 || (s > 0.0 && v > 0.0) || (s < 0.0 && v < 0.0)
        })
    })
}

/// Cumulative squared responses normalised by their row totals.
fn variance_decomposition(irf: &Array3<f64>) -> Array3<f64> {
    let (m, horizon, shocks) = irf.dim();
    let mut out = Array3::<f64>::zeros((m, horizon, shocks));
    for i in 0..m {
        let mut cum = vec![0.0; shocks];
        for h in 0..horizon {
            for j in 0..shocks {
                cum[j] += irf[[i, h, j]] * irf[[i, h, j]];
            }
            let total: f64 = cum.iter().sum();
            for j in 0..shocks {
                out[[i, h, j]] = if total > 0.0 { cum[j] / total } else { 0.0 };
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Axis, array};
    use rand::{SeedableRng, rngs::StdRng};

    fn var1() -> (Array2<f64>, Array2<f64>) {
        let beta = array![[0.1, -0.2], [0.5, 0.2], [0.1, 0.4]];
        let sigma = array![[1.0, 0.3], [0.3, 0.5]];
        (beta, sigma)
    }

    #[test]
    // Purpose
    // -------
    // Cholesky identification puts the lower factor of Σ on impact and is
    // idempotent across calls.
    //
    // Given
    // -----
    // - VAR(1), M = 2, horizon 6.
    //
    // Expect
    // ------
    // - irf[:, 0, :] = chol(Σ); a second call returns the same tensor.
    fn cholesky_impact_is_lower_factor_and_idempotent() {
        // Arrange
        let (beta, sigma) = var1();
        let spec = IrfSpec::cholesky(6).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        // Act
        let a = impulse_response(&beta, &sigma, &spec, &mut rng).unwrap();
        let b = impulse_response(&beta, &sigma, &spec, &mut rng).unwrap();

        // Assert
        assert_relative_eq!(a.irf[[0, 0, 0]], 1.0);
        assert_relative_eq!(a.irf[[0, 0, 1]], 0.0);
        assert_relative_eq!(a.irf[[1, 0, 0]], 0.3, epsilon = 1e-12);
        assert_relative_eq!(a.irf[[1, 0, 1]], (0.5_f64 - 0.09).sqrt(), epsilon = 1e-12);
        assert_eq!(a, b);
        assert_eq!(a.irf.dim(), (2, 6, 2));
    }

    #[test]
    // Purpose
    // -------
    // FEVD shares sum to one across shocks at every variable and step.
    fn fevd_rows_sum_to_one() {
        // Arrange
        let (beta, sigma) = var1();
        let spec = IrfSpec::cholesky(10).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        // Act
        let out = impulse_response(&beta, &sigma, &spec, &mut rng).unwrap();

        // Assert
        let fevd = out.fevd.unwrap();
        for total in fevd.sum_axis(Axis(2)).iter() {
            assert_relative_eq!(*total, 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(fevd[[0, 0, 0]], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // With an all-zero restriction matrix the identity is accepted on the
    // first attempt, so the result equals Cholesky and the RNG is untouched.
    fn zero_restrictions_equal_cholesky() {
        // Arrange
        let (beta, sigma) = var1();
        let chol = IrfSpec::cholesky(5).unwrap();
        let signs = IrfSpec::sign_restricted(5, Array2::zeros((2, 2))).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut untouched = StdRng::seed_from_u64(3);

        // Act
        let a = impulse_response(&beta, &sigma, &chol, &mut rng).unwrap();
        let b = impulse_response(&beta, &sigma, &signs, &mut rng).unwrap();

        // Assert
        assert_eq!(a, b);
        assert_eq!(rng.random::<u64>(), untouched.random::<u64>());
    }

    #[test]
    // Purpose
    // -------
    // Signs the Cholesky impact already satisfies are accepted immediately;
    // signs that flip them require a rotation whose impact carries them.
    //
    // Given
    // -----
    // - Cholesky impact [[1, 0], [0.3, 0.64]].
    // - Restriction A: [[+, 0], [+, +]] (held by the identity).
    // - Restriction B: [[+, +], [-, +]] (needs a rotation).
    //
    // Expect
    // ------
    // - A equals Cholesky; B's impact matches every sign.
    fn sign_restrictions_are_enforced() {
        // Arrange
        let (beta, sigma) = var1();
        let held = IrfSpec::sign_restricted(4, array![[1.0, 0.0], [1.0, 1.0]]).unwrap();
        let needs_rotation = IrfSpec::sign_restricted(4, array![[1.0, 1.0], [-1.0, 1.0]]).unwrap();
        let chol = IrfSpec::cholesky(4).unwrap();
        let mut rng = StdRng::seed_from_u64(17);

        // Act
        let a = impulse_response(&beta, &sigma, &held, &mut rng).unwrap();
        let base = impulse_response(&beta, &sigma, &chol, &mut rng).unwrap();
        let b = impulse_response(&beta, &sigma, &needs_rotation, &mut rng).unwrap();

        // Assert
        assert_eq!(a.irf, base.irf);
        assert!(b.irf[[0, 0, 0]] > 0.0 && b.irf[[0, 0, 1]] > 0.0);
        assert!(b.irf[[1, 0, 0]] < 0.0 && b.irf[[1, 0, 1]] > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Unsatisfiable restrictions exhaust the capped search.
    //
    // Given
    // -----
    // - Σ = I, so the impact matrix is Q itself.
    // - Every entry required negative: two columns in the open negative
    //   quadrant have a positive dot product, so no orthogonal Q fits.
    // - Cap of 50 attempts.
    //
    // Expect
    // ------
    // - `SignSearchExhausted { attempts: 50 }`.
    fn impossible_restrictions_exhaust_search() {
        // Arrange
        let beta = array![[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]];
        let sigma = array![[1.0, 0.0], [0.0, 1.0]];
        let signs = array![[-1.0, -1.0], [-1.0, -1.0]];
        let spec = IrfSpec::new(3, Identification::SignRestriction(signs), false, 1, 50).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        // Act
        let res = impulse_response(&beta, &sigma, &spec, &mut rng);

        // Assert
        assert_eq!(res, Err(IrfError::SignSearchExhausted { attempts: 50 }));
    }

    #[test]
    // Purpose
    // -------
    // Random rotations are orthogonal.
    fn random_rotation_is_orthogonal() {
        let mut rng = StdRng::seed_from_u64(2);

        let q = random_rotation(4, &mut rng);

        let qtq = q.transpose() * &q;
        for i in 0..4 {
            for j in 0..4 {
                let e = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(qtq[(i, j)], e, epsilon = 1e-10);
            }
        }
    }
}
