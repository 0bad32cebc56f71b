//! Companion form of a VAR(p) and its reduced-form moving-average weights.
//!
//! With coefficient rows `1 + (l−1)M .. 1 + lM` holding lag `l`, the lag
//! matrices are `A_l = beta[1+(l−1)M .. 1+lM, :]ᵀ` and the companion matrix
//! is
//!
//! ```text
//! C = | A_1  A_2  …  A_p |
//!     | I    0    …  0   |
//!     | 0    I    …  0   |
//!     | …             …  |
//! ```
//!
//! The response at step `h` is the top-left `M×M` block of `C^h`.
use crate::irf::errors::{IrfError, IrfResult};
use nalgebra::DMatrix;

/// Lag order implied by a `K×M` coefficient matrix, `K = 1 + M·p`.
///
/// # Errors
/// `IrfError::DimensionMismatch` if `K − 1` is not a positive multiple of `M`.
pub fn lag_order(n_coef: usize, n_vars: usize) -> IrfResult<usize> {
    if n_vars == 0 || n_coef <= 1 || (n_coef - 1) % n_vars != 0 {
        return Err(IrfError::DimensionMismatch {
            what: "coefficient rows (1 + M·lags)",
            expected: 1 + n_vars,
            found: n_coef,
        });
    }
    Ok((n_coef - 1) / n_vars)
}

/// `Mp × Mp` companion matrix of `beta` (intercept row ignored).
pub fn companion_matrix(beta: &DMatrix<f64>) -> IrfResult<DMatrix<f64>> {
    let m = beta.ncols();
    let lags = lag_order(beta.nrows(), m)?;
    let n = m * lags;
    let mut c = DMatrix::<f64>::zeros(n, n);
    for l in 0..lags {
        for i in 0..m {
            for j in 0..m {
                c[(i, l * m + j)] = beta[(1 + l * m + j, i)];
            }
        }
    }
    for r in 0..n - m {
        c[(m + r, r)] = 1.0;
    }
    Ok(c)
}

/// `Φ_0 … Φ_{horizon−1}`, with `Φ_0 = I`.
pub fn reduced_form_responses(
    beta: &DMatrix<f64>, horizon: usize,
) -> IrfResult<Vec<DMatrix<f64>>> {
    let m = beta.ncols();
    let c = companion_matrix(beta)?;
    let mut power = DMatrix::<f64>::identity(c.nrows(), c.ncols());
    let mut out = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        out.push(power.view((0, 0), (m, m)).into_owned());
        power = &c * power;
    }
    Ok(out)
}
