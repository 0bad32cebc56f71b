//! Dummy-observation priors (sum-of-coefficients and single-unit-root).
//!
//! Both priors are implemented as artificial rows anchored on ȳ0, the
//! column means of the pre-sample block:
//!
//! - soc (tightness `mu`): `Y_d = diag(ȳ0)/mu`, `X_d = [0, Y_d, …, Y_d]`,
//!   M rows.
//! - sur (tightness `delta`): `Y_d = ȳ0ᵀ/delta`,
//!   `X_d = [1/delta, Y_d, …, Y_d]`, one row.
//!
//! soc rows come first, then sur.
use nalgebra::DMatrix;
use ndarray::Array1;

/// Stacked dummy rows, `n_d × M` and `n_d × K`.
#[derive(Debug, Clone, PartialEq)]
pub struct DummyObservations {
    pub y: DMatrix<f64>,
    pub x: DMatrix<f64>,
}

impl DummyObservations {
    pub fn n_rows(&self) -> usize {
        self.y.nrows()
    }
}

/// Build the active dummy rows, or `None` when neither prior is active.
pub fn dummy_observations(
    y0_mean: &Array1<f64>, lags: usize, soc: Option<f64>, sur: Option<f64>,
) -> Option<DummyObservations> {
    let m = y0_mean.len();
    let k = 1 + m * lags;
    let n_rows = soc.map_or(0, |_| m) + sur.map_or(0, |_| 1);
    if n_rows == 0 {
        return None;
    }
    let mut y = DMatrix::<f64>::zeros(n_rows, m);
    let mut x = DMatrix::<f64>::zeros(n_rows, k);
    let mut row = 0;
    if let Some(mu) = soc {
        for j in 0..m {
            let v = y0_mean[j] / mu;
            y[(row + j, j)] = v;
            for l in 0..lags {
                x[(row + j, 1 + l * m + j)] = v;
            }
        }
        row += m;
    }
    if let Some(delta) = sur {
        x[(row, 0)] = 1.0 / delta;
        for j in 0..m {
            let v = y0_mean[j] / delta;
            y[(row, j)] = v;
            for l in 0..lags {
                x[(row, 1 + l * m + j)] = v;
            }
        }
    }
    Some(DummyObservations { y, x })
}
