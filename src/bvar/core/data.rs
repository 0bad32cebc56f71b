//! VAR data containers.
//!
//! Purpose
//! -------
//! Hold the regression form of a VAR(p): responses `Y` (T×M), regressors
//! `X` (T×K, intercept then lag blocks), the cross product `XX = XᵀX`, and
//! the pre-sample block `Y0` (first `lags` rows of the levels) used by the
//! dummy-observation priors.
//!
//! Key behaviors
//! -------------
//! - [`Dataset::from_levels`] builds every piece from a levels matrix.
//! - [`Dataset::new`] accepts prebuilt matrices and checks their shapes.
//! - [`Dataset::ar_residual_variances`] gives the per-variable AR(p)
//!   residual variances used as default psi modes.
//!
//! Invariants & assumptions
//! ------------------------
//! - `lags ≥ 1`, `T ≥ 1`, `M ≥ 1`, `K = 1 + M·lags`.
//! - Column `1 + (l−1)·M + j` of `X` is variable `j` lagged `l` periods.
//! - Every entry is finite. The container is immutable after construction.
use crate::bvar::{
    core::{
        linalg::{to_dmatrix, to_dvector},
        validation::validate_finite_matrix,
    },
    errors::{BvarError, BvarResult},
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis, s};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    y: Array2<f64>,
    x: Array2<f64>,
    xx: Array2<f64>,
    y0: Array2<f64>,
    lags: usize,
}

impl Dataset {
    /// Construct from prebuilt regression matrices.
    ///
    /// Parameters
    /// ----------
    /// - `y`: `T×M` responses.
    /// - `x`: `T×K` regressors with `K = 1 + M·lags`, intercept first.
    /// - `y0`: `lags×M` pre-sample levels.
    /// - `lags`: lag order `p ≥ 1`.
    ///
    /// Errors
    /// ------
    /// - `BvarError::InvalidLags` if `lags == 0`.
    /// - `BvarError::EmptyData` if `y` has no rows or columns.
    /// - `BvarError::DimensionMismatch` for any shape disagreement.
    /// - `BvarError::NonFiniteData` for the first non-finite entry.
    pub fn new(y: Array2<f64>, x: Array2<f64>, y0: Array2<f64>, lags: usize) -> BvarResult<Self> {
        if lags == 0 {
            return Err(BvarError::InvalidLags { lags, reason: "Lag order must be at least 1." });
        }
        let (t, m) = y.dim();
        if t == 0 || m == 0 {
            return Err(BvarError::EmptyData);
        }
        let k = 1 + m * lags;
        check_dim("X rows", t, x.nrows())?;
        check_dim("X columns", k, x.ncols())?;
        check_dim("Y0 rows", lags, y0.nrows())?;
        check_dim("Y0 columns", m, y0.ncols())?;
        validate_finite_matrix(&y)?;
        validate_finite_matrix(&x)?;
        validate_finite_matrix(&y0)?;
        let xx = x.t().dot(&x);
        Ok(Self { y, x, xx, y0, lags })
    }

    /// Build `Y`, `X` and `Y0` from a `T×M` levels matrix.
    ///
    /// Row `t` of `X` (for `t = lags..T`) is
    /// `[1, levels[t−1], levels[t−2], …, levels[t−lags]]`.
    ///
    /// Errors
    /// ------
    /// - `BvarError::InvalidLags`, `BvarError::EmptyData`,
    ///   `BvarError::NonFiniteData` as in [`Dataset::new`].
    /// - `BvarError::InsufficientObservations` if `T ≤ lags`.
    pub fn from_levels(levels: &Array2<f64>, lags: usize) -> BvarResult<Self> {
        if lags == 0 {
            return Err(BvarError::InvalidLags { lags, reason: "Lag order must be at least 1." });
        }
        let (t_total, m) = levels.dim();
        if t_total == 0 || m == 0 {
            return Err(BvarError::EmptyData);
        }
        if t_total <= lags {
            return Err(BvarError::InsufficientObservations { n_obs: t_total, lags });
        }
        validate_finite_matrix(levels)?;

        let t = t_total - lags;
        let y = levels.slice(s![lags.., ..]).to_owned();
        let mut x = Array2::<f64>::zeros((t, 1 + m * lags));
        x.column_mut(0).fill(1.0);
        for l in 1..=lags {
            let start = 1 + (l - 1) * m;
            x.slice_mut(s![.., start..start + m])
                .assign(&levels.slice(s![lags - l..t_total - l, ..]));
        }
        let y0 = levels.slice(s![..lags, ..]).to_owned();
        Self::new(y, x, y0, lags)
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn xx(&self) -> &Array2<f64> {
        &self.xx
    }

    pub fn y0(&self) -> &Array2<f64> {
        &self.y0
    }

    pub fn lags(&self) -> usize {
        self.lags
    }

    /// Number of regression observations `T`.
    pub fn n_obs(&self) -> usize {
        self.y.nrows()
    }

    /// Number of variables `M`.
    pub fn n_vars(&self) -> usize {
        self.y.ncols()
    }

    /// Number of coefficients per equation `K = 1 + M·lags`.
    pub fn n_coef(&self) -> usize {
        self.x.ncols()
    }

    /// Column means of `Y0` (ȳ0), the anchor of the dummy priors.
    pub fn y0_mean(&self) -> Array1<f64> {
        self.y0.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(self.n_vars()))
    }

    /// Residual variance of a univariate AR(lags) with intercept, fitted by
    /// OLS to each variable on its own lags.
    ///
    /// Uses `e'e / (T − (1 + lags))` when `T > 1 + lags`, else `e'e / T`.
    /// A singular regressor block falls back to the sample variance of the
    /// response.
    pub fn ar_residual_variances(&self) -> Array1<f64> {
        let (t, m) = self.y.dim();
        let k = 1 + self.lags;
        let mut out = Array1::<f64>::zeros(m);
        for j in 0..m {
            let mut z = Array2::<f64>::zeros((t, k));
            z.column_mut(0).fill(1.0);
            for l in 1..=self.lags {
                z.column_mut(l).assign(&self.x.column(1 + (l - 1) * m + j));
            }
            let yj = self.y.column(j).to_owned();
            let zd = to_dmatrix(&z);
            let yd = to_dvector(&yj);
            let ztz: DMatrix<f64> = zd.transpose() * &zd;
            let zty = zd.transpose() * &yd;
            let ssr = match ztz.cholesky() {
                Some(chol) => {
                    let coef = chol.solve(&zty);
                    let resid = &yd - &zd * coef;
                    resid.dot(&resid)
                }
                None => {
                    let mean = yj.mean().unwrap_or(0.0);
                    yj.mapv(|v| (v - mean).powi(2)).sum()
                }
            };
            let dof = if t > k { t - k } else { t };
            out[j] = ssr / dof as f64;
        }
        out
    }
}

fn check_dim(what: &'static str, expected: usize, found: usize) -> BvarResult<()> {
    if expected != found {
        return Err(BvarError::DimensionMismatch { what, expected, found });
    }
    Ok(())
}
