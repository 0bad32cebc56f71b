//! Dense linear-algebra helpers shared by the evaluator, sampler and IRF code.
//!
//! Public containers are `ndarray`; decompositions (Cholesky, symmetric
//! eigen, QR) run on `nalgebra`. These helpers copy between the two and
//! wrap the few eigen-based repairs the estimator needs.
use crate::optimization::numerical_stability::EIGEN_EPS;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Copy an `ndarray` matrix into a new `DMatrix` (column-major writes).
pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    let (r, c) = a.dim();
    let mut out = DMatrix::<f64>::zeros(r, c);
    for j in 0..c {
        for i in 0..r {
            out[(i, j)] = a[[i, j]];
        }
    }
    out
}

/// Copy a `DMatrix` back into an `ndarray` matrix.
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

pub fn to_dvector(a: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(a.len(), a.iter().copied())
}

/// Replace `m` by `(m + mᵀ) / 2` in place.
pub fn symmetrize(m: &mut DMatrix<f64>) {
    let n = m.nrows();
    for j in 0..n {
        for i in (j + 1)..n {
            let avg = 0.5 * (m[(i, j)] + m[(j, i)]);
            m[(i, j)] = avg;
            m[(j, i)] = avg;
        }
    }
}

/// `Σ ln(1 + λ_i)` over the eigenvalues of a symmetric matrix.
///
/// Eigenvalues below [`EIGEN_EPS`] (including small negative ones from
/// round-off) are treated as zero before the shift.
pub fn sum_log_eig_plus_one(m: DMatrix<f64>) -> f64 {
    m.symmetric_eigen()
        .eigenvalues
        .iter()
        .map(|&l| if l < EIGEN_EPS { 0.0 } else { l })
        .map(|l| l.ln_1p())
        .sum()
}

/// Whether every eigenvalue of the symmetric matrix `m` is ≥ 0 up to
/// [`EIGEN_EPS`] relative to its largest magnitude.
pub fn is_psd(m: &DMatrix<f64>) -> bool {
    let eig = m.clone().symmetric_eigen().eigenvalues;
    let scale = eig.iter().fold(1.0_f64, |acc, l| acc.max(l.abs()));
    eig.iter().all(|&l| l >= -EIGEN_EPS * scale)
}

/// Rebuild a symmetric matrix from the absolute values of its eigenvalues,
/// `V |Λ| Vᵀ`. Identity on PSD input up to round-off.
pub fn abs_eigen_reconstruct(m: &DMatrix<f64>) -> DMatrix<f64> {
    let eig = m.clone().symmetric_eigen();
    let abs = eig.eigenvalues.map(f64::abs);
    let mut out = &eig.eigenvectors * DMatrix::from_diagonal(&abs) * eig.eigenvectors.transpose();
    symmetrize(&mut out);
    out
}

/// Square-root factor `S = V diag(√|λ|)` of a symmetric matrix, so that
/// `S Sᵀ = V |Λ| Vᵀ`.
pub fn eigen_sqrt_factor(m: &DMatrix<f64>) -> DMatrix<f64> {
    let eig = m.clone().symmetric_eigen();
    let roots = eig.eigenvalues.map(|l| l.abs().sqrt());
    eig.eigenvectors * DMatrix::from_diagonal(&roots)
}
