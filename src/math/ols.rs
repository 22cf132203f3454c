//! Least squares solver for the seasonal regression.
//!
//! Training reduces to one ordinary least squares problem:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! where the design matrix rows hold the trend, the weekly/yearly Fourier
//! terms, and the weather regressors.
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when the
//!   design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Fourier columns over a short sales history can come out nearly
//!   collinear, so we try progressively looser tolerances before giving up.
//! - The parameter dimension is tiny (≤ 14 columns), so SVD performance is a
//!   non-issue for daily ledgers.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
