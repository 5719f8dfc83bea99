use glam::{DMat3, DVec2};

use super::{check_input, mat3_from_row_major, normalize_points, run_ransac};
use super::{RansacParams, RansacResult};
use crate::correspondence::Correspondences;
use crate::error::EstimationError;
use crate::linalg;

/// Estimate the homography `x_tar ~ H x_ref` with the normalized DLT.
///
/// Accepts four or more correspondences; with more than four the algebraic
/// error is minimized in the least-squares sense. The result is scaled so that
/// `H[2][2] = 1` whenever that entry is not vanishing.
pub fn homography_dlt(x_ref: &[DVec2], x_tar: &[DVec2]) -> Result<DMat3, EstimationError> {
    check_input(x_ref, x_tar, 4)?;

    let (n_ref, t_ref) = normalize_points(x_ref);
    let (n_tar, t_tar) = normalize_points(x_tar);

    // construct matrix A
    let mut mat_a = faer::Mat::<f64>::zeros(2 * n_ref.len(), 9);
    for (i, (p, q)) in n_ref.iter().zip(&n_tar).enumerate() {
        mat_a.write(2 * i, 0, p.x);
        mat_a.write(2 * i, 1, p.y);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -q.x * p.x);
        mat_a.write(2 * i, 7, -q.x * p.y);
        mat_a.write(2 * i, 8, -q.x);

        mat_a.write(2 * i + 1, 3, p.x);
        mat_a.write(2 * i + 1, 4, p.y);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -q.y * p.x);
        mat_a.write(2 * i + 1, 7, -q.y * p.y);
        mat_a.write(2 * i + 1, 8, -q.y);
    }

    let h_norm = mat3_from_row_major(&linalg::null_vector(&mat_a));
    if !h_norm.is_finite() || h_norm.determinant().abs() < 1e-8 {
        return Err(EstimationError::Degenerate);
    }

    // denormalize: H = T_tar^-1 * H_n * T_ref
    let h = t_tar.inverse() * h_norm * t_ref;
    let h33 = h.z_axis.z;
    let h = if h33.abs() > f64::EPSILON { h * (1.0 / h33) } else { h };
    if !h.is_finite() {
        return Err(EstimationError::Degenerate);
    }
    Ok(h)
}

/// Squared distance between `x_tar` and the transfer of `x_ref` by `h`.
pub fn homography_transfer_error(h: &DMat3, x_ref: DVec2, x_tar: DVec2) -> f64 {
    let hx = *h * x_ref.extend(1.0);
    if hx.z.abs() < 1e-12 {
        return f64::INFINITY;
    }
    DVec2::new(hx.x / hx.z, hx.y / hx.z).distance_squared(x_tar)
}

/// Estimate a homography with RANSAC using the 4-point solver.
pub fn ransac_homography(
    correspondences: &Correspondences,
    params: &RansacParams,
) -> Result<RansacResult<DMat3>, EstimationError> {
    run_ransac(
        correspondences,
        4,
        params,
        homography_dlt,
        homography_transfer_error,
    )
}
