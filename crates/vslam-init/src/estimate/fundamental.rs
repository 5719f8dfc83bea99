use glam::{DMat3, DVec2, DVec3};

use super::{check_input, mat3_from_row_major, normalize_points, run_ransac};
use super::{RansacParams, RansacResult};
use crate::correspondence::Correspondences;
use crate::error::EstimationError;
use crate::linalg::{self, svd3};

/// Estimate the fundamental matrix using the normalized 8-point algorithm.
///
/// The result satisfies `x_tar^T F x_ref = 0`, has rank 2 and unit Frobenius norm.
pub fn fundamental_8point(x_ref: &[DVec2], x_tar: &[DVec2]) -> Result<DMat3, EstimationError> {
    check_input(x_ref, x_tar, 8)?;

    // Normalize points with similarity transforms to have zero mean and avg sqrt(2) distance
    let (n_ref, t_ref) = normalize_points(x_ref);
    let (n_tar, t_tar) = normalize_points(x_tar);

    // Build design matrix A (N x 9) for x_tar^T * F * x_ref = 0
    let mut a = faer::Mat::<f64>::zeros(n_ref.len(), 9);
    for (i, (p, q)) in n_ref.iter().zip(&n_tar).enumerate() {
        a.write(i, 0, q.x * p.x);
        a.write(i, 1, q.x * p.y);
        a.write(i, 2, q.x);
        a.write(i, 3, q.y * p.x);
        a.write(i, 4, q.y * p.y);
        a.write(i, 5, q.y);
        a.write(i, 6, p.x);
        a.write(i, 7, p.y);
        a.write(i, 8, 1.0);
    }

    let f_norm = mat3_from_row_major(&linalg::null_vector(&a));
    if !f_norm.is_finite() {
        return Err(EstimationError::Degenerate);
    }

    // Enforce rank-2 constraint on F by zeroing the smallest singular value
    let svd = svd3(&f_norm);
    let s = svd.singular_values;
    let f_rank2 = svd.u * DMat3::from_diagonal(DVec3::new(s.x, s.y, 0.0)) * svd.v.transpose();

    // Denormalize: F = T_tar^T * F * T_ref
    let f = t_tar.transpose() * f_rank2 * t_ref;
    let norm = frobenius_norm(&f);
    if !(norm > f64::EPSILON) {
        return Err(EstimationError::Degenerate);
    }
    Ok(f * (1.0 / norm))
}

fn frobenius_norm(m: &DMat3) -> f64 {
    (m.x_axis.length_squared() + m.y_axis.length_squared() + m.z_axis.length_squared()).sqrt()
}

/// Sampson approximation of the squared geometric epipolar error.
pub fn sampson_distance(f: &DMat3, x_ref: DVec2, x_tar: DVec2) -> f64 {
    let p = x_ref.extend(1.0);
    let q = x_tar.extend(1.0);
    let fp = *f * p;
    let ftq = f.transpose() * q;
    let num = q.dot(fp);
    let denom = fp.x * fp.x + fp.y * fp.y + ftq.x * ftq.x + ftq.y * ftq.y;
    if !(denom > 0.0) {
        return f64::INFINITY;
    }
    num * num / denom
}

/// Estimate a fundamental matrix with RANSAC using the 8-point solver.
pub fn ransac_fundamental(
    correspondences: &Correspondences,
    params: &RansacParams,
) -> Result<RansacResult<DMat3>, EstimationError> {
    run_ransac(
        correspondences,
        8,
        params,
        fundamental_8point,
        sampson_distance,
    )
}
