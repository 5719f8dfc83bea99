use glam::{DMat3, DVec3};

use super::candidates::{select_pose, PoseCandidate, PoseEstimate};
use crate::camera::CameraIntrinsics;
use crate::config::InitializerConfig;
use crate::correspondence::Correspondences;
use crate::error::RejectReason;
use crate::linalg::svd3;

/// Essential matrix `E = K^T F K` of a pixel fundamental matrix.
pub fn essential_from_fundamental(f: &DMat3, intrinsics: &CameraIntrinsics) -> DMat3 {
    let k = intrinsics.matrix();
    k.transpose() * *f * k
}

/// Decompose an essential matrix into its four pose hypotheses.
///
/// The hypotheses are ordered `(R1, t)`, `(R2, t)`, `(R1, -t)`, `(R2, -t)`
/// with `R1 = U W V^T` and `R2 = U W^T V^T`, each negated if needed to be a
/// proper rotation. `t` is the unit left null vector of `E`.
pub fn decompose_essential(e: &DMat3) -> [PoseCandidate; 4] {
    let svd = svd3(e);
    let t = svd.u.z_axis.normalize_or_zero();

    let w = DMat3::from_cols(DVec3::Y, DVec3::NEG_X, DVec3::Z);
    let vt = svd.v.transpose();

    let proper = |r: DMat3| if r.determinant() < 0.0 { r * -1.0 } else { r };
    let r1 = proper(svd.u * w * vt);
    let r2 = proper(svd.u * w.transpose() * vt);

    [
        PoseCandidate::new(r1, t),
        PoseCandidate::new(r2, t),
        PoseCandidate::new(r1, -t),
        PoseCandidate::new(r2, -t),
    ]
}

/// Recover the relative pose and the initial structure from a fundamental matrix.
///
/// Accepts the winning hypothesis only if its normalized score exceeds
/// [`InitializerConfig::min_fundamental_score`].
///
/// # Panics
///
/// Panics if `inliers` and `correspondences` have different lengths.
pub fn reconstruct_fundamental(
    f: &DMat3,
    correspondences: &Correspondences,
    inliers: &[bool],
    intrinsics: &CameraIntrinsics,
    config: &InitializerConfig,
) -> Result<PoseEstimate, RejectReason> {
    let e = essential_from_fundamental(f, intrinsics);
    let candidates = decompose_essential(&e);
    select_pose(
        &candidates,
        correspondences,
        inliers,
        intrinsics,
        config.min_fundamental_score,
        config,
    )
}
