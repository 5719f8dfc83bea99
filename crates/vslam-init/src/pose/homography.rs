use glam::{DMat3, DVec3};

use super::candidates::{select_pose, PoseCandidate, PoseEstimate};
use crate::camera::CameraIntrinsics;
use crate::config::InitializerConfig;
use crate::correspondence::Correspondences;
use crate::error::RejectReason;
use crate::linalg::svd3;

/// A pose hypothesis recovered from a homography, with the normal of the
/// induced plane in the reference frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HomographyCandidate {
    /// The relative pose.
    pub pose: PoseCandidate,
    /// Unit normal of the scene plane, facing the reference camera (`z >= 0`).
    pub normal: DVec3,
}

/// Check that the singular values of a normalized homography can be decomposed.
///
/// They must be sorted in descending order. Two of them may coincide, as for
/// a camera moving along the normal of the plane, but not all three: the
/// spread `d1 - d3` must exceed `tolerance * d1`.
pub fn check_singular_values(d: DVec3, tolerance: f64) -> Result<(), RejectReason> {
    let (d1, d2, d3) = (d.x, d.y, d.z);
    if !(d1 >= d2 && d2 >= d3) {
        return Err(RejectReason::UnorderedSingularValues { d1, d2, d3 });
    }
    if !d.is_finite() || d2 <= 0.0 || d1 - d3 <= tolerance * d1 {
        return Err(RejectReason::DegenerateSingularValues { d1, d2, d3 });
    }
    Ok(())
}

/// Decompose a pixel homography into its eight motion and structure hypotheses.
///
/// `h` maps reference pixels to target pixels. The first four hypotheses
/// assume a plane distance `d' > 0`, the last four `d' < 0`. `tolerance` is
/// the relative singular value spread below which the motion is a pure
/// rotation, see [`check_singular_values`].
///
/// Reference: Faugeras & Lustman, "Motion and structure from motion in a
/// piecewise planar environment", 1988.
pub fn decompose_homography(
    h: &DMat3,
    intrinsics: &CameraIntrinsics,
    tolerance: f64,
) -> Result<Vec<HomographyCandidate>, RejectReason> {
    let a = intrinsics.inverse_matrix() * *h * intrinsics.matrix();
    let svd = svd3(&a);
    let (u, v) = (svd.u, svd.v);
    let vt = v.transpose();
    let s = u.determinant() * v.determinant();

    check_singular_values(svd.singular_values, tolerance)?;
    let DVec3 {
        x: d1,
        y: d2,
        z: d3,
    } = svd.singular_values;
    let (d1_sq, d2_sq, d3_sq) = (d1 * d1, d2 * d2, d3 * d3);

    let aux1 = ((d1_sq - d2_sq) / (d1_sq - d3_sq)).sqrt();
    let aux3 = ((d2_sq - d3_sq) / (d1_sq - d3_sq)).sqrt();
    let x1 = [aux1, aux1, -aux1, -aux1];
    let x3 = [aux3, -aux3, aux3, -aux3];
    let cross = ((d1_sq - d2_sq) * (d2_sq - d3_sq)).sqrt();

    let mut candidates = Vec::with_capacity(8);

    // d' > 0
    let aux_stheta = cross / ((d1 + d3) * d2);
    let ctheta = (d2_sq + d1 * d3) / ((d1 + d3) * d2);
    let stheta = [aux_stheta, -aux_stheta, -aux_stheta, aux_stheta];
    for i in 0..4 {
        let rp = DMat3::from_cols(
            DVec3::new(ctheta, 0.0, stheta[i]),
            DVec3::Y,
            DVec3::new(-stheta[i], 0.0, ctheta),
        );
        let tp = DVec3::new(x1[i], 0.0, -x3[i]) * (d1 - d3);
        let np = DVec3::new(x1[i], 0.0, x3[i]);
        candidates.push(candidate(u * rp * vt * s, u * tp, v * np));
    }

    // d' < 0
    let aux_sphi = cross / ((d1 - d3) * d2);
    let cphi = (d1 * d3 - d2_sq) / ((d1 - d3) * d2);
    let sphi = [aux_sphi, -aux_sphi, -aux_sphi, aux_sphi];
    for i in 0..4 {
        let rp = DMat3::from_cols(
            DVec3::new(cphi, 0.0, sphi[i]),
            DVec3::NEG_Y,
            DVec3::new(sphi[i], 0.0, -cphi),
        );
        let tp = DVec3::new(x1[i], 0.0, x3[i]) * (d1 + d3);
        let np = DVec3::new(x1[i], 0.0, x3[i]);
        candidates.push(candidate(u * rp * vt * s, u * tp, v * np));
    }

    Ok(candidates)
}

fn candidate(rotation: DMat3, translation: DVec3, normal: DVec3) -> HomographyCandidate {
    let normal = if normal.z < 0.0 { -normal } else { normal };
    HomographyCandidate {
        pose: PoseCandidate::new(rotation, translation.normalize()),
        normal,
    }
}

/// Recover the relative pose and the initial structure from a homography.
///
/// Accepts the winning hypothesis only if its normalized score exceeds
/// [`InitializerConfig::min_homography_score`]. The twofold ambiguity of a
/// planar scene usually leaves a second hypothesis with most of the points,
/// which is why that threshold is lower than the fundamental one.
///
/// # Panics
///
/// Panics if `inliers` and `correspondences` have different lengths.
pub fn reconstruct_homography(
    h: &DMat3,
    correspondences: &Correspondences,
    inliers: &[bool],
    intrinsics: &CameraIntrinsics,
    config: &InitializerConfig,
) -> Result<PoseEstimate, RejectReason> {
    let candidates: Vec<PoseCandidate> = decompose_homography(h, intrinsics, config.singular_value_tolerance)?
        .into_iter()
        .map(|c| c.pose)
        .collect();
    select_pose(
        &candidates,
        correspondences,
        inliers,
        intrinsics,
        config.min_homography_score,
        config,
    )
}
