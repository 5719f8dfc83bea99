use glam::{DMat3, DVec2, DVec3};

use crate::camera::CameraIntrinsics;
use crate::config::InitializerConfig;
use crate::correspondence::Correspondences;
use crate::error::RejectReason;
use crate::triangulation::{triangulate, ProjectionMatrix};

/// A relative pose hypothesis, `X_tar = R * X_ref + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseCandidate {
    /// Rotation from the reference to the target camera frame.
    pub rotation: DMat3,
    /// Unit translation direction from the reference to the target camera frame.
    pub translation: DVec3,
}

impl PoseCandidate {
    /// Create a pose hypothesis.
    pub fn new(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Center of the target camera expressed in the reference frame.
    pub fn target_center(&self) -> DVec3 {
        -(self.rotation.transpose() * self.translation)
    }
}

/// A triangulated correspondence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangulatedPoint {
    /// Index of the correspondence the point was triangulated from.
    pub index: usize,
    /// Position in the target camera frame.
    pub position: DVec3,
}

/// Result of checking one pose hypothesis against the inlier correspondences.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseCheck {
    /// Number of points passing every validity check.
    pub good_points: usize,
    /// Parallax of the reconstruction in degrees, measured at a fixed rank.
    pub parallax_deg: f64,
    /// The good points.
    pub points: Vec<TriangulatedPoint>,
}

/// Triangulate every inlier under `candidate` and keep the geometrically valid points.
///
/// A point is good when it is finite, lies in front of both cameras (unless
/// its parallax is nearly degenerate, see
/// [`InitializerConfig::degenerate_cos_parallax`]) and reprojects into both
/// images within [`InitializerConfig::reprojection_threshold`].
///
/// The returned parallax is taken at rank `min(good_points - 1, min_good_points)`
/// of the parallax angles sorted in decreasing order, so a few extreme points
/// cannot inflate it.
///
/// # Panics
///
/// Panics if `inliers` and `correspondences` have different lengths.
pub fn check_pose(
    candidate: &PoseCandidate,
    correspondences: &Correspondences,
    inliers: &[bool],
    intrinsics: &CameraIntrinsics,
    config: &InitializerConfig,
) -> PoseCheck {
    assert_eq!(correspondences.len(), inliers.len());

    let k = intrinsics.matrix();
    let p_ref = ProjectionMatrix::at_origin(&k);
    let p_tar = ProjectionMatrix::from_pose(&k, &candidate.rotation, candidate.translation);
    let tar_center = candidate.target_center();

    let mut cos_parallaxes = Vec::with_capacity(correspondences.len());
    let mut points = Vec::new();

    for (index, ((x_ref, x_tar), &is_inlier)) in correspondences.iter().zip(inliers).enumerate() {
        if !is_inlier {
            continue;
        }

        let Some(point_ref) = triangulate(x_ref, x_tar, &p_ref, &p_tar, &config.triangulation)
        else {
            continue;
        };

        let ray_tar = point_ref - tar_center;
        let cos_parallax = point_ref.dot(ray_tar) / (point_ref.length() * ray_tar.length());
        // a point on a camera center has no parallax
        if !point_ref.is_finite() || !cos_parallax.is_finite() {
            continue;
        }
        let skip_cheirality = cos_parallax >= config.degenerate_cos_parallax;

        if point_ref.z <= 0.0 && !skip_cheirality {
            continue;
        }
        let point_tar = candidate.rotation * point_ref + candidate.translation;
        if point_tar.z <= 0.0 && !skip_cheirality {
            continue;
        }

        if !reprojects_within(intrinsics, point_ref, x_ref, config.reprojection_threshold)
            || !reprojects_within(intrinsics, point_tar, x_tar, config.reprojection_threshold)
        {
            continue;
        }

        cos_parallaxes.push(cos_parallax);
        points.push(TriangulatedPoint {
            index,
            position: point_tar,
        });
    }

    PoseCheck {
        good_points: points.len(),
        parallax_deg: ranked_parallax_deg(&mut cos_parallaxes, config.min_good_points),
        points,
    }
}

fn reprojects_within(
    intrinsics: &CameraIntrinsics,
    point: DVec3,
    observed: DVec2,
    threshold: f64,
) -> bool {
    intrinsics
        .project(point)
        .is_some_and(|px| px.distance_squared(observed) <= threshold)
}

/// Parallax in degrees at `rank` of the cosines sorted in ascending order.
fn ranked_parallax_deg(cos_parallaxes: &mut [f64], rank: usize) -> f64 {
    if cos_parallaxes.is_empty() {
        return 0.0;
    }
    cos_parallaxes.sort_by(|a, b| a.total_cmp(b));
    let idx = rank.min(cos_parallaxes.len() - 1);
    cos_parallaxes[idx].clamp(-1.0, 1.0).acos().to_degrees()
}

/// Outcome of scoring a batch of pose hypotheses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateSelection {
    /// Index of the hypothesis with the most good points, if any has one.
    pub best_index: Option<usize>,
    /// Good points of the best hypothesis.
    pub good_points: usize,
    /// Sum of the good points over all hypotheses.
    pub total_good_points: usize,
    /// `good_points / total_good_points`, or 0 if the best hypothesis has
    /// fewer than `min_good_points`.
    pub normalized_score: f64,
    /// Parallax of the best hypothesis in degrees.
    pub parallax_deg: f64,
    /// Good points of the best hypothesis.
    pub points: Vec<TriangulatedPoint>,
}

/// Check every hypothesis and pick the one with the most good points.
///
/// Ties keep the earliest hypothesis. A low normalized score means several
/// hypotheses explain the data similarly well.
///
/// # Panics
///
/// Panics if `inliers` and `correspondences` have different lengths.
pub fn score_candidates(
    candidates: &[PoseCandidate],
    correspondences: &Correspondences,
    inliers: &[bool],
    intrinsics: &CameraIntrinsics,
    config: &InitializerConfig,
) -> CandidateSelection {
    let mut selection = CandidateSelection::default();

    for (i, candidate) in candidates.iter().enumerate() {
        let check = check_pose(candidate, correspondences, inliers, intrinsics, config);
        log::trace!(
            "pose hypothesis {i}: {} good points, parallax {:.3} deg",
            check.good_points,
            check.parallax_deg
        );

        selection.total_good_points += check.good_points;
        if check.good_points > selection.good_points {
            selection.best_index = Some(i);
            selection.good_points = check.good_points;
            selection.parallax_deg = check.parallax_deg;
            selection.points = check.points;
        }
    }

    if selection.good_points >= config.min_good_points && selection.total_good_points > 0 {
        selection.normalized_score =
            selection.good_points as f64 / selection.total_good_points as f64;
    }

    selection
}

/// The accepted pose of a reconstruction path.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseEstimate {
    /// Rotation from the reference to the target camera frame.
    pub rotation: DMat3,
    /// Unit translation direction from the reference to the target camera frame.
    pub translation: DVec3,
    /// Triangulated points, in the target camera frame.
    pub points: Vec<TriangulatedPoint>,
    /// Number of good points of the winning hypothesis.
    pub good_points: usize,
    /// Normalized triangulation score of the winning hypothesis.
    pub normalized_score: f64,
    /// Parallax of the reconstruction in degrees.
    pub parallax_deg: f64,
}

/// Score `candidates` and accept the winner only if it is well supported,
/// has enough parallax and is unambiguous, checked in that order.
pub(crate) fn select_pose(
    candidates: &[PoseCandidate],
    correspondences: &Correspondences,
    inliers: &[bool],
    intrinsics: &CameraIntrinsics,
    min_score: f64,
    config: &InitializerConfig,
) -> Result<PoseEstimate, RejectReason> {
    let selection = score_candidates(candidates, correspondences, inliers, intrinsics, config);

    let best = match selection.best_index {
        Some(idx) if selection.good_points >= config.min_good_points => candidates[idx],
        _ => {
            return Err(RejectReason::NotEnoughGoodPoints {
                good_points: selection.good_points,
                required: config.min_good_points,
            })
        }
    };
    // without parallax the hypotheses with opposite translations tie
    if !(selection.parallax_deg > config.min_parallax_deg) {
        return Err(RejectReason::InsufficientParallax {
            parallax_deg: selection.parallax_deg,
            min_parallax_deg: config.min_parallax_deg,
        });
    }
    if !(selection.normalized_score > min_score) {
        return Err(RejectReason::AmbiguousPose {
            score: selection.normalized_score,
            threshold: min_score,
        });
    }

    Ok(PoseEstimate {
        rotation: best.rotation,
        translation: best.translation,
        points: selection.points,
        good_points: selection.good_points,
        normalized_score: selection.normalized_score,
        parallax_deg: selection.parallax_deg,
    })
}
