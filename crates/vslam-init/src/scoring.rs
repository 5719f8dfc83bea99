//! Inlier classification and scoring of the two competing two-view models.
//!
//! Both checks evaluate each correspondence in both transfer directions. An
//! error is normalized by the measurement noise into a chi-square statistic;
//! every accepted direction adds `threshold - chi_square` to the model score,
//! and a correspondence is an inlier only when both directions are accepted.
//! Index alignment of the inputs is guaranteed by [`Correspondences`].

use glam::{DMat3, DVec2};

use crate::config::ScoringParams;
use crate::correspondence::Correspondences;

/// Per-correspondence inlier mask and aggregate score of a model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelScore {
    /// Per-point inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
    /// Aggregate score (higher is better).
    pub score: f64,
}

impl ModelScore {
    fn with_capacity(n: usize) -> Self {
        Self {
            inliers: Vec::with_capacity(n),
            inlier_count: 0,
            score: 0.0,
        }
    }

    fn push(&mut self, is_inlier: bool) {
        self.inliers.push(is_inlier);
        if is_inlier {
            self.inlier_count += 1;
        }
    }
}

/// Score a homography mapping reference pixels to target pixels.
///
/// Both the reference-to-target transfer (through `h_ref2tar`) and the
/// target-to-reference transfer (through its inverse, computed once) are
/// checked against `params.homography_threshold`.
pub fn check_homography(
    correspondences: &Correspondences,
    h_ref2tar: &DMat3,
    params: &ScoringParams,
) -> ModelScore {
    let h_tar2ref = h_ref2tar.inverse();
    let inv_sigma_sq = 1.0 / (params.sigma * params.sigma);
    let threshold = params.homography_threshold;

    let mut result = ModelScore::with_capacity(correspondences.len());
    for (x_ref, x_tar) in correspondences.iter() {
        let mut is_inlier = true;

        // NOTE: comparisons are written so that a NaN statistic is rejected.
        let chi_ref = transfer_error(&h_tar2ref, x_tar, x_ref) * inv_sigma_sq;
        if chi_ref <= threshold {
            result.score += threshold - chi_ref;
        } else {
            is_inlier = false;
        }

        let chi_tar = transfer_error(h_ref2tar, x_ref, x_tar) * inv_sigma_sq;
        if chi_tar <= threshold {
            result.score += threshold - chi_tar;
        } else {
            is_inlier = false;
        }

        result.push(is_inlier);
    }

    result
}

/// Score a fundamental matrix satisfying `x_tar^T * F * x_ref = 0`.
///
/// For each direction the squared point-to-epipolar-line distance
/// `(x_tar^T F x_ref)^2 / (l_0^2 + l_1^2)` is used, with `l = F x_ref` in the
/// target image and `l = F^T x_tar` in the reference image.
pub fn check_fundamental(
    correspondences: &Correspondences,
    f: &DMat3,
    params: &ScoringParams,
) -> ModelScore {
    let f_t = f.transpose();
    let inv_sigma_sq = 1.0 / (params.sigma * params.sigma);
    let threshold = params.fundamental_threshold;
    let score_offset = params.fundamental_score;

    let mut result = ModelScore::with_capacity(correspondences.len());
    for (x_ref, x_tar) in correspondences.iter() {
        let mut is_inlier = true;

        let x_ref_h = x_ref.extend(1.0);
        let x_tar_h = x_tar.extend(1.0);
        let line_tar = *f * x_ref_h;
        let line_ref = f_t * x_tar_h;
        let residual = x_tar_h.dot(line_tar);
        let residual_sq = residual * residual;

        let chi_tar = residual_sq / (line_tar.x * line_tar.x + line_tar.y * line_tar.y)
            * inv_sigma_sq;
        if chi_tar <= threshold {
            result.score += score_offset - chi_tar;
        } else {
            is_inlier = false;
        }

        let chi_ref = residual_sq / (line_ref.x * line_ref.x + line_ref.y * line_ref.y)
            * inv_sigma_sq;
        if chi_ref <= threshold {
            result.score += score_offset - chi_ref;
        } else {
            is_inlier = false;
        }

        result.push(is_inlier);
    }

    result
}

/// Squared distance between `to` and the projective transfer of `from` by `h`.
fn transfer_error(h: &DMat3, from: DVec2, to: DVec2) -> f64 {
    let p = *h * from.extend(1.0);
    if p.z == 0.0 {
        return f64::INFINITY;
    }
    let projected = DVec2::new(p.x / p.z, p.y / p.z);
    projected.distance_squared(to)
}
