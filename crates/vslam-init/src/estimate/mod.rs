//! Robust estimation of the homography and fundamental matrix hypotheses.
//!
//! The initializer only needs a 3x3 matrix per model and recomputes its own
//! inlier sets, so any estimator can be plugged in through [`ModelEstimator`].
//! [`RansacEstimator`] is the bundled implementation.

mod fundamental;
pub use fundamental::*;

mod homography;
pub use homography::*;

use glam::{DMat3, DVec2, DVec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::correspondence::Correspondences;
use crate::error::EstimationError;

/// Estimates the two competing models from the same correspondences.
pub trait ModelEstimator {
    /// Estimate the homography mapping reference pixels to target pixels.
    fn estimate_homography(
        &mut self,
        correspondences: &Correspondences,
    ) -> Result<DMat3, EstimationError>;

    /// Estimate the fundamental matrix with `x_tar^T F x_ref = 0`.
    fn estimate_fundamental(
        &mut self,
        correspondences: &Correspondences,
    ) -> Result<DMat3, EstimationError>;
}

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Inlier threshold in pixels; compared against squared errors as `threshold^2`.
    pub threshold: f64,
    /// Minimum number of inliers required for acceptance.
    pub min_inliers: usize,
    /// Optional RNG seed for deterministic runs.
    pub random_seed: Option<u64>,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            threshold: 1.0,
            min_inliers: 15,
            random_seed: Some(0),
        }
    }
}

/// Result of a RANSAC model fit.
#[derive(Clone, Debug)]
pub struct RansacResult<M> {
    /// Estimated model.
    pub model: M,
    /// Per-point inlier mask.
    pub inliers: Vec<bool>,
    /// Total inlier count.
    pub inlier_count: usize,
    /// Sum of inlier errors (lower is better).
    pub score: f64,
}

/// RANSAC estimator with the normalized 4-point homography and 8-point
/// fundamental matrix solvers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacEstimator {
    /// RANSAC settings for the homography.
    pub homography: RansacParams,
    /// RANSAC settings for the fundamental matrix.
    pub fundamental: RansacParams,
}

impl RansacEstimator {
    /// Create an estimator with separate settings per model.
    pub fn new(homography: RansacParams, fundamental: RansacParams) -> Self {
        Self {
            homography,
            fundamental,
        }
    }
}

impl ModelEstimator for RansacEstimator {
    fn estimate_homography(
        &mut self,
        correspondences: &Correspondences,
    ) -> Result<DMat3, EstimationError> {
        let res = ransac_homography(correspondences, &self.homography)?;
        log::debug!(
            "ransac homography: {}/{} inliers",
            res.inlier_count,
            correspondences.len()
        );
        Ok(res.model)
    }

    fn estimate_fundamental(
        &mut self,
        correspondences: &Correspondences,
    ) -> Result<DMat3, EstimationError> {
        let res = ransac_fundamental(correspondences, &self.fundamental)?;
        log::debug!(
            "ransac fundamental: {}/{} inliers",
            res.inlier_count,
            correspondences.len()
        );
        Ok(res.model)
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => {
            let mut tr = rand::rng();
            StdRng::from_rng(&mut tr)
        }
    }
}

/// Hypothesize-and-verify loop shared by both models.
///
/// `solve` fits a model to a sample (minimal or not) and `error` returns the
/// squared error of one correspondence. The best consensus set is refit with
/// `solve` and the refined model is kept if it does not lose inliers.
fn run_ransac<S, E>(
    correspondences: &Correspondences,
    sample_size: usize,
    params: &RansacParams,
    solve: S,
    error: E,
) -> Result<RansacResult<DMat3>, EstimationError>
where
    S: Fn(&[DVec2], &[DVec2]) -> Result<DMat3, EstimationError>,
    E: Fn(&DMat3, DVec2, DVec2) -> f64,
{
    let n = correspondences.len();
    if n < sample_size {
        return Err(EstimationError::InvalidInput {
            required: sample_size,
        });
    }

    let (x_ref, x_tar) = (correspondences.reference(), correspondences.target());
    let threshold_sq = params.threshold * params.threshold;
    let mut rng = seeded_rng(params.random_seed);

    let mut best: Option<RansacResult<DMat3>> = None;
    let mut s_ref = Vec::with_capacity(sample_size);
    let mut s_tar = Vec::with_capacity(sample_size);

    for _ in 0..params.max_iterations {
        let sample = rand::seq::index::sample(&mut rng, n, sample_size);
        s_ref.clear();
        s_tar.clear();
        for idx in sample.iter() {
            s_ref.push(x_ref[idx]);
            s_tar.push(x_tar[idx]);
        }
        let model = match solve(&s_ref, &s_tar) {
            Ok(m) => m,
            Err(_) => continue,
        };

        let candidate = consensus(model, correspondences, threshold_sq, &error);
        if is_better(&candidate, best.as_ref()) {
            best = Some(candidate);
        }
    }

    let mut best = match best {
        Some(b) if b.inlier_count >= params.min_inliers.max(sample_size) => b,
        _ => return Err(EstimationError::RansacFailure),
    };

    // refit on the consensus set
    let inlier_set = correspondences
        .filter_inliers(&best.inliers)
        .map_err(|_| EstimationError::RansacFailure)?;
    if let Ok(refined) = solve(inlier_set.reference(), inlier_set.target()) {
        let refined = consensus(refined, correspondences, threshold_sq, &error);
        if refined.inlier_count >= best.inlier_count {
            best = refined;
        }
    }

    Ok(best)
}

fn consensus<E>(
    model: DMat3,
    correspondences: &Correspondences,
    threshold_sq: f64,
    error: &E,
) -> RansacResult<DMat3>
where
    E: Fn(&DMat3, DVec2, DVec2) -> f64,
{
    let mut inliers = vec![false; correspondences.len()];
    let mut inlier_count = 0usize;
    let mut score = 0.0f64;
    for (i, (x_ref, x_tar)) in correspondences.iter().enumerate() {
        let d = error(&model, x_ref, x_tar);
        if d <= threshold_sq {
            inliers[i] = true;
            inlier_count += 1;
            score += d;
        }
    }
    RansacResult {
        model,
        inliers,
        inlier_count,
        score,
    }
}

fn is_better(candidate: &RansacResult<DMat3>, best: Option<&RansacResult<DMat3>>) -> bool {
    match best {
        None => candidate.inlier_count > 0,
        Some(best) => {
            candidate.inlier_count > best.inlier_count
                || (candidate.inlier_count == best.inlier_count && candidate.score < best.score)
        }
    }
}

/// Similarity transform moving the centroid to the origin and the mean
/// distance to `sqrt(2)` (Hartley normalization).
fn normalize_points(points: &[DVec2]) -> (Vec<DVec2>, DMat3) {
    let n = points.len() as f64;
    let mean = points.iter().fold(DVec2::ZERO, |acc, p| acc + *p) / n;
    let mean_dist = points.iter().map(|p| p.distance(mean)).sum::<f64>() / n;
    let scale = if mean_dist > 0.0 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let normalized = points.iter().map(|p| (*p - mean) * scale).collect();
    let transform = DMat3::from_cols(
        DVec3::new(scale, 0.0, 0.0),
        DVec3::new(0.0, scale, 0.0),
        DVec3::new(-scale * mean.x, -scale * mean.y, 1.0),
    );
    (normalized, transform)
}

/// Fill a row-major 3x3 matrix from the 9-vector of a DLT solution.
fn mat3_from_row_major(h: &[f64]) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(h[0], h[3], h[6]),
        DVec3::new(h[1], h[4], h[7]),
        DVec3::new(h[2], h[5], h[8]),
    )
}

fn check_input(x_ref: &[DVec2], x_tar: &[DVec2], required: usize) -> Result<(), EstimationError> {
    if x_ref.len() != x_tar.len() || x_ref.len() < required {
        return Err(EstimationError::InvalidInput { required });
    }
    Ok(())
}
