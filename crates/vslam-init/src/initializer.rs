use glam::{DMat3, DVec2, DVec3};

use crate::camera::{CameraIntrinsics, CameraModel};
use crate::config::InitializerConfig;
use crate::correspondence::{check_lengths, Correspondences, MatchSet};
use crate::error::{InitError, RejectReason};
use crate::estimate::{ModelEstimator, RansacEstimator};
use crate::map::MapPoint;
use crate::pose::{reconstruct_fundamental, reconstruct_homography, PoseEstimate, TriangulatedPoint};
use crate::scoring::{check_fundamental, check_homography, ModelScore};
use crate::selection::{select_model, ModelKind};

/// Two-view model used during initialization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TwoViewModel {
    /// Homography mapping reference pixels to target pixels.
    Homography(DMat3),
    /// Fundamental matrix with `x_tar^T F x_ref = 0`.
    Fundamental(DMat3),
}

impl TwoViewModel {
    /// Which model this is.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Homography(_) => ModelKind::Homography,
            Self::Fundamental(_) => ModelKind::Fundamental,
        }
    }

    /// The 3x3 model matrix.
    pub fn matrix(&self) -> DMat3 {
        match self {
            Self::Homography(m) | Self::Fundamental(m) => *m,
        }
    }
}

/// A successful two-view reconstruction.
#[derive(Clone, Debug, PartialEq)]
pub struct TwoViewReconstruction {
    /// Selected model.
    pub model: TwoViewModel,
    /// Relative rotation from the reference to the target camera frame.
    pub rotation: DMat3,
    /// Unit translation direction from the reference to the target camera frame.
    pub translation: DVec3,
    /// Triangulated points, in the target camera frame.
    pub points: Vec<TriangulatedPoint>,
    /// Inlier mask of the selected model.
    pub inliers: Vec<bool>,
    /// Good points of the winning pose hypothesis.
    pub good_points: usize,
    /// Normalized triangulation score of the winning pose hypothesis.
    pub normalized_score: f64,
    /// Parallax of the reconstruction in degrees.
    pub parallax_deg: f64,
    /// Homography ratio `S_H / (S_H + S_F)` used for model selection.
    pub homography_ratio: f64,
}

/// Outcome of an initialization attempt.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum InitOutcome {
    /// The pair produced a usable reconstruction.
    Initialized(TwoViewReconstruction),
    /// The pair is unsuitable; retry with another one.
    Rejected(RejectReason),
}

impl InitOutcome {
    /// Whether the attempt succeeded.
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized(_))
    }

    /// The reconstruction, if the attempt succeeded.
    pub fn reconstruction(&self) -> Option<&TwoViewReconstruction> {
        match self {
            Self::Initialized(rec) => Some(rec),
            Self::Rejected(_) => None,
        }
    }

    /// Convert into a `Result`, with the rejection reason as the error.
    pub fn into_result(self) -> Result<TwoViewReconstruction, RejectReason> {
        match self {
            Self::Initialized(rec) => Ok(rec),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

/// Initialize a two-view geometry with model selection and triangulation.
///
/// Scores the available model hypotheses on the undistorted `correspondences`,
/// selects the homography or the fundamental matrix through the homography
/// ratio and recovers the relative pose from the selected one. A missing
/// hypothesis is scored 0.
///
/// Returns `Err` only for invalid `intrinsics` or `config`.
pub fn two_view_initialize(
    intrinsics: &CameraIntrinsics,
    correspondences: &Correspondences,
    homography: Option<DMat3>,
    fundamental: Option<DMat3>,
    config: &InitializerConfig,
) -> Result<InitOutcome, InitError> {
    intrinsics.validate()?;
    config.validate()?;

    let score_h = homography.map(|h| (h, check_homography(correspondences, &h, &config.scoring)));
    let score_f =
        fundamental.map(|f| (f, check_fundamental(correspondences, &f, &config.scoring)));
    let total = |s: &Option<(DMat3, ModelScore)>| s.as_ref().map_or(0.0, |(_, s)| s.score);

    let selection = select_model(
        total(&score_h),
        total(&score_f),
        config.homography_selection_ratio,
    );

    let (model, score) = match (selection.model, score_h, score_f) {
        (ModelKind::Homography, Some((h, s)), _) => (TwoViewModel::Homography(h), s),
        (ModelKind::Fundamental, _, Some((f, s))) => (TwoViewModel::Fundamental(f), s),
        _ => return Ok(reject(RejectReason::NoModel)),
    };
    log::debug!(
        "{:?} model: {}/{} inliers",
        model.kind(),
        score.inlier_count,
        correspondences.len()
    );

    let pose = match model {
        TwoViewModel::Homography(h) => {
            reconstruct_homography(&h, correspondences, &score.inliers, intrinsics, config)
        }
        TwoViewModel::Fundamental(f) => {
            reconstruct_fundamental(&f, correspondences, &score.inliers, intrinsics, config)
        }
    };

    let PoseEstimate {
        rotation,
        translation,
        points,
        good_points,
        normalized_score,
        parallax_deg,
    } = match pose {
        Ok(pose) => pose,
        Err(reason) => return Ok(reject(reason)),
    };
    log::debug!(
        "initialized: {good_points} points, score {normalized_score:.3}, parallax {parallax_deg:.2} deg"
    );

    Ok(InitOutcome::Initialized(TwoViewReconstruction {
        model,
        rotation,
        translation,
        points,
        inliers: score.inliers,
        good_points,
        normalized_score,
        parallax_deg,
        homography_ratio: selection.ratio,
    }))
}

fn reject(reason: RejectReason) -> InitOutcome {
    log::debug!("initialization rejected: {reason}");
    InitOutcome::Rejected(reason)
}

/// Produces matched keypoints for a pair of images.
pub trait FeatureMatcher {
    /// The image type consumed by the matcher.
    type Image: ?Sized;

    /// Match the keypoints of `reference` and `target`.
    fn match_features(
        &mut self,
        reference: &Self::Image,
        target: &Self::Image,
    ) -> Result<MatchSet, InitError>;
}

/// Builds the initial map of a monocular SLAM session from two frames.
///
/// The camera model and the configuration are fixed at construction. The
/// matcher and the estimator are owned exclusively by the initializer.
pub struct Initializer<M, E = RansacEstimator> {
    camera: CameraModel,
    config: InitializerConfig,
    matcher: M,
    estimator: E,
}

impl<M, E: ModelEstimator> Initializer<M, E> {
    /// Create an initializer, validating the camera model and the configuration.
    pub fn new(
        camera: CameraModel,
        config: InitializerConfig,
        matcher: M,
        estimator: E,
    ) -> Result<Self, InitError> {
        camera.intrinsics.validate()?;
        config.validate()?;
        Ok(Self {
            camera,
            config,
            matcher,
            estimator,
        })
    }

    /// The camera model.
    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// The configuration.
    pub fn config(&self) -> &InitializerConfig {
        &self.config
    }

    /// The feature matcher.
    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Initialize from already matched raw (distorted) keypoints, skipping the
    /// matcher.
    ///
    /// On success one [`MapPoint`] per triangulated point is appended to
    /// `map`; on rejection `map` is left untouched.
    pub fn initialize_from_matches(
        &mut self,
        reference: &[DVec2],
        target: &[DVec2],
        map: &mut impl Extend<MapPoint>,
    ) -> Result<InitOutcome, InitError> {
        check_lengths("reference", reference.len(), "target", target.len())?;

        let correspondences = Correspondences::new(
            self.camera.undistort_points(reference),
            self.camera.undistort_points(target),
        )?;

        let homography = match self.estimator.estimate_homography(&correspondences) {
            Ok(h) => Some(h),
            Err(err) => {
                log::warn!("homography estimation failed: {err}");
                None
            }
        };
        let fundamental = match self.estimator.estimate_fundamental(&correspondences) {
            Ok(f) => Some(f),
            Err(err) => {
                log::warn!("fundamental matrix estimation failed: {err}");
                None
            }
        };

        let outcome = two_view_initialize(
            &self.camera.intrinsics,
            &correspondences,
            homography,
            fundamental,
            &self.config,
        )?;

        if let InitOutcome::Initialized(rec) = &outcome {
            map.extend(rec.points.iter().map(|p| MapPoint::new(p.position)));
        }
        Ok(outcome)
    }
}

impl<M: FeatureMatcher, E: ModelEstimator> Initializer<M, E> {
    /// Match two frames and initialize the map from them.
    ///
    /// On success one [`MapPoint`] per triangulated point is appended to
    /// `map`; on rejection `map` is left untouched.
    pub fn initialize_map(
        &mut self,
        reference: &M::Image,
        target: &M::Image,
        map: &mut impl Extend<MapPoint>,
    ) -> Result<InitOutcome, InitError> {
        let matches = self.matcher.match_features(reference, target)?;
        matches.validate()?;
        log::debug!("matcher returned {} correspondences", matches.matches.len());

        self.initialize_from_matches(&matches.reference, &matches.target, map)
    }
}
