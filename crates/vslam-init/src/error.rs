/// Errors returned when the caller breaks an API contract or a collaborator fails.
///
/// These are not part of the normal control flow: an image pair that is simply
/// unsuitable for initialization is reported through [`RejectReason`] instead.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    /// Two index-aligned sequences do not have the same length.
    #[error("Mismatched array lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    MismatchedArrayLengths {
        /// Label for the left-hand slice.
        left_name: &'static str,
        /// Length of the left-hand slice.
        left_len: usize,
        /// Label for the right-hand slice.
        right_name: &'static str,
        /// Length of the right-hand slice.
        right_len: usize,
    },

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The camera intrinsics are not a valid pinhole calibration.
    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// The feature matcher failed to produce correspondences.
    #[error("Feature matching failed: {0}")]
    Matching(String),

    /// The robust model estimator failed.
    #[error("Model estimation error: {0}")]
    Estimation(#[from] EstimationError),
}

/// Errors returned by the robust two-view model estimators.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// Input correspondences are invalid or insufficient.
    #[error("Need at least {required} correspondences and equal lengths")]
    InvalidInput {
        /// Minimum required correspondences for the chosen model.
        required: usize,
    },

    /// RANSAC failed to find a valid model.
    #[error("RANSAC failed to find a valid model")]
    RansacFailure,

    /// The minimal solver hit a degenerate configuration.
    #[error("Degenerate point configuration")]
    Degenerate,
}

/// Reasons for which an image pair is judged unsuitable for initialization.
///
/// Every variant is an expected outcome; the caller should retry with another
/// frame pair.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// The singular values of the normalized homography are not sorted.
    #[error("singular values are not in descending order: ({d1}, {d2}, {d3})")]
    UnorderedSingularValues {
        /// Largest singular value.
        d1: f64,
        /// Middle singular value.
        d2: f64,
        /// Smallest singular value.
        d3: f64,
    },

    /// The singular values of the normalized homography are all equal (pure
    /// rotation) or not finite, so the motion cannot be decomposed.
    #[error("singular values cannot be decomposed: ({d1}, {d2}, {d3})")]
    DegenerateSingularValues {
        /// Largest singular value.
        d1: f64,
        /// Middle singular value.
        d2: f64,
        /// Smallest singular value.
        d3: f64,
    },

    /// No pose hypothesis triangulated enough valid points.
    #[error("best pose hypothesis has {good_points} good points, need at least {required}")]
    NotEnoughGoodPoints {
        /// Good points of the best hypothesis.
        good_points: usize,
        /// Minimum required good points.
        required: usize,
    },

    /// Several pose hypotheses are similarly supported.
    #[error("ambiguous pose: normalized triangulation score {score:.3} <= {threshold:.3}")]
    AmbiguousPose {
        /// Normalized triangulation score of the best hypothesis.
        score: f64,
        /// Model-specific acceptance threshold.
        threshold: f64,
    },

    /// The baseline is too small with respect to the scene depth.
    #[error("insufficient parallax: {parallax_deg:.3} deg <= {min_parallax_deg:.3} deg")]
    InsufficientParallax {
        /// Parallax of the winning hypothesis in degrees.
        parallax_deg: f64,
        /// Minimum parallax in degrees.
        min_parallax_deg: f64,
    },

    /// Neither a homography nor a fundamental matrix could be estimated.
    #[error("no two-view model could be estimated")]
    NoModel,
}
