#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Two-view map initialization
//!
//! Recovers the relative pose of two frames of a monocular camera and an
//! initial set of triangulated landmarks, up to scale.
//!
//! ## Pipeline
//!
//! 1. Score a homography and a fundamental matrix hypothesis on the
//!    undistorted correspondences.
//! 2. Select the homography when `S_H / (S_H + S_F)` exceeds the selection
//!    ratio, the fundamental matrix otherwise.
//! 3. Decompose the selected model into 8 (homography) or 4 (fundamental)
//!    pose hypotheses.
//! 4. Triangulate the model inliers under every hypothesis and keep the one
//!    with the most points in front of both cameras, if it is unambiguous and
//!    the reconstruction has enough parallax.
//!
//! An unsuitable pair is not an error: it yields
//! [`InitOutcome::Rejected`] with the reason, and the caller retries with
//! another pair.
//!
//! ## Example
//!
//! ```rust
//! use glam::{DMat3, DVec2, DVec3};
//! use vslam_init::{
//!     linalg::skew, two_view_initialize, CameraIntrinsics, Correspondences, InitializerConfig,
//! };
//!
//! let intrinsics = CameraIntrinsics::new(500.0, 500.0, 320.0, 320.0);
//! let (r, t) = (DMat3::IDENTITY, DVec3::new(-1.0, 0.0, 0.0));
//!
//! let (mut reference, mut target) = (Vec::new(), Vec::new());
//! for i in 0..30 {
//!     let z = 5.0 + (i % 10) as f64;
//!     let p = DVec3::new((i % 6) as f64 * 0.3 - 0.8, (i % 5) as f64 * 0.3 - 0.6, z);
//!     let q = r * p + t;
//!     reference.push(intrinsics.project(p).unwrap());
//!     target.push(intrinsics.project(q).unwrap());
//! }
//! let correspondences = Correspondences::new(reference, target)?;
//!
//! let k_inv = intrinsics.inverse_matrix();
//! let f = k_inv.transpose() * skew(t) * r * k_inv;
//!
//! let outcome = two_view_initialize(
//!     &intrinsics,
//!     &correspondences,
//!     None,
//!     Some(f),
//!     &InitializerConfig::default(),
//! )?;
//! let reconstruction = outcome.into_result().unwrap();
//! assert!(reconstruction.translation.dot(t).abs() > 0.99);
//! assert_eq!(reconstruction.points.len(), 30);
//! # Ok::<(), vslam_init::InitError>(())
//! ```

/// Pinhole camera intrinsics and lens distortion.
pub mod camera;

/// Initializer configuration.
pub mod config;

/// Point correspondences between two images.
pub mod correspondence;

/// Error types.
pub mod error;

/// Robust estimation of the two-view models.
pub mod estimate;

/// Two-view initialization pipeline.
pub mod initializer;

/// Linear algebra utilities.
pub mod linalg;

/// Map point value type.
pub mod map;

/// Relative pose recovery.
pub mod pose;

/// Model inlier classification and scoring.
pub mod scoring;

/// Model selection heuristic.
pub mod selection;

/// Two-view point triangulation.
pub mod triangulation;

pub use camera::{CameraIntrinsics, CameraModel, Distortion};
pub use config::{InitializerConfig, ScoringParams, TriangulationParams};
pub use correspondence::{Correspondences, FeatureMatch, MatchSet};
pub use error::{EstimationError, InitError, RejectReason};
pub use estimate::{ModelEstimator, RansacEstimator, RansacParams};
pub use initializer::{
    two_view_initialize, FeatureMatcher, InitOutcome, Initializer, TwoViewModel,
    TwoViewReconstruction,
};
pub use map::MapPoint;
pub use pose::TriangulatedPoint;
pub use selection::ModelKind;
