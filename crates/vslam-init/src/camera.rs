//! Pinhole camera intrinsics and Brown-Conrady lens distortion.

use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::InitError;

/// Intrinsic parameters of a pinhole camera, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in x direction.
    pub fx: f64,
    /// Focal length in y direction.
    pub fy: f64,
    /// Principal point x coordinate.
    pub cx: f64,
    /// Principal point y coordinate.
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Create camera intrinsics from focal lengths and principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Create camera intrinsics from a 3x3 calibration matrix.
    ///
    /// The matrix must have the form `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`
    /// with finite, strictly positive focal lengths.
    pub fn from_matrix(k: &DMat3) -> Result<Self, InitError> {
        let (r0, r1, r2) = (k.row(0), k.row(1), k.row(2));
        if r0.y != 0.0 || r1.x != 0.0 || r2.x != 0.0 || r2.y != 0.0 || r2.z != 1.0 {
            return Err(InitError::InvalidIntrinsics(
                "matrix must have form [[fx, 0, cx], [0, fy, cy], [0, 0, 1]]".to_string(),
            ));
        }
        let intrinsics = Self::new(r0.x, r1.y, r0.z, r1.z);
        intrinsics.validate()?;
        Ok(intrinsics)
    }

    /// Check that the focal lengths are positive and all values finite.
    pub fn validate(&self) -> Result<(), InitError> {
        let values = [self.fx, self.fy, self.cx, self.cy];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(InitError::InvalidIntrinsics(format!(
                "non-finite intrinsics {self:?}"
            )));
        }
        if self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(InitError::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        Ok(())
    }

    /// The calibration matrix `K`.
    pub fn matrix(&self) -> DMat3 {
        DMat3::from_cols(
            DVec3::new(self.fx, 0.0, 0.0),
            DVec3::new(0.0, self.fy, 0.0),
            DVec3::new(self.cx, self.cy, 1.0),
        )
    }

    /// The inverse calibration matrix `K^-1`, computed in closed form.
    pub fn inverse_matrix(&self) -> DMat3 {
        let (ifx, ify) = (1.0 / self.fx, 1.0 / self.fy);
        DMat3::from_cols(
            DVec3::new(ifx, 0.0, 0.0),
            DVec3::new(0.0, ify, 0.0),
            DVec3::new(-self.cx * ifx, -self.cy * ify, 1.0),
        )
    }

    /// Project a point expressed in the camera frame to pixel coordinates.
    ///
    /// Returns `None` for points on the camera plane (`z == 0`).
    pub fn project(&self, point: DVec3) -> Option<DVec2> {
        if point.z == 0.0 {
            return None;
        }
        let inv_z = 1.0 / point.z;
        Some(DVec2::new(
            self.fx * point.x * inv_z + self.cx,
            self.fy * point.y * inv_z + self.cy,
        ))
    }

    /// Back-project a pixel to its normalized homogeneous ray `(x, y, 1)`.
    pub fn normalize(&self, pixel: DVec2) -> DVec3 {
        DVec3::new(
            (pixel.x - self.cx) / self.fx,
            (pixel.y - self.cy) / self.fy,
            1.0,
        )
    }
}

/// Brown-Conrady distortion coefficients in OpenCV order `(k1, k2, p1, p2, k3)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distortion {
    /// First radial coefficient.
    pub k1: f64,
    /// Second radial coefficient.
    pub k2: f64,
    /// First tangential coefficient.
    pub p1: f64,
    /// Second tangential coefficient.
    pub p2: f64,
    /// Third radial coefficient.
    pub k3: f64,
}

impl Distortion {
    /// Distortion parameters with all coefficients set to zero.
    pub fn none() -> Self {
        Self::default()
    }

    /// Create distortion parameters from the OpenCV coefficient vector.
    pub fn from_coeffs(coeffs: [f64; 5]) -> Self {
        let [k1, k2, p1, p2, k3] = coeffs;
        Self { k1, k2, p1, p2, k3 }
    }

    /// Check if there is any distortion.
    pub fn has_distortion(&self) -> bool {
        self.k1 != 0.0 || self.k2 != 0.0 || self.p1 != 0.0 || self.p2 != 0.0 || self.k3 != 0.0
    }

    /// Apply the distortion model to a normalized image point.
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let kr = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;
        let xy2 = 2.0 * x * y;
        (
            x * kr + self.p1 * xy2 + self.p2 * (r2 + 2.0 * x * x),
            y * kr + self.p1 * (r2 + 2.0 * y * y) + self.p2 * xy2,
        )
    }
}

const UNDISTORT_MAX_ITERATIONS: usize = 20;
const UNDISTORT_EPSILON: f64 = 1e-12;

/// A pinhole camera together with its lens distortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    /// Camera intrinsics.
    pub intrinsics: CameraIntrinsics,
    /// Lens distortion coefficients.
    #[serde(default)]
    pub distortion: Distortion,
}

impl CameraModel {
    /// Create a camera model without distortion.
    pub fn pinhole(intrinsics: CameraIntrinsics) -> Self {
        Self {
            intrinsics,
            distortion: Distortion::none(),
        }
    }

    /// Create a camera model with distortion.
    pub fn with_distortion(intrinsics: CameraIntrinsics, distortion: Distortion) -> Self {
        Self {
            intrinsics,
            distortion,
        }
    }

    /// Distort an ideal pixel.
    pub fn distort_point(&self, pixel: DVec2) -> DVec2 {
        if !self.distortion.has_distortion() {
            return pixel;
        }
        let n = self.intrinsics.normalize(pixel);
        let (xd, yd) = self.distortion.apply(n.x, n.y);
        DVec2::new(
            self.intrinsics.fx * xd + self.intrinsics.cx,
            self.intrinsics.fy * yd + self.intrinsics.cy,
        )
    }

    /// Remove lens distortion from an observed pixel by fixed-point iteration.
    pub fn undistort_point(&self, pixel: DVec2) -> DVec2 {
        if !self.distortion.has_distortion() {
            return pixel;
        }

        let observed = self.intrinsics.normalize(pixel);
        let (mut x, mut y) = (observed.x, observed.y);

        for _ in 0..UNDISTORT_MAX_ITERATIONS {
            let (xd, yd) = self.distortion.apply(x, y);
            let dx = observed.x - xd;
            let dy = observed.y - yd;
            x += dx;
            y += dy;
            if dx.abs() < UNDISTORT_EPSILON && dy.abs() < UNDISTORT_EPSILON {
                break;
            }
        }

        DVec2::new(
            self.intrinsics.fx * x + self.intrinsics.cx,
            self.intrinsics.fy * y + self.intrinsics.cy,
        )
    }

    /// Undistort a sequence of pixels, preserving length and order.
    pub fn undistort_points(&self, pixels: &[DVec2]) -> Vec<DVec2> {
        pixels.iter().map(|p| self.undistort_point(*p)).collect()
    }
}
