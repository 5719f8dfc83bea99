//! Synthetic two-view scenes shared by the unit tests.

use glam::{DMat3, DVec2, DVec3};

use super::PoseCandidate;
use crate::camera::CameraIntrinsics;
use crate::correspondence::Correspondences;
use crate::linalg::skew;

pub(crate) struct Scene {
    pub intrinsics: CameraIntrinsics,
    pub pose: PoseCandidate,
    pub points: Vec<DVec3>,
    pub correspondences: Correspondences,
}

impl Scene {
    /// `F` such that `x_tar^T F x_ref = 0`.
    pub fn fundamental(&self) -> DMat3 {
        let k_inv = self.intrinsics.inverse_matrix();
        k_inv.transpose() * skew(self.pose.translation) * self.pose.rotation * k_inv
    }
}

pub(crate) fn intrinsics() -> CameraIntrinsics {
    CameraIntrinsics::new(500.0, 500.0, 320.0, 320.0)
}

fn frac(x: f64) -> f64 {
    x - x.floor()
}

fn observe(intrinsics: CameraIntrinsics, pose: PoseCandidate, points: Vec<DVec3>) -> Scene {
    let project = |p: DVec3| -> DVec2 {
        DVec2::new(
            intrinsics.fx * p.x / p.z + intrinsics.cx,
            intrinsics.fy * p.y / p.z + intrinsics.cy,
        )
    };
    let reference = points.iter().map(|&p| project(p)).collect();
    let target = points
        .iter()
        .map(|&p| project(pose.rotation * p + pose.translation))
        .collect();
    Scene {
        intrinsics,
        pose,
        points,
        correspondences: Correspondences::new(reference, target)
            .expect("generated views have the same length"),
    }
}

/// Points spread over depths 5 to 15 seen by a sideways moving camera.
pub(crate) fn general_scene(n: usize) -> Scene {
    let points = (0..n)
        .map(|i| {
            let i = i as f64;
            let z = 5.0 + 10.0 * frac(i * 0.754_877_666);
            DVec3::new(
                (frac(i * 0.618_034) - 0.5) * 0.8 * z,
                (frac(i * 0.569_840_29) - 0.5) * 0.6 * z,
                z,
            )
        })
        .collect();
    let pose = PoseCandidate::new(
        DMat3::from_rotation_y(0.05) * DMat3::from_rotation_x(-0.02),
        DVec3::new(-1.0, 0.0, 0.1).normalize(),
    );
    observe(intrinsics(), pose, points)
}

/// Points on the fronto-parallel plane `z = 5` of the reference camera.
fn plane_points(n: usize) -> Vec<DVec3> {
    (0..n)
        .map(|i| {
            let i = i as f64;
            DVec3::new(
                (frac(i * 0.618_034) - 0.5) * 4.0,
                (frac(i * 0.569_840_29) - 0.5) * 3.0,
                5.0,
            )
        })
        .collect()
}

/// The plane `z = 5` seen by a sideways moving camera.
pub(crate) fn planar_scene(n: usize) -> Scene {
    let pose = PoseCandidate::new(DMat3::from_rotation_y(0.03), DVec3::new(-1.0, 0.0, 0.0));
    observe(intrinsics(), pose, plane_points(n))
}

/// The plane `z = 5` approached head-on, one unit closer in the target view.
pub(crate) fn forward_planar_scene(n: usize) -> Scene {
    let pose = PoseCandidate::new(DMat3::IDENTITY, DVec3::NEG_Z);
    observe(intrinsics(), pose, plane_points(n))
}

/// Homography induced by the plane of [`planar_scene`].
pub(crate) fn planar_homography(scene: &Scene) -> DMat3 {
    let normal_over_distance = DVec3::new(0.0, 0.0, 1.0 / 5.0);
    let euclidean = scene.pose.rotation
        + DMat3::from_cols(
            scene.pose.translation * normal_over_distance.x,
            scene.pose.translation * normal_over_distance.y,
            scene.pose.translation * normal_over_distance.z,
        );
    scene.intrinsics.matrix() * euclidean * scene.intrinsics.inverse_matrix()
}
