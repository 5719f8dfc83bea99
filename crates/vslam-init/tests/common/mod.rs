#![allow(dead_code)]

use glam::{DMat3, DVec2, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vslam_init::linalg::skew;
use vslam_init::{CameraIntrinsics, Correspondences};

/// Two synthetic views of a set of 3D points.
pub struct Scene {
    pub intrinsics: CameraIntrinsics,
    pub rotation: DMat3,
    pub translation: DVec3,
    pub points: Vec<DVec3>,
    pub reference: Vec<DVec2>,
    pub target: Vec<DVec2>,
}

impl Scene {
    pub fn observe(
        intrinsics: CameraIntrinsics,
        rotation: DMat3,
        translation: DVec3,
        points: Vec<DVec3>,
    ) -> Self {
        let reference = points.iter().map(|&p| project(&intrinsics, p)).collect();
        let target = points
            .iter()
            .map(|&p| project(&intrinsics, rotation * p + translation))
            .collect();
        Self {
            intrinsics,
            rotation,
            translation,
            points,
            reference,
            target,
        }
    }

    pub fn correspondences(&self) -> Correspondences {
        Correspondences::new(self.reference.clone(), self.target.clone())
            .expect("views have the same length")
    }

    /// Ground-truth fundamental matrix, `x_tar^T F x_ref = 0`.
    pub fn fundamental(&self) -> DMat3 {
        let k_inv = self.intrinsics.inverse_matrix();
        k_inv.transpose() * skew(self.translation) * self.rotation * k_inv
    }

    /// Homography induced by the plane `n^T X = d` of the reference frame.
    pub fn plane_homography(&self, normal: DVec3, distance: f64) -> DMat3 {
        let n = normal / distance;
        let t = self.translation;
        let euclidean = self.rotation + DMat3::from_cols(t * n.x, t * n.y, t * n.z);
        self.intrinsics.matrix() * euclidean * self.intrinsics.inverse_matrix()
    }

    /// Add seeded gaussian-like pixel noise of the given scale to the target view.
    pub fn with_target_noise(&self, sigma: f64, seed: u64) -> Correspondences {
        let offsets = noise(self.target.len(), seed);
        let target = self
            .target
            .iter()
            .zip(&offsets)
            .map(|(p, n)| *p + *n * sigma)
            .collect();
        Correspondences::new(self.reference.clone(), target).expect("same length")
    }

    /// Add seeded noise of the given scale to both views.
    pub fn with_noise(&self, sigma: f64, seed: u64) -> Correspondences {
        let n_ref = noise(self.reference.len(), seed);
        let n_tar = noise(self.target.len(), seed.wrapping_add(1));
        let reference = self.reference.iter().zip(&n_ref).map(|(p, n)| *p + *n * sigma);
        let target = self.target.iter().zip(&n_tar).map(|(p, n)| *p + *n * sigma);
        Correspondences::new(reference.collect(), target.collect()).expect("same length")
    }
}

pub fn intrinsics() -> CameraIntrinsics {
    CameraIntrinsics::new(500.0, 500.0, 320.0, 320.0)
}

pub fn project(intrinsics: &CameraIntrinsics, p: DVec3) -> DVec2 {
    DVec2::new(
        intrinsics.fx * p.x / p.z + intrinsics.cx,
        intrinsics.fy * p.y / p.z + intrinsics.cy,
    )
}

/// Unit-variance noise approximated by the sum of uniform samples.
pub fn noise(n: usize, seed: u64) -> Vec<DVec2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = || (0..12).map(|_| rng.random_range(0.0..1.0)).sum::<f64>() - 6.0;
    (0..n).map(|_| DVec2::new(sample(), sample())).collect()
}

/// Random points in the field of view at depths `z_min..z_max`.
pub fn random_points(n: usize, z_min: f64, z_max: f64, seed: u64) -> Vec<DVec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let z = rng.random_range(z_min..z_max);
            DVec3::new(
                rng.random_range(-0.4..0.4) * z,
                rng.random_range(-0.4..0.4) * z,
                z,
            )
        })
        .collect()
}

/// General motion in front of a non-planar scene.
pub fn general_scene(n: usize, seed: u64) -> Scene {
    Scene::observe(
        intrinsics(),
        DMat3::from_rotation_y(0.06) * DMat3::from_rotation_z(0.02),
        DVec3::new(-1.0, 0.1, 0.05).normalize(),
        random_points(n, 5.0, 15.0, seed),
    )
}

/// Sideways motion in front of the plane `z = 5`, spanning the whole image.
pub fn planar_scene(n: usize, seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..n)
        .map(|_| DVec3::new(rng.random_range(-2.0..2.0), rng.random_range(-1.5..1.5), 5.0))
        .collect();
    Scene::observe(
        intrinsics(),
        DMat3::from_rotation_y(0.03),
        DVec3::new(-1.0, 0.0, 0.0),
        points,
    )
}

/// A camera rotating in place.
pub fn pure_rotation_scene(n: usize, seed: u64) -> Scene {
    Scene::observe(
        intrinsics(),
        DMat3::from_rotation_y(0.1) * DMat3::from_rotation_x(0.05),
        DVec3::ZERO,
        random_points(n, 5.0, 15.0, seed),
    )
}

/// A camera moving 5 mm sideways in front of points 5 to 15 units away.
pub fn small_baseline_scene(n: usize, seed: u64) -> Scene {
    Scene::observe(
        intrinsics(),
        DMat3::from_rotation_y(0.02),
        DVec3::new(-0.005, 0.0, 0.0),
        random_points(n, 5.0, 15.0, seed),
    )
}

/// The plane `z = 5` approached head-on, one unit closer in the target view.
pub fn forward_planar_scene(n: usize, seed: u64) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = (0..n)
        .map(|_| DVec3::new(rng.random_range(-2.0..2.0), rng.random_range(-1.5..1.5), 5.0))
        .collect();
    Scene::observe(intrinsics(), DMat3::IDENTITY, DVec3::NEG_Z, points)
}
