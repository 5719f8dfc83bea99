use argh::FromArgs;
use glam::{DMat3, DVec2, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use vslam_init::{
    CameraIntrinsics, CameraModel, Distortion, InitOutcome, Initializer, InitializerConfig,
    MapPoint, RansacEstimator,
};

#[derive(FromArgs)]
/// Initialize a map from two synthetic views of a random scene
struct Args {
    /// number of scene points
    #[argh(option, short = 'n', default = "200")]
    num_points: usize,

    /// standard deviation of the pixel noise
    #[argh(option, default = "0.5")]
    noise: f64,

    /// put every point on a single plane
    #[argh(switch)]
    planar: bool,

    /// rotate the camera in place instead of translating it
    #[argh(switch)]
    pure_rotation: bool,

    /// path to a JSON initializer configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// random seed
    #[argh(option, default = "0")]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => InitializerConfig::default(),
    };

    // the camera
    let camera = CameraModel::with_distortion(
        CameraIntrinsics::new(520.0, 520.0, 320.0, 240.0),
        Distortion::from_coeffs([-0.12, 0.03, 0.0, 0.0, 0.0]),
    );

    // the relative motion
    let rotation = DMat3::from_rotation_y(0.04) * DMat3::from_rotation_x(-0.02);
    let translation = if args.pure_rotation {
        DVec3::ZERO
    } else {
        DVec3::new(-1.0, 0.05, 0.1)
    };

    // observe random points in both views
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut reference = Vec::with_capacity(args.num_points);
    let mut target = Vec::with_capacity(args.num_points);
    for _ in 0..args.num_points {
        let z = if args.planar {
            8.0
        } else {
            rng.random_range(5.0..20.0)
        };
        let p = DVec3::new(
            rng.random_range(-0.45..0.45) * z,
            rng.random_range(-0.35..0.35) * z,
            z,
        );
        let q = rotation * p + translation;
        let (Some(a), Some(b)) = (camera.intrinsics.project(p), camera.intrinsics.project(q))
        else {
            continue;
        };
        let mut jitter = || DVec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
        reference.push(camera.distort_point(a) + jitter() * args.noise);
        target.push(camera.distort_point(b) + jitter() * args.noise);
    }

    let mut init = Initializer::new(camera, config, (), RansacEstimator::default())?;
    let mut map: Vec<MapPoint> = Vec::new();

    match init.initialize_from_matches(&reference, &target, &mut map)? {
        InitOutcome::Initialized(rec) => {
            println!("model: {:?}", rec.model.kind());
            println!("R_H: {:.3}", rec.homography_ratio);
            println!("R: {:?}", rec.rotation);
            println!("t: {:?} (true {:?})", rec.translation, translation.normalize());
            println!("good points: {}", rec.good_points);
            println!("parallax: {:.2} deg", rec.parallax_deg);
            println!("map points: {}", map.len());
        }
        InitOutcome::Rejected(reason) => {
            println!("rejected: {reason}");
        }
    }

    Ok(())
}
