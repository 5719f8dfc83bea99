mod common;

use glam::{DMat3, DVec3};
use vslam_init::estimate::ransac_fundamental;
use vslam_init::linalg::skew;
use vslam_init::pose::{
    check_singular_values, decompose_homography, reconstruct_fundamental, reconstruct_homography,
};
use vslam_init::{
    two_view_initialize, InitOutcome, InitializerConfig, ModelKind, RansacParams, RejectReason,
};

fn rotation_angle(a: &DMat3, b: &DMat3) -> f64 {
    let rel = a.transpose() * *b;
    let trace = rel.x_axis.x + rel.y_axis.y + rel.z_axis.z;
    ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos()
}

#[test]
fn test_fundamental_ground_truth_recovery() {
    let scene = common::general_scene(60, 11);
    let corr = scene.correspondences();
    let config = InitializerConfig::default();

    let est = reconstruct_fundamental(
        &scene.fundamental(),
        &corr,
        &vec![true; corr.len()],
        &scene.intrinsics,
        &config,
    )
    .unwrap();

    assert!(rotation_angle(&est.rotation, &scene.rotation) < 1e-6);
    assert!(est.translation.dot(scene.translation) > 0.99);
    assert_eq!(est.good_points, 60);
    assert!(est.normalized_score > config.min_fundamental_score);
}

#[test]
fn test_fundamental_recovery_from_noisy_estimate() -> Result<(), Box<dyn std::error::Error>> {
    let scene = common::general_scene(100, 12);
    let corr = scene.with_noise(0.3, 5);
    let config = InitializerConfig::default();

    let params = RansacParams {
        threshold: 1.5,
        ..Default::default()
    };
    let fit = ransac_fundamental(&corr, &params)?;
    let est = reconstruct_fundamental(
        &fit.model,
        &corr,
        &fit.inliers,
        &scene.intrinsics,
        &config,
    )?;

    assert!(rotation_angle(&est.rotation, &scene.rotation) < 0.02);
    assert!(est.translation.dot(scene.translation) > 0.99);
    Ok(())
}

#[test]
fn test_concrete_sideways_scenario() {
    // identical orientation, target camera centered at (1, 0, 0)
    let points = common::random_points(30, 5.0, 15.0, 3);
    let scene = common::Scene::observe(
        common::intrinsics(),
        DMat3::IDENTITY,
        DVec3::new(-1.0, 0.0, 0.0),
        points,
    );
    let corr = scene.correspondences();
    let config = InitializerConfig::default();

    let est = reconstruct_fundamental(
        &scene.fundamental(),
        &corr,
        &[true; 30],
        &scene.intrinsics,
        &config,
    )
    .unwrap();

    assert!(est.translation.dot(DVec3::X).abs() > 0.99);
    assert!(est.good_points >= config.min_good_points);
    assert!(est.parallax_deg > config.min_parallax_deg);
}

#[test]
fn test_planar_homography_unique_winner() {
    let scene = common::planar_scene(50, 21);
    let corr = scene.correspondences();
    let h = scene.plane_homography(DVec3::Z, 5.0);
    let config = InitializerConfig::default();

    // the true motion is one of the eight hypotheses
    let candidates =
        decompose_homography(&h, &scene.intrinsics, config.singular_value_tolerance).unwrap();
    assert_eq!(candidates.len(), 8);
    assert!(candidates
        .iter()
        .any(|c| rotation_angle(&c.pose.rotation, &scene.rotation) < 1e-6));

    let est =
        reconstruct_homography(&h, &corr, &[true; 50], &scene.intrinsics, &config).unwrap();
    assert!(rotation_angle(&est.rotation, &scene.rotation) < 1e-6);
    assert!(est.translation.dot(scene.translation) > 0.99);
    assert_eq!(est.good_points, 50);
    assert!(est.normalized_score > config.min_homography_score);

    // the points lie on the plane z = 5 of the reference frame
    for p in &est.points {
        let in_ref = est.rotation.transpose() * (p.position - est.translation);
        assert!((in_ref.z - 5.0).abs() < 1e-6);
    }
}

#[test]
fn test_singular_value_ordering_precondition() {
    for d in [
        DVec3::new(1.0, 2.0, 0.5),
        DVec3::new(2.0, 0.5, 1.0),
        DVec3::new(0.5, 1.0, 2.0),
    ] {
        assert!(matches!(
            check_singular_values(d, 1e-6),
            Err(RejectReason::UnorderedSingularValues { .. })
        ));
    }
    assert!(check_singular_values(DVec3::new(2.0, 1.0, 0.5), 1e-6).is_ok());
}

#[test]
fn test_pure_rotation_is_rejected() {
    let scene = common::pure_rotation_scene(60, 31);
    let corr = scene.correspondences();
    let config = InitializerConfig::default();
    let k = scene.intrinsics.matrix();
    let k_inv = scene.intrinsics.inverse_matrix();

    // homography path: the rotation homography has no translation to recover
    let h = k * scene.rotation * k_inv;
    assert!(reconstruct_homography(&h, &corr, &[true; 60], &scene.intrinsics, &config).is_err());

    // fundamental path: any epipolar geometry consistent with the data
    for t in [DVec3::X, DVec3::new(0.3, -0.2, 1.0).normalize(), DVec3::Y] {
        let f = k_inv.transpose() * skew(t) * scene.rotation * k_inv;
        let res = reconstruct_fundamental(&f, &corr, &[true; 60], &scene.intrinsics, &config);
        assert!(res.is_err(), "accepted a pure rotation with t = {t}");
    }
}

#[test]
fn test_small_baseline_has_insufficient_parallax() -> Result<(), Box<dyn std::error::Error>> {
    let scene = common::small_baseline_scene(60, 41);
    let corr = scene.correspondences();
    let config = InitializerConfig::default();

    let err = reconstruct_fundamental(
        &scene.fundamental(),
        &corr,
        &[true; 60],
        &scene.intrinsics,
        &config,
    )
    .unwrap_err();
    match err {
        RejectReason::InsufficientParallax {
            parallax_deg,
            min_parallax_deg,
        } => {
            assert!(parallax_deg < 0.1);
            assert_eq!(min_parallax_deg, config.min_parallax_deg);
        }
        other => panic!("unexpected rejection: {other}"),
    }

    let outcome =
        two_view_initialize(&scene.intrinsics, &corr, None, Some(scene.fundamental()), &config)?;
    assert!(matches!(
        outcome,
        InitOutcome::Rejected(RejectReason::InsufficientParallax { .. })
    ));
    Ok(())
}

#[test]
fn test_forward_motion_toward_plane() -> Result<(), Box<dyn std::error::Error>> {
    let scene = common::forward_planar_scene(100, 51);
    let corr = scene.correspondences();
    let h = scene.plane_homography(DVec3::Z, 5.0);
    let config = InitializerConfig::default();

    // two equal singular values: the plane normal is the direction of motion
    let candidates = decompose_homography(&h, &scene.intrinsics, config.singular_value_tolerance)?;
    assert_eq!(candidates.len(), 8);

    let outcome = two_view_initialize(
        &scene.intrinsics,
        &corr,
        Some(h),
        Some(scene.fundamental()),
        &config,
    )?;
    let rec = outcome.into_result()?;
    assert_eq!(rec.model.kind(), ModelKind::Homography);
    assert!(rotation_angle(&rec.rotation, &DMat3::IDENTITY) < 1e-6);
    assert!(rec.translation.dot(DVec3::NEG_Z) > 0.999);
    assert_eq!(rec.good_points, 100);
    Ok(())
}
