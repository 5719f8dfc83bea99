mod common;

use glam::DVec3;
use vslam_init::estimate::homography_dlt;
use vslam_init::scoring::{check_fundamental, check_homography};
use vslam_init::selection::{homography_ratio, select_model};
use vslam_init::{ModelKind, ScoringParams};

#[test]
fn test_planar_scene_selects_homography() {
    let scene = common::planar_scene(80, 1);
    let corr = scene.correspondences();
    let params = ScoringParams::default();

    let s_h = check_homography(&corr, &scene.plane_homography(DVec3::Z, 5.0), &params);
    let s_f = check_fundamental(&corr, &scene.fundamental(), &params);
    assert_eq!(s_h.inlier_count, 80);
    assert_eq!(s_f.inlier_count, 80);

    let selection = select_model(s_h.score, s_f.score, 0.45);
    assert!(selection.ratio > 0.45);
    assert_eq!(selection.model, ModelKind::Homography);
}

#[test]
fn test_general_scene_selects_fundamental() -> Result<(), Box<dyn std::error::Error>> {
    let scene = common::general_scene(80, 2);
    let corr = scene.correspondences();
    let params = ScoringParams::default();

    // best homography in the algebraic least-squares sense
    let h = homography_dlt(corr.reference(), corr.target())?;
    let s_h = check_homography(&corr, &h, &params);
    let s_f = check_fundamental(&corr, &scene.fundamental(), &params);
    assert_eq!(s_f.inlier_count, 80);
    assert!(s_h.inlier_count < s_f.inlier_count);

    let selection = select_model(s_h.score, s_f.score, 0.45);
    assert!(homography_ratio(s_h.score, s_f.score) < 0.45);
    assert_eq!(selection.model, ModelKind::Fundamental);
    Ok(())
}

#[test]
fn test_less_noise_never_lowers_the_score() {
    let planar = common::planar_scene(60, 3);
    let h = planar.plane_homography(DVec3::Z, 5.0);
    let general = common::general_scene(60, 4);
    let f = general.fundamental();
    let params = ScoringParams::default();

    let mut last_h = (0usize, f64::NEG_INFINITY);
    let mut last_f = (0usize, f64::NEG_INFINITY);
    for sigma in [4.0, 2.0, 1.0, 0.5, 0.0] {
        let res = check_homography(&planar.with_target_noise(sigma, 9), &h, &params);
        assert!(res.inlier_count >= last_h.0);
        assert!(res.score >= last_h.1 - 1e-9);
        last_h = (res.inlier_count, res.score);

        let res = check_fundamental(&general.with_target_noise(sigma, 9), &f, &params);
        assert!(res.inlier_count >= last_f.0);
        assert!(res.score >= last_f.1 - 1e-9);
        last_f = (res.inlier_count, res.score);
    }

    assert_eq!(last_h.0, 60);
    assert_eq!(last_f.0, 60);
}
