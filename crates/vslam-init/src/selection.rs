use serde::{Deserialize, Serialize};

/// The two competing two-view motion models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Planar scene or pure rotation, explained by a homography.
    Homography,
    /// General scene, explained by the epipolar constraint.
    Fundamental,
}

/// Outcome of the model selection heuristic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelSelection {
    /// Selected model.
    pub model: ModelKind,
    /// Homography ratio `S_H / (S_H + S_F)`.
    pub ratio: f64,
}

/// Compute the homography ratio `S_H / (S_H + S_F)`.
///
/// Returns 0 when neither model has any support, which routes to the
/// fundamental path.
pub fn homography_ratio(score_h: f64, score_f: f64) -> f64 {
    let total = score_h + score_f;
    if total > 0.0 {
        score_h / total
    } else {
        0.0
    }
}

/// Pick the homography only if its ratio exceeds `threshold`.
pub fn select_model(score_h: f64, score_f: f64, threshold: f64) -> ModelSelection {
    let ratio = homography_ratio(score_h, score_f);
    let model = if ratio > threshold {
        ModelKind::Homography
    } else {
        ModelKind::Fundamental
    };
    log::debug!("model selection: S_H={score_h:.3} S_F={score_f:.3} R_H={ratio:.3} -> {model:?}");
    ModelSelection { model, ratio }
}
