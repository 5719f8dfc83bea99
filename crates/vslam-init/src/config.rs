use serde::{Deserialize, Serialize};

use crate::error::InitError;

/// Parameters of the per-model inlier check and score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Standard deviation of the keypoint measurement noise, in pixels.
    pub sigma: f64,
    /// Chi-square threshold of the symmetric homography transfer error (2 DOF, 95%).
    pub homography_threshold: f64,
    /// Chi-square threshold of the epipolar error (1 DOF, 95%).
    pub fundamental_threshold: f64,
    /// Score offset of an accepted epipolar residual.
    ///
    /// Uses the 2 DOF value so that both models are scored on the same scale.
    pub fundamental_score: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            homography_threshold: 5.991,
            fundamental_threshold: 3.841,
            fundamental_score: 5.991,
        }
    }
}

/// Parameters of the iterative linear least-squares triangulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationParams {
    /// Maximum number of reweighting iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the change of the projective depth weights.
    pub epsilon: f64,
}

impl Default for TriangulationParams {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            epsilon: 1e-4,
        }
    }
}

/// Configuration for two-view map initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializerConfig {
    /// Prefer the homography when `S_H / (S_H + S_F)` is above this ratio.
    pub homography_selection_ratio: f64,
    /// Inlier check and scoring parameters.
    pub scoring: ScoringParams,
    /// Minimum number of good triangulated points of the winning hypothesis.
    ///
    /// Also the rank at which the parallax of the reconstruction is measured.
    pub min_good_points: usize,
    /// Minimum parallax angle of the reconstruction, in degrees.
    pub min_parallax_deg: f64,
    /// Minimum normalized triangulation score on the homography path.
    pub min_homography_score: f64,
    /// Minimum normalized triangulation score on the fundamental path.
    pub min_fundamental_score: f64,
    /// Maximum reprojection error of a triangulated point (squared pixels).
    pub reprojection_threshold: f64,
    /// Cosine of the parallax above which the cheirality check is skipped.
    pub degenerate_cos_parallax: f64,
    /// Relative spread `(d1 - d3) / d1` of the normalized homography singular
    /// values at or below which the motion is treated as a pure rotation.
    pub singular_value_tolerance: f64,
    /// Triangulation parameters.
    pub triangulation: TriangulationParams,
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            homography_selection_ratio: 0.45,
            scoring: ScoringParams::default(),
            min_good_points: 15,
            min_parallax_deg: 1.0,
            min_homography_score: 0.4,
            min_fundamental_score: 0.7,
            reprojection_threshold: 4.0,
            degenerate_cos_parallax: 0.9998,
            singular_value_tolerance: 1e-6,
            triangulation: TriangulationParams::default(),
        }
    }
}

impl InitializerConfig {
    /// Check that every parameter is finite and within its valid range.
    pub fn validate(&self) -> Result<(), InitError> {
        let positive = [
            ("scoring.sigma", self.scoring.sigma),
            (
                "scoring.homography_threshold",
                self.scoring.homography_threshold,
            ),
            (
                "scoring.fundamental_threshold",
                self.scoring.fundamental_threshold,
            ),
            ("scoring.fundamental_score", self.scoring.fundamental_score),
            ("reprojection_threshold", self.reprojection_threshold),
            ("triangulation.epsilon", self.triangulation.epsilon),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(InitError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        let unit_interval = [
            ("homography_selection_ratio", self.homography_selection_ratio),
            ("min_homography_score", self.min_homography_score),
            ("min_fundamental_score", self.min_fundamental_score),
            ("degenerate_cos_parallax", self.degenerate_cos_parallax),
            ("singular_value_tolerance", self.singular_value_tolerance),
        ];
        for (name, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                return Err(InitError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }

        if !(0.0..180.0).contains(&self.min_parallax_deg) {
            return Err(InitError::InvalidConfig(format!(
                "min_parallax_deg must be in [0, 180), got {}",
                self.min_parallax_deg
            )));
        }
        if self.triangulation.max_iterations == 0 {
            return Err(InitError::InvalidConfig(
                "triangulation.max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(InitializerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = InitializerConfig {
            min_fundamental_score: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(InitError::InvalidConfig(_))
        ));

        let mut config = InitializerConfig::default();
        config.scoring.sigma = 0.0;
        assert!(config.validate().is_err());

        let mut config = InitializerConfig::default();
        config.triangulation.max_iterations = 0;
        assert!(config.validate().is_err());

        let config = InitializerConfig {
            reprojection_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = InitializerConfig {
            singular_value_tolerance: -1e-3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<(), serde_json::Error> {
        let json = r#"{ "min_good_points": 50, "scoring": { "sigma": 2.0 } }"#;
        let config: InitializerConfig = serde_json::from_str(json)?;
        assert_eq!(config.min_good_points, 50);
        assert_eq!(config.scoring.sigma, 2.0);
        assert_eq!(config.scoring.homography_threshold, 5.991);
        assert_eq!(config.min_parallax_deg, 1.0);
        Ok(())
    }
}
