use nalgebra::Matrix3;

use super::core::{
    array_to_matrix3, check_spread, estimate_affine, estimate_projective, matrix3_to_array,
    residuals, rms_and_max, Solved,
};
use super::ransac::{fit_ransac, RansacConfig};
use crate::control::{split_correspondences, validate_control_points};
use crate::error::{ControlPointDeficiency, Error, Result};
use crate::ControlPoint;

/// Plane transform family fitted to the control points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformModel {
    /// Affine for exactly 3 control points, projective for 4 or more.
    #[default]
    Auto,
    /// Six-parameter affine; least squares for more than 3 points.
    Affine,
    /// Eight-parameter homography; needs at least 4 points.
    Projective,
}

impl TransformModel {
    /// Minimal correspondence count for the model.
    pub fn min_points(self) -> usize {
        match self {
            Self::Auto | Self::Affine => 3,
            Self::Projective => 4,
        }
    }

    fn resolve(self, n: usize) -> Self {
        match self {
            Self::Auto if n <= 3 => Self::Affine,
            Self::Auto => Self::Projective,
            other => other,
        }
    }
}

/// How correspondences are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Every control point contributes.
    #[default]
    LeastSquares,
    /// Seeded consensus over minimal samples, refit on inliers.
    Ransac,
}

/// Transform fitting options.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    pub model: TransformModel,
    pub method: FitMethod,
    pub ransac: RansacConfig,
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.method == FitMethod::Ransac {
            let r = &self.ransac;
            if !r.inlier_threshold.is_finite() || r.inlier_threshold <= 0.0 {
                return Err(Error::InvalidConfig(
                    "ransac.inlier_threshold must be finite and > 0".to_string(),
                ));
            }
            if r.max_iters == 0 {
                return Err(Error::InvalidConfig(
                    "ransac.max_iters must be > 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A fitted pixel → geographic transform with its quality figures.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HomographyFit {
    /// Row-major 3×3 matrix mapping `(x, y, 1)` to homogeneous `(lon, lat, w)`.
    pub matrix: [[f64; 3]; 3],
    /// Model actually fitted (`auto` is resolved).
    pub model: TransformModel,
    pub method: FitMethod,
    /// Per-control-point residual in destination units, input order.
    pub residuals: Vec<f64>,
    pub rms_residual: f64,
    pub max_residual: f64,
    /// Singular value ratio of the linear system (1 = perfectly conditioned).
    pub conditioning: f64,
    /// Which control points supported the model; all `true` for least squares.
    pub inlier_mask: Vec<bool>,
}

impl HomographyFit {
    pub fn h(&self) -> Matrix3<f64> {
        array_to_matrix3(&self.matrix)
    }

    pub fn n_inliers(&self) -> usize {
        self.inlier_mask.iter().filter(|&&m| m).count()
    }
}

/// Fit the pixel → (longitude, latitude) transform from control points.
pub fn fit_homography(control: &[ControlPoint], config: &FitConfig) -> Result<HomographyFit> {
    config.validate()?;
    validate_control_points(control)?;

    let n = control.len();
    let deficient = |reason| Error::InsufficientControlPoints { count: n, reason };

    if n < config.model.min_points() {
        return Err(Error::too_few(n, config.model.min_points()));
    }
    let model = config.model.resolve(n);
    if config.method == FitMethod::Ransac && n <= model.min_points() {
        return Err(Error::InvalidConfig(format!(
            "RANSAC needs more than {} control points for a {:?} fit, got {}; \
             use least squares or add control points",
            model.min_points(),
            model,
            n
        )));
    }

    let (src, dst) = split_correspondences(control);
    check_spread(&src, &dst).map_err(deficient)?;

    let solver: fn(&[[f64; 2]], &[[f64; 2]]) -> std::result::Result<Solved, ControlPointDeficiency> =
        match model {
            TransformModel::Projective => estimate_projective,
            _ => estimate_affine,
        };

    let (solved, inlier_mask): (Solved, Vec<bool>) = match config.method {
        FitMethod::LeastSquares => (solver(&src, &dst).map_err(deficient)?, vec![true; n]),
        FitMethod::Ransac => {
            let out = fit_ransac(&src, &dst, model.min_points(), &config.ransac, solver)
                .map_err(deficient)?;
            (out.solved, out.inlier_mask)
        }
    };

    if solved.h.iter().any(|v| !v.is_finite()) {
        return Err(deficient(ControlPointDeficiency::IllConditioned {
            ratio: solved.conditioning,
        }));
    }

    let residuals = residuals(&solved.h, &src, &dst);
    let (rms_residual, max_residual) = rms_and_max(&residuals);

    tracing::info!(
        "Fitted {:?} transform from {} control points: rms residual {:.3e}, max {:.3e}",
        model,
        n,
        rms_residual,
        max_residual
    );
    for (i, (cp, r)) in control.iter().zip(&residuals).enumerate() {
        tracing::debug!(
            index = i,
            label = cp.label.as_deref().unwrap_or(""),
            inlier = inlier_mask[i],
            residual = *r,
            "control point residual"
        );
    }

    Ok(HomographyFit {
        matrix: matrix3_to_array(&solved.h),
        model,
        method: config.method,
        residuals,
        rms_residual,
        max_residual,
        conditioning: solved.conditioning,
        inlier_mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homography::core::project;
    use crate::test_utils::affine_control_points;
    use approx::assert_relative_eq;

    #[test]
    fn auto_resolves_by_point_count() {
        let three = affine_control_points(&[[0.0, 0.0], [100.0, 0.0], [0.0, 100.0]]);
        let fit = fit_homography(&three, &FitConfig::default()).expect("fit");
        assert_eq!(fit.model, TransformModel::Affine);
        assert_eq!(fit.matrix[2], [0.0, 0.0, 1.0]);

        let four = affine_control_points(&[[0.0, 0.0], [100.0, 0.0], [0.0, 100.0], [90.0, 120.0]]);
        let fit = fit_homography(&four, &FitConfig::default()).expect("fit");
        assert_eq!(fit.model, TransformModel::Projective);
        assert!(fit.rms_residual < 1e-9);
        assert_eq!(fit.n_inliers(), 4);
    }

    #[test]
    fn projective_model_needs_four_points() {
        let three = affine_control_points(&[[0.0, 0.0], [100.0, 0.0], [0.0, 100.0]]);
        let cfg = FitConfig {
            model: TransformModel::Projective,
            ..FitConfig::default()
        };
        let err = fit_homography(&three, &cfg).expect_err("too few");
        assert!(matches!(
            err,
            Error::InsufficientControlPoints {
                count: 3,
                reason: ControlPointDeficiency::TooFew { needed: 4 }
            }
        ));
    }

    #[test]
    fn affine_least_squares_averages_noise() {
        let mut cps = affine_control_points(&[
            [0.0, 0.0],
            [200.0, 0.0],
            [0.0, 200.0],
            [200.0, 200.0],
            [100.0, 50.0],
        ]);
        cps[4].latitude += 2e-5;
        let cfg = FitConfig {
            model: TransformModel::Affine,
            ..FitConfig::default()
        };
        let fit = fit_homography(&cps, &cfg).expect("fit");
        assert!(fit.max_residual > 0.0 && fit.max_residual < 2e-5);
        assert_eq!(fit.residuals.len(), 5);
    }

    #[test]
    fn collinear_geographic_side_is_reported() {
        let cps = vec![
            ControlPoint::new(0.0, 0.0, -101.0, 43.0),
            ControlPoint::new(100.0, 0.0, -100.9, 43.1),
            ControlPoint::new(0.0, 100.0, -100.8, 43.2),
        ];
        let err = fit_homography(&cps, &FitConfig::default()).expect_err("collinear");
        assert!(matches!(
            err,
            Error::InsufficientControlPoints {
                reason: ControlPointDeficiency::CollinearGeographic,
                ..
            }
        ));
    }

    #[test]
    fn ransac_drops_misplaced_control_point() {
        let mut cps = affine_control_points(&[
            [0.0, 0.0],
            [400.0, 0.0],
            [0.0, 300.0],
            [400.0, 300.0],
            [200.0, 150.0],
            [100.0, 250.0],
        ]);
        cps[5].longitude += 0.05;
        let cfg = FitConfig {
            model: TransformModel::Affine,
            method: FitMethod::Ransac,
            ransac: RansacConfig {
                inlier_threshold: 1e-6,
                ..RansacConfig::default()
            },
        };
        let fit = fit_homography(&cps, &cfg).expect("fit");
        assert_eq!(fit.inlier_mask, vec![true, true, true, true, true, false]);
        let p = project(&fit.h(), 200.0, 150.0);
        assert_relative_eq!(p[0], 0.2 - 101.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 43.15, epsilon = 1e-9);
    }

    #[test]
    fn ransac_with_minimal_survey_points_is_a_config_error() {
        let survey = vec![
            ControlPoint::new(100.0, 150.0, -101.2345, 43.1234),
            ControlPoint::new(2500.0, 300.0, -100.9876, 43.1567),
            ControlPoint::new(800.0, 1800.0, -101.1234, 42.9876),
        ];
        let cfg = FitConfig {
            method: FitMethod::Ransac,
            ..FitConfig::default()
        };
        let err = fit_homography(&survey, &cfg).expect_err("no redundancy");
        assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
        assert!(err.to_string().contains("least squares"), "{err}");

        let least_squares = fit_homography(&survey, &FitConfig::default()).expect("fit");
        assert_eq!(least_squares.model, TransformModel::Affine);
    }

    #[test]
    fn ransac_default_min_inliers_fits_four_affine_points() {
        let mut cps = affine_control_points(&[[0.0, 0.0], [300.0, 0.0], [0.0, 300.0], [300.0, 300.0]]);
        cps[3].latitude += 1e-7;
        let cfg = FitConfig {
            model: TransformModel::Affine,
            method: FitMethod::Ransac,
            ..FitConfig::default()
        };
        let fit = fit_homography(&cps, &cfg).expect("fit");
        assert_eq!(fit.n_inliers(), 4);
    }

    #[test]
    fn invalid_ransac_threshold_is_rejected() {
        let cfg = FitConfig {
            method: FitMethod::Ransac,
            ransac: RansacConfig {
                inlier_threshold: 0.0,
                ..RansacConfig::default()
            },
            ..FitConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn config_parses_snake_case_names() {
        let cfg: FitConfig =
            serde_json::from_str(r#"{"model": "projective", "method": "ransac"}"#).expect("json");
        assert_eq!(cfg.model, TransformModel::Projective);
        assert_eq!(cfg.method, FitMethod::Ransac);
        assert_eq!(cfg.ransac, RansacConfig::default());
    }
}
