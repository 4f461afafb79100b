//! Pixel → (longitude, latitude) mapping through a fitted plane transform.

use nalgebra::Matrix3;

use crate::error::{Error, Result};
use crate::homography::{
    array_to_matrix3, ensure_finite, fit_homography, matrix3_to_array, project_h, FitConfig,
    HomographyFit, W_EPS,
};
use crate::{ControlPoint, GeoPoint, PixelPoint};

/// Applies one fitted transform to any number of pixel points.
///
/// The matrix is solved once at construction and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Georeferencer {
    h: Matrix3<f64>,
    fit: Option<HomographyFit>,
}

impl Georeferencer {
    /// Fit from control points with the default options (least squares,
    /// affine for 3 points, projective for more).
    pub fn new(control: &[ControlPoint]) -> Result<Self> {
        Self::with_config(control, &FitConfig::default())
    }

    pub fn with_config(control: &[ControlPoint], config: &FitConfig) -> Result<Self> {
        Ok(Self::from_fit(fit_homography(control, config)?))
    }

    /// Wrap an already fitted transform.
    pub fn from_fit(fit: HomographyFit) -> Self {
        Self {
            h: fit.h(),
            fit: Some(fit),
        }
    }

    /// Use a known row-major pixel → geographic matrix.
    pub fn from_matrix(matrix: [[f64; 3]; 3]) -> Result<Self> {
        let h = array_to_matrix3(&matrix);
        ensure_finite(&h)?;
        // Hadamard bound: |det| <= product of column norms.
        let bound: f64 = h.column_iter().map(|c| c.norm()).product();
        if !(h.determinant().abs() > 1e-12 * bound) {
            return Err(Error::InvalidConfig(
                "transform matrix is singular".to_string(),
            ));
        }
        Ok(Self { h, fit: None })
    }

    pub fn matrix(&self) -> [[f64; 3]; 3] {
        matrix3_to_array(&self.h)
    }

    /// Fit diagnostics; `None` when built from a known matrix.
    pub fn fit(&self) -> Option<&HomographyFit> {
        self.fit.as_ref()
    }

    /// Map one pixel position; `index` is only used in the error.
    fn map(&self, index: usize, x: f64, y: f64) -> Result<GeoPoint> {
        let ([lon, lat], w) = project_h(&self.h, x, y);
        if !w.is_finite() || w.abs() < W_EPS || !lon.is_finite() || !lat.is_finite() {
            return Err(Error::DegenerateTransform { index, x, y, w });
        }
        Ok(GeoPoint::new(lon, lat))
    }

    /// Map a single pixel. A `DegenerateTransform` error carries index 0.
    pub fn georeference_point(&self, p: PixelPoint) -> Result<GeoPoint> {
        self.map(0, p.x as f64, p.y as f64)
    }

    /// Map every pixel point, output in input order. Fails on the first
    /// point whose homogeneous normalizer vanishes.
    pub fn georeference(&self, points: &[PixelPoint]) -> Result<Vec<GeoPoint>> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| self.map(i, p.x as f64, p.y as f64))
            .collect()
    }

    /// Sub-pixel variant of [`Georeferencer::georeference`].
    pub fn georeference_subpixel(&self, points: &[[f64; 2]]) -> Result<Vec<GeoPoint>> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| self.map(i, p[0], p[1]))
            .collect()
    }
}

/// Fit a transform from `control` and map `points` through it.
pub fn georeference(points: &[PixelPoint], control: &[ControlPoint]) -> Result<Vec<GeoPoint>> {
    let georef = Georeferencer::new(control)?;
    let out = georef.georeference(points)?;
    tracing::info!("Georeferenced {} points", out.len());
    Ok(out)
}
