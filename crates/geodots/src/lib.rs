//! geodots: detect hand-drawn dots on scanned maps and georeference them.
//!
//! The pipeline stages are:
//!
//! 1. **Preprocess** – grayscale conversion and global histogram equalization.
//! 2. **Threshold** – inverted Otsu binarization (dark ink becomes foreground).
//! 3. **Contours** – outer boundaries of top-level foreground components.
//! 4. **Filter** – exclusive area bounds, then moment centroids.
//! 5. **Georeference** – pixel → (longitude, latitude) through a 3×3 plane
//!    transform fitted from control points.
//!
//! # Public API
//! - [`DotDetector`] and [`detect`] for finding dots
//! - [`Georeferencer`] and [`georeference`] for mapping them
//! - [`JobConfig`] and [`run_job`] for the end-to-end batch run
//! - export helpers for CSV and JSON output

mod api;
mod control;
mod detector;
mod error;
mod export;
mod georef;
mod homography;
mod job;
mod pipeline;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::{detect, load_image, DotDetector};
pub use control::ControlPoint;
pub use detector::{
    draw_markers, AnnotationSink, DetectConfig, ImageFileSink, MarkerStyle,
};
pub use error::{ControlPointDeficiency, Error, Result};
pub use export::{
    write_geo_csv, write_geo_csv_file, write_json_file, write_pixel_csv, write_pixel_csv_file,
};
pub use georef::{georeference, Georeferencer};
pub use homography::{fit_homography, FitConfig, FitMethod, HomographyFit, RansacConfig, TransformModel};
pub use job::{JobConfig, JOB_SCHEMA_V1};
pub use pipeline::{run_job, JobReport};

/// Integer pixel location, origin at the top-left, x right, y down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncate a sub-pixel centroid toward zero.
    pub fn from_centroid(c: [f64; 2]) -> Self {
        Self {
            x: c[0] as i32,
            y: c[1] as i32,
        }
    }

    pub fn to_f64(self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

/// Geographic position in decimal degrees (WGS84 by convention; the
/// transform does not care about the datum).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// One detected dot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dot {
    /// Truncated centroid; what gets georeferenced and exported.
    pub pixel: PixelPoint,
    /// Sub-pixel moment centroid `(m10/m00, m01/m00)`.
    pub centroid: [f64; 2],
    /// Enclosed contour area in px².
    pub area: f64,
}

impl Dot {
    pub fn from_centroid(centroid: [f64; 2], area: f64) -> Self {
        Self {
            pixel: PixelPoint::from_centroid(centroid),
            centroid,
            area,
        }
    }
}

/// Full detection result for a single image.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectionResult {
    /// Accepted dots in contour discovery order.
    pub dots: Vec<Dot>,
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
    /// Otsu level used for binarization; `None` when the image had a single
    /// gray level and nothing was classified as ink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
    /// External contours found in the binary mask.
    pub n_contours: usize,
    /// Contours outside the `(size_min, size_max)` area window.
    pub n_rejected_area: usize,
    /// Contours with a zero zeroth moment.
    pub n_degenerate: usize,
    /// Dots dropped by proximity dedup.
    pub n_merged: usize,
}

impl DetectionResult {
    /// Construct an empty result for an image with the provided dimensions.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            dots: Vec::new(),
            image_size: [width, height],
            threshold: None,
            n_contours: 0,
            n_rejected_area: 0,
            n_degenerate: 0,
            n_merged: 0,
        }
    }

    /// Truncated pixel centroids in detection order.
    pub fn pixel_points(&self) -> Vec<PixelPoint> {
        self.dots.iter().map(|d| d.pixel).collect()
    }
}
