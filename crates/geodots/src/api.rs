//! High-level detection API.
//!
//! [`DotDetector`] is the primary entry point for finding dots on a scan.
//! It wraps a validated [`DetectConfig`] and offers file and in-memory
//! variants, with or without a visualization sink.

use std::path::Path;

use image::{DynamicImage, GrayImage};

use crate::detector::{self, draw_markers, AnnotationSink, DetectConfig};
use crate::error::{Error, Result};
use crate::{DetectionResult, PixelPoint};

/// Primary detection interface.
///
/// Create once, detect on many images.
///
/// # Examples
///
/// ```no_run
/// use geodots::{DetectConfig, DotDetector};
/// use std::path::Path;
///
/// let detector = DotDetector::new(DetectConfig::default()).unwrap();
/// let (_image, result) = detector.detect_file(Path::new("historical_map.jpg")).unwrap();
/// println!("Found {} dots", result.dots.len());
/// ```
#[derive(Debug, Clone)]
pub struct DotDetector {
    config: DetectConfig,
}

impl Default for DotDetector {
    fn default() -> Self {
        Self {
            config: DetectConfig::default(),
        }
    }
}

impl DotDetector {
    pub fn new(config: DetectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Default configuration with explicit area bounds.
    pub fn with_size_range(size_min: f64, size_max: f64) -> Result<Self> {
        Self::new(DetectConfig::with_size_range(size_min, size_max))
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Detect on a grayscale image.
    pub fn detect_gray(&self, gray: &GrayImage) -> DetectionResult {
        let result = detector::detect_dots(gray, &self.config);
        tracing::info!(
            "Detected {} dots ({} contours, {} outside area window)",
            result.dots.len(),
            result.n_contours,
            result.n_rejected_area
        );
        if result.n_degenerate > 0 {
            tracing::warn!("{} degenerate contours skipped", result.n_degenerate);
        }
        result
    }

    /// Detect on any decoded raster.
    pub fn detect(&self, image: &DynamicImage) -> DetectionResult {
        self.detect_gray(&detector::to_intensity(image))
    }

    /// Detect and hand an annotated copy of `image` to `sink`.
    ///
    /// The returned detections do not depend on the sink.
    pub fn detect_with_sink(
        &self,
        image: &DynamicImage,
        sink: &mut dyn AnnotationSink,
    ) -> Result<DetectionResult> {
        let result = self.detect(image);
        let annotated = draw_markers(image, &result.pixel_points(), &self.config.marker);
        sink.accept(annotated)?;
        Ok(result)
    }

    /// Load an image from disk and detect on it. The decoded image is
    /// returned as well so callers can annotate it.
    pub fn detect_file(&self, path: &Path) -> Result<(DynamicImage, DetectionResult)> {
        let image = load_image(path)?;
        let result = self.detect(&image);
        Ok((image, result))
    }
}

/// Decode an image file, mapping failures to [`Error::ImageLoad`].
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    tracing::info!("Loading image: {}", path.display());
    image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Centroids of dots whose contour area lies strictly inside
/// `(size_min, size_max)`, in discovery order.
///
/// An empty or inverted area window yields no detections.
pub fn detect(image: &DynamicImage, size_min: f64, size_max: f64) -> Vec<PixelPoint> {
    let config = DetectConfig::with_size_range(size_min, size_max);
    detector::detect_dots(&detector::to_intensity(image), &config).pixel_points()
}
