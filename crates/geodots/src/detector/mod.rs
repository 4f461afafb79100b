//! Dot detection stages and the glue that runs them in order.
//!
//! equalize -> inverted Otsu -> external contours -> area window -> centroid
//! -> optional proximity dedup.

mod annotate;
mod config;
mod contour;
mod dedup;
mod preprocess;
mod threshold;

pub use annotate::{draw_markers, AnnotationSink, ImageFileSink};
pub use config::{DetectConfig, MarkerStyle};
pub(crate) use preprocess::to_intensity;

use image::GrayImage;

use crate::{DetectionResult, Dot};

/// Run the full detection chain on a grayscale image.
///
/// The area window is exclusive at both ends. Output order follows contour
/// discovery (raster order of each component's top-left pixel).
pub(crate) fn detect_dots(gray: &GrayImage, config: &DetectConfig) -> DetectionResult {
    let (w, h) = gray.dimensions();
    let mut result = DetectionResult::empty(w, h);
    if w == 0 || h == 0 {
        return result;
    }

    let equalized;
    let source = if config.equalize {
        equalized = preprocess::equalize_histogram(gray);
        &equalized
    } else {
        gray
    };

    let (level, mask) = threshold::binarize_otsu_inverted(source);
    result.threshold = level;
    if level.is_none() {
        tracing::debug!("single gray level; no foreground");
        return result;
    }

    let contours = contour::find_external_contours(&mask);
    result.n_contours = contours.len();

    let mut dots = Vec::new();
    for c in &contours {
        let area = contour::contour_area(c);
        if !(area > config.size_min && area < config.size_max) {
            result.n_rejected_area += 1;
            continue;
        }
        let Some(centroid) = contour::contour_moments(c).centroid() else {
            result.n_degenerate += 1;
            continue;
        };
        dots.push(Dot::from_centroid(centroid, area));
    }

    if let Some(radius) = config.dedup_radius_px {
        let before = dots.len();
        dots = dedup::dedup_by_proximity(dots, radius);
        result.n_merged = before - dots.len();
    }

    tracing::debug!(
        threshold = ?level,
        contours = result.n_contours,
        rejected_area = result.n_rejected_area,
        degenerate = result.n_degenerate,
        merged = result.n_merged,
        "detection stages complete"
    );

    result.dots = dots;
    result
}
