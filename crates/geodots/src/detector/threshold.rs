//! Otsu global thresholding with inverted polarity.
//!
//! Hand-drawn marks are dark ink on lighter paper, so pixels at or below the
//! chosen level become foreground (255) and everything brighter becomes
//! background (0).

use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};

use super::preprocess::histogram;

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Otsu's level, or `None` when fewer than two intensity levels are
/// populated; such an image has no ink/paper split.
pub fn ink_level(gray: &GrayImage) -> Option<u8> {
    let populated = histogram(gray).iter().filter(|&&c| c > 0).count();
    if populated < 2 {
        return None;
    }
    Some(otsu_level(gray))
}

/// Inverted binary threshold: `value <= level` becomes foreground.
pub fn binarize_inverted(gray: &GrayImage, level: u8) -> GrayImage {
    threshold(gray, level, ThresholdType::BinaryInverted)
}

/// Pick the Otsu level and binarize with inverted polarity.
///
/// A uniform image produces an all-background mask and `None`.
pub fn binarize_otsu_inverted(gray: &GrayImage) -> (Option<u8>, GrayImage) {
    match ink_level(gray) {
        Some(level) => (Some(level), binarize_inverted(gray, level)),
        None => (
            None,
            GrayImage::from_pixel(gray.width(), gray.height(), image::Luma([BACKGROUND])),
        ),
    }
}
