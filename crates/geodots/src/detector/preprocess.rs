//! Intensity conversion and contrast normalization.
//!
//! Scans of paper maps vary widely in exposure and paper tone. Histogram
//! equalization spreads the intensity distribution before thresholding so the
//! Otsu split lands between ink and paper regardless of scan brightness.

use image::{DynamicImage, GrayImage};

/// Convert any decoded raster to a single-channel 8-bit intensity image.
///
/// Alpha is dropped; color images are reduced to luma.
pub fn to_intensity(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// 256-bin intensity histogram.
pub fn histogram(gray: &GrayImage) -> [u32; 256] {
    imageproc::stats::histogram(gray).channels[0]
}

/// Global histogram equalization.
///
/// Uses `round((cdf(v) - cdf_min) / (N - cdf_min) * 255)`, so the darkest
/// populated level maps to 0 and the brightest to 255. A uniform image (one
/// populated level) is returned unchanged. `imageproc::contrast::equalize_histogram`
/// scales by `cdf(v) / N` instead and never maps the darkest level to 0.
pub fn equalize_histogram(gray: &GrayImage) -> GrayImage {
    let raw = gray.as_raw();
    if raw.is_empty() {
        return gray.clone();
    }

    let hist = histogram(gray);
    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (level, &count) in hist.iter().enumerate() {
        running += count as u64;
        cdf[level] = running;
    }

    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let total = raw.len() as u64;
    if total <= cdf_min {
        return gray.clone();
    }

    let denom = (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    for (level, slot) in lut.iter_mut().enumerate() {
        let v = cdf[level].saturating_sub(cdf_min) as f64 / denom * 255.0;
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }

    let mut out = gray.clone();
    for px in out.iter_mut() {
        *px = lut[*px as usize];
    }
    out
}
