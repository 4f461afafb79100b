//! Visualization output: circles drawn at detected dots on a copy of the scan.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use super::MarkerStyle;
use crate::error::{Error, Result};
use crate::PixelPoint;

/// Receiver for the annotated copy of the input image.
pub trait AnnotationSink {
    fn accept(&mut self, annotated: RgbImage) -> Result<()>;
}

/// Writes the annotated image to disk; the format follows the extension.
#[derive(Debug, Clone)]
pub struct ImageFileSink {
    path: PathBuf,
}

impl ImageFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnnotationSink for ImageFileSink {
    fn accept(&mut self, annotated: RgbImage) -> Result<()> {
        annotated.save(&self.path).map_err(|source| Error::ImageWrite {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!("Visualization written to {}", self.path.display());
        Ok(())
    }
}

/// RGB copy of `image` with a circle at every point.
pub fn draw_markers(image: &DynamicImage, points: &[PixelPoint], style: &MarkerStyle) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let color = Rgb(style.color);
    for p in points {
        let center = (p.x, p.y);
        if style.thickness_px <= 0 {
            draw_filled_circle_mut(&mut canvas, center, style.radius_px, color);
            continue;
        }
        let inner = style.radius_px - style.thickness_px / 2;
        for k in 0..style.thickness_px {
            let r = inner + k;
            if r >= 0 {
                draw_hollow_circle_mut(&mut canvas, center, r, color);
            }
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn circles_are_drawn_around_points_only() {
        let gray = GrayImage::from_pixel(40, 40, Luma([200]));
        let img = DynamicImage::ImageLuma8(gray);
        let style = MarkerStyle::default();
        let out = draw_markers(&img, &[PixelPoint::new(20, 20)], &style);

        assert_eq!(out.dimensions(), (40, 40));
        assert_eq!(*out.get_pixel(25, 20), Rgb([255, 0, 0]));
        assert_eq!(*out.get_pixel(20, 20), Rgb([200, 200, 200]));
        assert_eq!(*out.get_pixel(2, 2), Rgb([200, 200, 200]));
    }

    #[test]
    fn filled_style_covers_center() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([0])));
        let style = MarkerStyle {
            thickness_px: -1,
            color: [0, 255, 0],
            ..MarkerStyle::default()
        };
        let out = draw_markers(&img, &[PixelPoint::new(10, 10)], &style);
        assert_eq!(*out.get_pixel(10, 10), Rgb([0, 255, 0]));
    }

    #[test]
    fn points_near_edges_are_clipped() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([90])));
        let out = draw_markers(&img, &[PixelPoint::new(0, 0), PixelPoint::new(7, 7)], &MarkerStyle::default());
        assert_eq!(out.dimensions(), (8, 8));
    }

    #[test]
    fn file_sink_writes_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("annotated.png");
        let mut sink = ImageFileSink::new(&path);
        sink.accept(RgbImage::new(4, 4)).expect("write");
        let back = image::open(&path).expect("decode");
        assert_eq!(back.width(), 4);
    }
}
