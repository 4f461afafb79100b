//! Shared synthetic-image helpers for unit tests.

use image::{GrayImage, Luma};

use crate::{ControlPoint, PixelPoint};

pub(crate) const PAPER: u8 = 235;
pub(crate) const INK: u8 = 25;

/// Fill an axis-aligned `size[0] x size[1]` block whose top-left is `origin`.
pub(crate) fn fill_rect(img: &mut GrayImage, origin: [u32; 2], size: [u32; 2], value: u8) {
    for y in origin[1]..(origin[1] + size[1]).min(img.height()) {
        for x in origin[0]..(origin[0] + size[0]).min(img.width()) {
            img.put_pixel(x, y, Luma([value]));
        }
    }
}

/// Fill every pixel whose center lies within `radius` of `center`.
pub(crate) fn fill_disk(img: &mut GrayImage, center: [f64; 2], radius: f64, value: u8) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - center[0];
            let dy = y as f64 - center[1];
            if dx * dx + dy * dy <= radius * radius {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }
}

/// Light "paper" with dark ink disks of the given radius at each center.
pub(crate) fn draw_dot_map(w: u32, h: u32, centers: &[[f64; 2]], radius: f64) -> GrayImage {
    let mut img = GrayImage::from_pixel(w, h, Luma([PAPER]));
    for &c in centers {
        fill_disk(&mut img, c, radius, INK);
    }
    img
}

/// Control points sampled from `lon = 0.001 x - 101`, `lat = 0.001 y + 43`.
pub(crate) fn affine_control_points(pixels: &[[f64; 2]]) -> Vec<ControlPoint> {
    pixels
        .iter()
        .map(|&[x, y]| ControlPoint::new(x, y, 0.001 * x - 101.0, 0.001 * y + 43.0))
        .collect()
}

pub(crate) fn px(x: i32, y: i32) -> PixelPoint {
    PixelPoint::new(x, y)
}
