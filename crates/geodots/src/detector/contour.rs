//! External contour extraction and polygon moments on binary masks.
//!
//! Border following comes from `imageproc::contours` (Suzuki-Abe, 8-connected
//! foreground). Only outer borders without a parent are kept: hole boundaries
//! are skipped, and components sitting inside another component's hole are
//! not reported at all.

use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};

/// Closed boundary polyline of one foreground component, in pixel centers.
///
/// Starts at the component's top-left pixel; the closing edge back to the
/// first point is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<[i32; 2]>,
}

/// Zeroth and first raw moments of a contour polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    /// `(m10/m00, m01/m00)`, or `None` for a degenerate (zero-area) polygon.
    pub fn centroid(&self) -> Option<[f64; 2]> {
        if self.m00 == 0.0 || !self.m00.is_finite() {
            return None;
        }
        Some([self.m10 / self.m00, self.m01 / self.m00])
    }
}

/// Outer contours of every top-level foreground component, in raster order of
/// each component's top-left pixel. Non-zero pixels are foreground.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    let (w, h) = binary.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }

    // Border following treats the outermost ring of pixels as frame; pad so
    // components touching the image edge are traced like any other.
    let mut padded = GrayImage::new(w + 2, h + 2);
    imageops::replace(&mut padded, binary, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour {
            points: c.points.iter().map(|p| [p.x - 1, p.y - 1]).collect(),
        })
        .collect()
}

/// Enclosed polygon area (shoelace). Zero for fewer than three points.
pub fn contour_area(contour: &Contour) -> f64 {
    contour_moments(contour).m00.abs()
}

/// Raw polygon moments via Green's theorem.
///
/// Signs follow the traversal direction; the centroid ratio is
/// sign-independent.
pub fn contour_moments(contour: &Contour) -> Moments {
    let pts = &contour.points;
    let n = pts.len();
    let mut m = Moments {
        m00: 0.0,
        m10: 0.0,
        m01: 0.0,
    };
    if n < 3 {
        return m;
    }
    for i in 0..n {
        let [x0, y0] = pts[i];
        let [x1, y1] = pts[(i + 1) % n];
        let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        let cross = x0 * y1 - x1 * y0;
        m.m00 += cross;
        m.m10 += (x0 + x1) * cross;
        m.m01 += (y0 + y1) * cross;
    }
    m.m00 *= 0.5;
    m.m10 /= 6.0;
    m.m01 /= 6.0;
    m
}
