//! Control points: known pixel ↔ geographic correspondences.

use crate::error::{Error, Result};
use crate::{GeoPoint, PixelPoint};

/// A landmark whose position is known both on the scan and on the ground.
///
/// The ground position is in decimal degrees; projected coordinates are
/// rejected by validation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlPoint {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub longitude: f64,
    pub latitude: f64,
    /// Free-form description, e.g. "Top-left known point".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ControlPoint {
    pub fn new(pixel_x: f64, pixel_y: f64, longitude: f64, latitude: f64) -> Self {
        Self {
            pixel_x,
            pixel_y,
            longitude,
            latitude,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn pixel(&self) -> [f64; 2] {
        [self.pixel_x, self.pixel_y]
    }

    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }

    /// Distance in pixels from this point's pixel position to `p`.
    pub fn pixel_distance(&self, p: PixelPoint) -> f64 {
        let dx = p.x as f64 - self.pixel_x;
        let dy = p.y as f64 - self.pixel_y;
        dx.hypot(dy)
    }

    fn name(&self, index: usize) -> String {
        match &self.label {
            Some(label) => format!("#{index} ({label})"),
            None => format!("#{index}"),
        }
    }
}

/// Reject non-finite coordinates and out-of-range longitude/latitude.
pub(crate) fn validate_control_points(points: &[ControlPoint]) -> Result<()> {
    for (i, cp) in points.iter().enumerate() {
        let coords = [cp.pixel_x, cp.pixel_y, cp.longitude, cp.latitude];
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "control point {} has non-finite coordinates",
                cp.name(i)
            )));
        }
        if !(-180.0..=180.0).contains(&cp.longitude) || !(-90.0..=90.0).contains(&cp.latitude) {
            return Err(Error::InvalidConfig(format!(
                "control point {} is outside longitude/latitude range: ({}, {})",
                cp.name(i),
                cp.longitude,
                cp.latitude
            )));
        }
    }
    Ok(())
}

/// Split into parallel pixel (source) and geographic (destination) arrays.
pub(crate) fn split_correspondences(points: &[ControlPoint]) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    points
        .iter()
        .map(|cp| (cp.pixel(), [cp.longitude, cp.latitude]))
        .unzip()
}

/// Drop dots lying within `radius` pixels of any control point. Control
/// landmarks are often inked the same way as the dots being surveyed.
pub(crate) fn exclude_near_control_points(
    points: Vec<PixelPoint>,
    control: &[ControlPoint],
    radius: f64,
) -> Vec<PixelPoint> {
    points
        .into_iter()
        .filter(|p| control.iter().all(|cp| cp.pixel_distance(*p) > radius))
        .collect()
}
