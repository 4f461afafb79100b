use std::path::PathBuf;

use crate::{DetectionResult, GeoPoint, HomographyFit, PixelPoint};

/// Everything one job run produced, serialized as the JSON run report.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobReport {
    pub image: PathBuf,
    pub detection: DetectionResult,
    /// Control-point exclusion removed this many detections.
    pub n_excluded: usize,
    /// Pixel points that were georeferenced, in detection order.
    pub points: Vec<PixelPoint>,
    /// Geographic coordinates, 1:1 with `points`.
    pub coordinates: Vec<GeoPoint>,
    pub fit: HomographyFit,
    pub output_csv: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<PathBuf>,
}

impl JobReport {
    /// `(pixel, geo)` pairs in detection order.
    pub fn pairs(&self) -> impl Iterator<Item = (PixelPoint, GeoPoint)> + '_ {
        self.points.iter().copied().zip(self.coordinates.iter().copied())
    }
}
