use crate::error::{Error, Result};

/// Appearance of the circles drawn on the visualization copy.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerStyle {
    /// Circle radius in pixels.
    pub radius_px: i32,
    /// Stroke width in pixels; zero or negative draws a filled disk.
    pub thickness_px: i32,
    /// RGB stroke color.
    pub color: [u8; 3],
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius_px: 5,
            thickness_px: 2,
            color: [255, 0, 0],
        }
    }
}

/// Dot detection parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectConfig {
    /// Exclusive lower bound on contour area (px²). Rejects specks.
    pub size_min: f64,
    /// Exclusive upper bound on contour area (px²). Rejects labels and borders.
    pub size_max: f64,
    /// Run histogram equalization before thresholding.
    pub equalize: bool,
    /// Merge detections closer than this radius, keeping the first in
    /// discovery order. `None` keeps every detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_radius_px: Option<f64>,
    /// Visualization marker appearance.
    pub marker: MarkerStyle,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            size_min: 10.0,
            size_max: 1000.0,
            equalize: true,
            dedup_radius_px: None,
            marker: MarkerStyle::default(),
        }
    }
}

impl DetectConfig {
    /// Default configuration with explicit area bounds.
    pub fn with_size_range(size_min: f64, size_max: f64) -> Self {
        Self {
            size_min,
            size_max,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.size_min.is_finite() || !self.size_max.is_finite() {
            return Err(Error::InvalidConfig(
                "size_min and size_max must be finite".to_string(),
            ));
        }
        if self.size_min < 0.0 {
            return Err(Error::InvalidConfig("size_min must be >= 0".to_string()));
        }
        if self.size_min >= self.size_max {
            return Err(Error::InvalidConfig(format!(
                "size_min ({}) must be < size_max ({})",
                self.size_min, self.size_max
            )));
        }
        if let Some(r) = self.dedup_radius_px {
            if !r.is_finite() || r <= 0.0 {
                return Err(Error::InvalidConfig(
                    "dedup_radius_px must be finite and > 0".to_string(),
                ));
            }
        }
        if self.marker.radius_px < 1 {
            return Err(Error::InvalidConfig("marker radius must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hand_drawn_dot_scale() {
        let cfg = DetectConfig::default();
        assert_eq!(cfg.size_min, 10.0);
        assert_eq!(cfg.size_max, 1000.0);
        assert!(cfg.equalize);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = DetectConfig::with_size_range(500.0, 20.0)
            .validate()
            .expect_err("inverted range");
        assert!(err.to_string().contains("size_min"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: DetectConfig = serde_json::from_str(r#"{"size_max": 400.0}"#).expect("json");
        assert_eq!(cfg.size_min, 10.0);
        assert_eq!(cfg.size_max, 400.0);
        assert_eq!(cfg.marker, MarkerStyle::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: std::result::Result<DetectConfig, _> =
            serde_json::from_str(r#"{"min_area": 4.0}"#);
        assert!(parsed.is_err());
    }
}
