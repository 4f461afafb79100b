//! Job files: everything one georeferencing run needs, as JSON.
//!
//! Job JSON follows the `geodots.job.v1` schema. Unknown fields are rejected
//! and relative paths are resolved against the directory holding the job file.

use std::path::{Path, PathBuf};

use crate::control::validate_control_points;
use crate::error::{Error, Result};
use crate::{ControlPoint, DetectConfig, FitConfig};

pub const JOB_SCHEMA_V1: &str = "geodots.job.v1";

const DEFAULT_OUTPUT_CSV: &str = "coordinates.csv";

fn default_output_csv() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_CSV)
}

fn default_schema() -> String {
    JOB_SCHEMA_V1.to_string()
}

/// One scanned map plus its control points and run options.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Scanned map to process.
    pub image: PathBuf,
    /// Georeferenced dots, `longitude,latitude` rows.
    #[serde(default = "default_output_csv")]
    pub output_csv: PathBuf,
    /// Annotated copy of the scan with a circle per detected dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<PathBuf>,
    /// JSON run report (detections, fitted matrix, residuals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    pub control_points: Vec<ControlPoint>,
    #[serde(default)]
    pub detect: DetectConfig,
    #[serde(default)]
    pub fit: FitConfig,
    /// Drop detections within this many pixels of a control point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_control_radius_px: Option<f64>,
}

impl JobConfig {
    /// Job with default options writing `coordinates.csv`.
    pub fn new(image: impl Into<PathBuf>, control_points: Vec<ControlPoint>) -> Self {
        Self {
            schema: default_schema(),
            image: image.into(),
            output_csv: default_output_csv(),
            visualization: None,
            report: None,
            control_points,
            detect: DetectConfig::default(),
            fit: FitConfig::default(),
            exclude_control_radius_px: None,
        }
    }

    /// Load and validate a job file; relative paths resolve against its directory.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json_str(&data, base).map_err(|e| match e {
            Error::Job { message, .. } => Error::Job {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate job JSON, resolving relative paths against `base`.
    pub fn from_json_str(data: &str, base: &Path) -> Result<Self> {
        let job: Self = serde_json::from_str(data).map_err(|e| Error::Job {
            path: base.to_path_buf(),
            message: e.to_string(),
        })?;
        job.validate().map_err(|e| match e {
            Error::InvalidConfig(message) => Error::Job {
                path: base.to_path_buf(),
                message,
            },
            other => other,
        })?;
        Ok(job.resolved_against(base))
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema != JOB_SCHEMA_V1 {
            return Err(Error::InvalidConfig(format!(
                "unsupported job schema '{}' (expected '{}')",
                self.schema, JOB_SCHEMA_V1
            )));
        }
        if self.image.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("image path is empty".to_string()));
        }
        if self.output_csv.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("output_csv path is empty".to_string()));
        }
        if let Some(r) = self.exclude_control_radius_px {
            if !r.is_finite() || r <= 0.0 {
                return Err(Error::InvalidConfig(
                    "exclude_control_radius_px must be finite and > 0".to_string(),
                ));
            }
        }
        self.detect.validate()?;
        self.fit.validate()?;
        validate_control_points(&self.control_points)
    }

    fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.image = resolve(&self.image);
        self.output_csv = resolve(&self.output_csv);
        self.visualization = self.visualization.as_deref().map(resolve);
        self.report = self.report.as_deref().map(resolve);
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
