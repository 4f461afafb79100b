//! Error taxonomy shared by the detector, the georeferencer and the adapters.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a control-point set cannot support a transform fit.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPointDeficiency {
    /// Fewer correspondences than the transform model needs.
    TooFew { needed: usize },
    /// Pixel-side coordinates lie on a single line (or coincide).
    CollinearPixels,
    /// Geographic-side coordinates lie on a single line (or coincide).
    CollinearGeographic,
    /// The DLT system is rank-deficient; `ratio` is the measured
    /// second-smallest over largest singular value.
    IllConditioned { ratio: f64 },
    /// RANSAC could not find enough mutually consistent correspondences.
    InsufficientInliers { needed: usize, found: usize },
}

impl std::fmt::Display for ControlPointDeficiency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFew { needed } => write!(f, "at least {needed} are required"),
            Self::CollinearPixels => write!(f, "pixel coordinates are collinear"),
            Self::CollinearGeographic => write!(f, "geographic coordinates are collinear"),
            Self::IllConditioned { ratio } => {
                write!(f, "linear system is ill-conditioned (ratio {ratio:.3e})")
            }
            Self::InsufficientInliers { needed, found } => {
                write!(f, "only {found} consistent points, need {needed}")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("insufficient control points ({count} supplied): {reason}")]
    InsufficientControlPoints {
        count: usize,
        reason: ControlPointDeficiency,
    },

    /// `index` is the position in the input slice; 0 for single-point calls.
    #[error("degenerate transform for point #{index} ({x}, {y}): homogeneous w = {w:e}")]
    DegenerateTransform { index: usize, x: f64, y: f64, w: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid job file {}: {message}", path.display())]
    Job { path: PathBuf, message: String },

    #[error("could not write image {}: {source}", path.display())]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn too_few(count: usize, needed: usize) -> Self {
        Self::InsufficientControlPoints {
            count,
            reason: ControlPointDeficiency::TooFew { needed },
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_message_names_count_and_reason() {
        let err = Error::too_few(2, 3);
        let msg = err.to_string();
        assert!(msg.contains("2 supplied"), "{msg}");
        assert!(msg.contains("at least 3"), "{msg}");
    }

    #[test]
    fn image_load_message_carries_path() {
        let err = Error::ImageLoad {
            path: PathBuf::from("maps/missing.jpg"),
            source: image::ImageError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            )),
        };
        assert!(err.to_string().contains("maps/missing.jpg"));
    }
}
