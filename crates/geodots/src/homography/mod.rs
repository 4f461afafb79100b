//! Pixel → geographic transform estimation, projection and fit diagnostics.

mod core;
mod fit;
mod ransac;

pub(crate) use core::{array_to_matrix3, ensure_finite, matrix3_to_array, project_h, W_EPS};
pub use fit::{fit_homography, FitConfig, FitMethod, HomographyFit, TransformModel};
pub use ransac::RansacConfig;
