use rand::prelude::*;

use super::core::{reprojection_error, Solved};
use crate::error::ControlPointDeficiency;

/// RANSAC configuration for transform fitting.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RansacConfig {
    /// Maximum number of RANSAC iterations.
    pub max_iters: usize,
    /// Inlier threshold in destination units (degrees for lon/lat).
    pub inlier_threshold: f64,
    /// Minimum number of inliers for a valid model; clamped to at least the
    /// model's minimal sample size and at most the number of points.
    pub min_inliers: usize,
    /// Random seed.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            inlier_threshold: 1e-4,
            min_inliers: 4,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RansacOutcome {
    pub solved: Solved,
    pub inlier_mask: Vec<bool>,
}

fn inlier_mask(solved: &Solved, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> Vec<bool> {
    src.iter()
        .zip(dst)
        .map(|(s, d)| reprojection_error(&solved.h, s, d) < threshold)
        .collect()
}

fn select(pts: &[[f64; 2]], mask: &[bool]) -> Vec<[f64; 2]> {
    pts.iter()
        .zip(mask)
        .filter_map(|(p, &keep)| keep.then_some(*p))
        .collect()
}

/// Sample minimal subsets, keep the model with most inliers, refit on them.
///
/// `estimate` is the minimal/least-squares solver for the model;
/// `sample_size` its minimal correspondence count.
pub(crate) fn fit_ransac<F>(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
    sample_size: usize,
    config: &RansacConfig,
    estimate: F,
) -> Result<RansacOutcome, ControlPointDeficiency>
where
    F: Fn(&[[f64; 2]], &[[f64; 2]]) -> Result<Solved, ControlPointDeficiency>,
{
    let n = src.len();
    if n < sample_size {
        return Err(ControlPointDeficiency::TooFew {
            needed: sample_size,
        });
    }
    let min_inliers = config.min_inliers.max(sample_size).min(n);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(Solved, Vec<bool>, usize)> = None;

    for _ in 0..config.max_iters {
        let idx = rand::seq::index::sample(&mut rng, n, sample_size);
        let s: Vec<[f64; 2]> = idx.iter().map(|i| src[i]).collect();
        let d: Vec<[f64; 2]> = idx.iter().map(|i| dst[i]).collect();

        let Ok(solved) = estimate(&s, &d) else {
            continue;
        };

        let mask = inlier_mask(&solved, src, dst, config.inlier_threshold);
        let count = mask.iter().filter(|&&m| m).count();
        if best.as_ref().map_or(true, |(_, _, c)| count > *c) {
            best = Some((solved, mask, count));
            if count == n {
                break;
            }
        }
    }

    let Some((best_solved, best_mask, best_count)) = best else {
        return Err(ControlPointDeficiency::InsufficientInliers {
            needed: min_inliers,
            found: 0,
        });
    };
    if best_count < min_inliers {
        return Err(ControlPointDeficiency::InsufficientInliers {
            needed: min_inliers,
            found: best_count,
        });
    }

    let refit = estimate(&select(src, &best_mask), &select(dst, &best_mask)).unwrap_or(best_solved);
    let mask = inlier_mask(&refit, src, dst, config.inlier_threshold);
    let found = mask.iter().filter(|&&m| m).count();
    if found < min_inliers {
        return Err(ControlPointDeficiency::InsufficientInliers {
            needed: min_inliers,
            found,
        });
    }

    tracing::debug!(inliers = found, total = n, "RANSAC consensus");
    Ok(RansacOutcome {
        solved: refit,
        inlier_mask: mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homography::core::{estimate_affine, estimate_projective, project};
    use nalgebra::Matrix3;
    use rand::Rng;

    fn make_test_homography() -> Matrix3<f64> {
        Matrix3::new(
            3.5, 0.1, 640.0, -0.05, 3.3, 480.0, 0.0001, -0.00005, 1.0,
        )
    }

    #[test]
    fn ransac_rejects_gross_outliers() {
        let h_true = make_test_homography();
        let mut rng = StdRng::seed_from_u64(42);

        let mut src = Vec::new();
        let mut dst = Vec::new();
        for i in 0..20 {
            let s = [(i % 5) as f64 * 30.0, (i / 5) as f64 * 30.0];
            let d = project(&h_true, s[0], s[1]);
            src.push(s);
            dst.push([d[0] + rng.gen_range(-0.5..0.5), d[1] + rng.gen_range(-0.5..0.5)]);
        }
        for _ in 0..6 {
            src.push([rng.gen_range(0.0..120.0), rng.gen_range(0.0..90.0)]);
            dst.push([rng.gen_range(0.0..1280.0), rng.gen_range(0.0..960.0)]);
        }

        let config = RansacConfig {
            inlier_threshold: 3.0,
            min_inliers: 6,
            seed: 99,
            ..RansacConfig::default()
        };
        let out = fit_ransac(&src, &dst, 4, &config, estimate_projective).expect("consensus");

        let clean = out.inlier_mask[..20].iter().filter(|&&m| m).count();
        assert!(clean >= 18, "only {clean} clean inliers");
        for i in 0..20 {
            let err = reprojection_error(&out.solved.h, &src[i], &dst[i]);
            assert!(err < 5.0, "inlier {i} has error {err}");
        }
    }

    #[test]
    fn ransac_is_deterministic_for_a_seed() {
        let src: Vec<[f64; 2]> = (0..10).map(|i| [i as f64 * 10.0, (i * i) as f64]).collect();
        let mut dst: Vec<[f64; 2]> = src.iter().map(|p| [2.0 * p[0] + 1.0, p[1] - 3.0]).collect();
        dst[3] = [500.0, -500.0];

        let config = RansacConfig {
            inlier_threshold: 0.01,
            ..RansacConfig::default()
        };
        let a = fit_ransac(&src, &dst, 3, &config, estimate_affine).expect("fit");
        let b = fit_ransac(&src, &dst, 3, &config, estimate_affine).expect("fit");
        assert_eq!(a.inlier_mask, b.inlier_mask);
        assert_eq!(a.solved.h, b.solved.h);
        assert!(!a.inlier_mask[3]);
        assert_eq!(a.inlier_mask.iter().filter(|&&m| m).count(), 9);
    }

    #[test]
    fn ransac_reports_missing_consensus() {
        let src = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0], [5.0, 3.0]];
        let dst = [[0.0, 0.0], [1.0, 7.0], [-4.0, 2.0], [9.0, -9.0], [30.0, 30.0]];
        let config = RansacConfig {
            inlier_threshold: 1e-6,
            min_inliers: 5,
            max_iters: 50,
            seed: 1,
        };
        let err = fit_ransac(&src, &dst, 3, &config, estimate_affine).expect_err("no consensus");
        assert!(matches!(
            err,
            ControlPointDeficiency::InsufficientInliers { needed: 5, .. }
        ));
    }
}
