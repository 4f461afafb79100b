//! Plane transform estimation: Hartley-normalized DLT (projective) and
//! least-squares affine, plus projection and residual helpers.

use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::error::{ControlPointDeficiency, Result};

/// Smallest `|w|` accepted when dehomogenizing a projected point.
pub(crate) const W_EPS: f64 = 1e-12;

/// Scatter eigenvalue ratio under which a point set counts as collinear.
const COLLINEAR_RATIO: f64 = 1e-10;

/// Singular value ratio under which the linear system counts as
/// rank-deficient. The DLT null vector is taken from a 9-column system,
/// so the ratio compares the second-smallest against the largest value.
pub(crate) const MIN_CONDITIONING: f64 = 1e-9;

/// Projective image of `(x, y, 1)`: `(x'/w', y'/w')` and `w'`.
pub(crate) fn project_h(h: &Matrix3<f64>, x: f64, y: f64) -> ([f64; 2], f64) {
    let p = h * Vector3::new(x, y, 1.0);
    let w = p[2];
    ([p[0] / w, p[1] / w], w)
}

/// Project a 2D point, returning NaN when the normalizer is negligible.
pub(crate) fn project(h: &Matrix3<f64>, x: f64, y: f64) -> [f64; 2] {
    let (p, w) = project_h(h, x, y);
    if w.abs() < W_EPS {
        return [f64::NAN, f64::NAN];
    }
    p
}

/// Reprojection error: `||project(H, src) - dst||`.
pub(crate) fn reprojection_error(h: &Matrix3<f64>, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
    let p = project(h, src[0], src[1]);
    let dx = p[0] - dst[0];
    let dy = p[1] - dst[1];
    (dx * dx + dy * dy).sqrt()
}

pub(crate) fn matrix3_to_array(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

pub(crate) fn array_to_matrix3(a: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::new(
        a[0][0], a[0][1], a[0][2], a[1][0], a[1][1], a[1][2], a[2][0], a[2][1], a[2][2],
    )
}

/// Translate the centroid to the origin and scale so the mean distance from
/// it is sqrt(2).
pub(crate) fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, normalized)
}

/// True when the points lie on one line or coincide.
///
/// Uses the eigenvalues of the 2×2 scatter matrix: a flat point cloud has a
/// vanishing minor eigenvalue relative to the major one.
pub(crate) fn is_collinear(pts: &[[f64; 2]]) -> bool {
    if pts.len() < 3 {
        return true;
    }
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in pts {
        let dx = p[0] - cx;
        let dy = p[1] - cy;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    let half_trace = 0.5 * (sxx + syy);
    let disc = (0.25 * (sxx - syy).powi(2) + sxy * sxy).sqrt();
    let major = half_trace + disc;
    let minor = (half_trace - disc).max(0.0);
    major <= 0.0 || minor / major < COLLINEAR_RATIO
}

/// Check both sides of a correspondence set for collinearity.
pub(crate) fn check_spread(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> std::result::Result<(), ControlPointDeficiency> {
    if is_collinear(src) {
        return Err(ControlPointDeficiency::CollinearPixels);
    }
    if is_collinear(dst) {
        return Err(ControlPointDeficiency::CollinearGeographic);
    }
    Ok(())
}

/// A solved transform and the conditioning ratio of its linear system.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Solved {
    pub h: Matrix3<f64>,
    pub conditioning: f64,
}

/// Projective DLT from ≥ 4 correspondences.
///
/// Returns `H` with `dst ≈ project(H, src)`, scaled so `H[2,2] = 1` when
/// that entry is not negligible.
pub(crate) fn estimate_projective(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> std::result::Result<Solved, ControlPointDeficiency> {
    let n = src.len().min(dst.len());
    if n < 4 {
        return Err(ControlPointDeficiency::TooFew { needed: 4 });
    }

    let (t_src, src_n) = normalize_points(&src[..n]);
    let (t_dst, dst_n) = normalize_points(&dst[..n]);

    // At least 9 rows so the full SVD carries the whole right null space.
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    let svd = a.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or(ControlPointDeficiency::IllConditioned { ratio: 0.0 })?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&i, &j| svd.singular_values[i].total_cmp(&svd.singular_values[j]));
    let smallest = order[0];
    let second = svd.singular_values[order[1]];
    let largest = svd.singular_values[order[order.len() - 1]];
    let conditioning = if largest > 0.0 { second / largest } else { 0.0 };
    if !(conditioning >= MIN_CONDITIONING) {
        return Err(ControlPointDeficiency::IllConditioned {
            ratio: conditioning,
        });
    }

    let h_vec = v_t.row(smallest);
    let h_norm = Matrix3::new(
        h_vec[0], h_vec[1], h_vec[2], h_vec[3], h_vec[4], h_vec[5], h_vec[6], h_vec[7], h_vec[8],
    );

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(ControlPointDeficiency::CollinearGeographic)?;
    let mut h = t_dst_inv * h_norm * t_src;
    let scale = h[(2, 2)];
    if scale.abs() > f64::EPSILON {
        h /= scale;
    }

    Ok(Solved { h, conditioning })
}

/// Least-squares affine fit from ≥ 3 correspondences; exact for 3.
///
/// The last row of the returned matrix is `[0, 0, 1]`.
pub(crate) fn estimate_affine(
    src: &[[f64; 2]],
    dst: &[[f64; 2]],
) -> std::result::Result<Solved, ControlPointDeficiency> {
    let n = src.len().min(dst.len());
    if n < 3 {
        return Err(ControlPointDeficiency::TooFew { needed: 3 });
    }

    let (t_src, src_n) = normalize_points(&src[..n]);
    let (t_dst, dst_n) = normalize_points(&dst[..n]);

    let mut m = DMatrix::<f64>::zeros(n, 3);
    let mut rhs = DMatrix::<f64>::zeros(n, 2);
    for i in 0..n {
        m[(i, 0)] = src_n[i][0];
        m[(i, 1)] = src_n[i][1];
        m[(i, 2)] = 1.0;
        rhs[(i, 0)] = dst_n[i][0];
        rhs[(i, 1)] = dst_n[i][1];
    }

    let svd = m.svd(true, true);
    let largest = svd.singular_values.max();
    let smallest = svd.singular_values.min();
    let conditioning = if largest > 0.0 { smallest / largest } else { 0.0 };
    if !(conditioning >= MIN_CONDITIONING) {
        return Err(ControlPointDeficiency::IllConditioned {
            ratio: conditioning,
        });
    }

    let sol = svd
        .solve(&rhs, 1e-14)
        .map_err(|_| ControlPointDeficiency::IllConditioned { ratio: conditioning })?;

    let a_norm = Matrix3::new(
        sol[(0, 0)],
        sol[(1, 0)],
        sol[(2, 0)],
        sol[(0, 1)],
        sol[(1, 1)],
        sol[(2, 1)],
        0.0,
        0.0,
        1.0,
    );
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or(ControlPointDeficiency::CollinearGeographic)?;
    let h = t_dst_inv * a_norm * t_src;

    Ok(Solved { h, conditioning })
}

/// Per-correspondence residuals in destination units.
pub(crate) fn residuals(h: &Matrix3<f64>, src: &[[f64; 2]], dst: &[[f64; 2]]) -> Vec<f64> {
    src.iter()
        .zip(dst)
        .map(|(s, d)| reprojection_error(h, s, d))
        .collect()
}

/// `(rms, max)` of the finite entries; `(0, 0)` for an empty slice.
pub(crate) fn rms_and_max(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 0.0);
    }
    let rms = (finite.iter().map(|v| v * v).sum::<f64>() / finite.len() as f64).sqrt();
    let max = finite.iter().copied().fold(0.0f64, f64::max);
    (rms, max)
}

/// Reject non-finite matrices up front.
pub(crate) fn ensure_finite(h: &Matrix3<f64>) -> Result<()> {
    if h.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(crate::Error::InvalidConfig(
            "transform matrix has non-finite entries".to_string(),
        ))
    }
}
