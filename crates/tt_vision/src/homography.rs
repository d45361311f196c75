use glam::Vec2;

use tt_geometry::Homography;

/// Parameters for [`ransac_homography`].
#[derive(Clone, Copy, Debug)]
pub struct HomographyParams {
    /// Reprojection distance (pixels) below which a pair counts as an inlier.
    pub ransac_threshold: f32,
    /// Hard cap on RANSAC iterations.
    pub max_iterations: u32,
    /// Target probability of having sampled at least one outlier-free
    /// 4-point set; used for adaptive early exit.
    pub confidence: f32,
}

impl Default for HomographyParams {
    fn default() -> Self {
        Self {
            ransac_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
        }
    }
}

/// A fitted homography and which input pairs agree with it.
#[derive(Clone, Debug)]
pub struct HomographyFit {
    pub homography: Homography,
    pub inlier_mask: Vec<bool>,
}

impl HomographyFit {
    pub fn inlier_count(&self) -> usize {
        self.inlier_mask.iter().filter(|&&inlier| inlier).count()
    }

    /// Inliers over total pairs, in `[0, 1]`.
    pub fn inlier_fraction(&self) -> f32 {
        if self.inlier_mask.is_empty() {
            0.0
        } else {
            self.inlier_count() as f32 / self.inlier_mask.len() as f32
        }
    }
}

/// Exact homography through four point pairs, via direct linear transform.
///
/// Solves the 8×9 DLT system by Gaussian elimination in f64 and normalizes
/// so `h[8] == 1`. Returns `None` for degenerate configurations (three
/// collinear points, repeated points).
pub fn homography_from_four(src: &[Vec2; 4], dst: &[Vec2; 4]) -> Option<Homography> {
    let mut m = [[0.0f64; 9]; 8];
    for i in 0..4 {
        let (x, y) = (f64::from(src[i].x), f64::from(src[i].y));
        let (xp, yp) = (f64::from(dst[i].x), f64::from(dst[i].y));
        m[i * 2] = [-x, -y, -1.0, 0.0, 0.0, 0.0, x * xp, y * xp, xp];
        m[i * 2 + 1] = [0.0, 0.0, 0.0, -x, -y, -1.0, x * yp, y * yp, yp];
    }

    // Gauss-Jordan with partial pivoting.
    for col in 0..8 {
        let mut max_row = col;
        let mut max_val = m[col][col].abs();
        for row in (col + 1)..8 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }
        if max_val < 1e-10 {
            return None;
        }
        m.swap(col, max_row);

        let pivot = m[col][col];
        for j in col..9 {
            m[col][j] /= pivot;
        }
        for row in 0..8 {
            if row != col {
                let factor = m[row][col];
                for j in col..9 {
                    m[row][j] -= factor * m[col][j];
                }
            }
        }
    }

    let mut h = [0.0f64; 9];
    h[8] = 1.0;
    for i in 0..8 {
        h[i] = -m[i][8];
    }

    if h.iter().any(|c| !c.is_finite()) {
        return None;
    }

    Some(Homography::from_row_major(h.map(|c| c as f32)))
}

/// Least-squares homography over point pairs, with `h8` pinned to 1.
///
/// Normal-equations solve of the stacked DLT rows; the refinement step
/// after RANSAC has picked its inliers. `None` when the system is singular
/// (or when the true `h8` is nowhere near 1, which plane tracking between
/// consecutive frames never produces).
fn least_squares_homography(src: &[Vec2], dst: &[Vec2]) -> Option<Homography> {
    if src.len() < 4 {
        return None;
    }

    // Rows: [x y 1 0 0 0 -x·x' -y·x'] h = x'   and the y' counterpart.
    let mut ata = [[0.0f64; 8]; 8];
    let mut atb = [0.0f64; 8];
    let mut add_row = |row: [f64; 8], rhs: f64| {
        for i in 0..8 {
            for j in 0..8 {
                ata[i][j] += row[i] * row[j];
            }
            atb[i] += row[i] * rhs;
        }
    };
    for (s, d) in src.iter().zip(dst) {
        let (x, y) = (f64::from(s.x), f64::from(s.y));
        let (xp, yp) = (f64::from(d.x), f64::from(d.y));
        add_row([x, y, 1.0, 0.0, 0.0, 0.0, -x * xp, -y * xp], xp);
        add_row([0.0, 0.0, 0.0, x, y, 1.0, -x * yp, -y * yp], yp);
    }

    // Gaussian elimination with partial pivoting on the 8×8 system.
    let mut m = [[0.0f64; 9]; 8];
    for i in 0..8 {
        m[i][..8].copy_from_slice(&ata[i]);
        m[i][8] = atb[i];
    }
    for col in 0..8 {
        let mut max_row = col;
        let mut max_val = m[col][col].abs();
        for row in (col + 1)..8 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }
        if max_val < 1e-12 {
            return None;
        }
        m.swap(col, max_row);
        let pivot = m[col][col];
        for j in col..9 {
            m[col][j] /= pivot;
        }
        for row in 0..8 {
            if row != col {
                let factor = m[row][col];
                for j in col..9 {
                    m[row][j] -= factor * m[col][j];
                }
            }
        }
    }

    let mut h = [0.0f64; 9];
    h[8] = 1.0;
    for i in 0..8 {
        h[i] = m[i][8];
    }
    if h.iter().any(|c| !c.is_finite()) {
        return None;
    }

    Some(Homography::from_row_major(h.map(|c| c as f32)))
}

/// RANSAC homography over `src → dst` correspondences.
///
/// The winning 4-point model is refined by least squares over its inliers,
/// which averages the flow noise down instead of trusting four points.
/// Sampling uses a fixed-seed LCG, so identical inputs always produce
/// identical fits; repeated runs of a tracking pass are reproducible.
/// Returns `None` when fewer than 4 pairs are given or no sample produces a
/// usable model.
pub fn ransac_homography(
    src: &[Vec2],
    dst: &[Vec2],
    params: &HomographyParams,
) -> Option<HomographyFit> {
    let n = src.len();
    if n < 4 || n != dst.len() {
        return None;
    }

    let threshold_sq = params.ransac_threshold * params.ransac_threshold;
    let inlier_mask = |h: &Homography| -> Vec<bool> {
        (0..n)
            .map(|i| h.apply_pt(src[i]).distance_squared(dst[i]) <= threshold_sq)
            .collect()
    };

    if n == 4 {
        let h = homography_from_four(
            &[src[0], src[1], src[2], src[3]],
            &[dst[0], dst[1], dst[2], dst[3]],
        )?;
        let mask = inlier_mask(&h);
        return Some(HomographyFit {
            homography: h,
            inlier_mask: mask,
        });
    }

    let mut best: Option<HomographyFit> = None;
    let mut best_inliers = 0usize;
    let mut needed_iterations = params.max_iterations;

    let mut seed = 0x5EED_1234_5678_9ABCu64;
    let mut next_index = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (seed >> 33) as usize % n
    };

    let mut iteration = 0;
    while iteration < params.max_iterations.min(needed_iterations) {
        iteration += 1;

        // Four distinct indices.
        let mut indices = [0usize; 4];
        let mut filled = 0;
        while filled < 4 {
            let candidate = next_index();
            if !indices[..filled].contains(&candidate) {
                indices[filled] = candidate;
                filled += 1;
            }
        }

        let sample_src = indices.map(|i| src[i]);
        let sample_dst = indices.map(|i| dst[i]);
        let Some(h) = homography_from_four(&sample_src, &sample_dst) else {
            continue;
        };

        let mask = inlier_mask(&h);
        let inliers = mask.iter().filter(|&&inlier| inlier).count();
        if inliers > best_inliers {
            best_inliers = inliers;
            best = Some(HomographyFit {
                homography: h,
                inlier_mask: mask,
            });

            // Adaptive iteration count: stop once a sample this good was
            // overwhelmingly likely to have been drawn already.
            let inlier_ratio = inliers as f64 / n as f64;
            let p_good_sample = inlier_ratio.powi(4);
            if p_good_sample > 1.0 - 1e-9 {
                break;
            }
            let needed =
                (1.0 - f64::from(params.confidence)).ln() / (1.0 - p_good_sample).ln();
            if needed.is_finite() && needed >= 0.0 {
                needed_iterations = (needed.ceil() as u32).max(1);
            }
        }
    }

    // Refine over the consensus set; keep the refinement only if it does
    // not lose inliers.
    let mut best = best?;
    let inlier_src: Vec<Vec2> = (0..n)
        .filter(|&i| best.inlier_mask[i])
        .map(|i| src[i])
        .collect();
    let inlier_dst: Vec<Vec2> = (0..n)
        .filter(|&i| best.inlier_mask[i])
        .map(|i| dst[i])
        .collect();
    if let Some(refined) = least_squares_homography(&inlier_src, &inlier_dst) {
        let mask = inlier_mask(&refined);
        let inliers = mask.iter().filter(|&&inlier| inlier).count();
        if inliers >= best_inliers {
            best = HomographyFit {
                homography: refined,
                inlier_mask: mask,
            };
        }
    }

    Some(best)
}
