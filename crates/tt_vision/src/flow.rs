use glam::Vec2;

use crate::{GrayImage, ImagePyramid};

/// Eigenvalue score (per window pixel) that maps to full confidence.
const FULL_CONFIDENCE_EIGEN: f32 = 25.0;

/// Parameters for [`track_point`], mirroring the usual pyramidal-LK knobs.
#[derive(Clone, Copy, Debug)]
pub struct FlowParams {
    /// Side of the square correlation window, in pixels.
    pub window_size: u32,
    /// Deepest pyramid level to use (level 0 is full resolution).
    pub max_level: u32,
    /// Iteration cap per pyramid level.
    pub max_iterations: u32,
    /// Convergence threshold on the per-iteration step, in pixels.
    pub epsilon: f32,
    /// Windows whose min eigenvalue (per pixel) falls below this are
    /// untrackable.
    pub min_eigen_threshold: f32,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            window_size: 21,
            max_level: 3,
            max_iterations: 30,
            epsilon: 0.01,
            min_eigen_threshold: 1e-4,
        }
    }
}

/// Outcome of tracking one point across a frame pair.
#[derive(Clone, Copy, Debug)]
pub struct FlowStatus {
    /// New position; equals the input position when `tracked` is false.
    pub pos: Vec2,
    pub tracked: bool,
    /// Trackability score in `[0, 1]`, derived from the spatial-gradient
    /// matrix's smaller eigenvalue at full resolution.
    pub confidence: f32,
}

impl FlowStatus {
    fn lost(pos: Vec2) -> Self {
        Self {
            pos,
            tracked: false,
            confidence: 0.0,
        }
    }
}

/// Pyramidal Lucas-Kanade: coarse-to-fine iterative refinement of one
/// point's displacement between two grayscale pyramids.
pub fn track_point(
    prev: &ImagePyramid,
    curr: &ImagePyramid,
    start: Vec2,
    params: &FlowParams,
) -> FlowStatus {
    let base = prev.finest();
    if start.x < 0.0
        || start.y < 0.0
        || start.x >= base.width() as f32
        || start.y >= base.height() as f32
    {
        return FlowStatus::lost(start);
    }

    let levels = prev
        .num_levels()
        .min(curr.num_levels())
        .min(params.max_level as usize + 1);
    let hw = (params.window_size / 2) as i32;
    let window_pixels = ((2 * hw + 1) * (2 * hw + 1)) as f32;

    let mut d = Vec2::ZERO; // displacement, in the units of the current level
    let mut confidence = 0.0f32;

    for level in (0..levels).rev() {
        let scale = 1.0 / (1 << level) as f32;
        let prev_img = prev.level(level);
        let curr_img = curr.level(level);
        let p = start * scale;

        // Spatial-gradient matrix of the template window.
        let mut g11 = 0.0f32;
        let mut g12 = 0.0f32;
        let mut g22 = 0.0f32;
        for wy in -hw..=hw {
            for wx in -hw..=hw {
                let x = p.x + wx as f32;
                let y = p.y + wy as f32;
                let ix = (prev_img.sample(x + 1.0, y) - prev_img.sample(x - 1.0, y)) * 0.5;
                let iy = (prev_img.sample(x, y + 1.0) - prev_img.sample(x, y - 1.0)) * 0.5;
                g11 += ix * ix;
                g12 += ix * iy;
                g22 += iy * iy;
            }
        }

        let det = g11 * g22 - g12 * g12;
        let min_eigen =
            0.5 * (g11 + g22 - ((g11 - g22) * (g11 - g22) + 4.0 * g12 * g12).sqrt())
                / window_pixels;

        if det.abs() < 1e-6 || min_eigen < params.min_eigen_threshold {
            if level == 0 {
                return FlowStatus::lost(start);
            }
            // Not enough texture at this level; carry the guess down.
            d *= 2.0;
            continue;
        }

        if level == 0 {
            confidence = (min_eigen / FULL_CONFIDENCE_EIGEN).clamp(0.0, 1.0);
        }

        let inv_det = 1.0 / det;
        for _ in 0..params.max_iterations {
            let mut bx = 0.0f32;
            let mut by = 0.0f32;
            for wy in -hw..=hw {
                for wx in -hw..=hw {
                    let x = p.x + wx as f32;
                    let y = p.y + wy as f32;
                    let ix = (prev_img.sample(x + 1.0, y) - prev_img.sample(x - 1.0, y)) * 0.5;
                    let iy = (prev_img.sample(x, y + 1.0) - prev_img.sample(x, y - 1.0)) * 0.5;
                    let it = curr_img.sample(x + d.x, y + d.y) - prev_img.sample(x, y);
                    bx += ix * it;
                    by += iy * it;
                }
            }

            let step = Vec2::new(
                inv_det * (g22 * bx - g12 * by),
                inv_det * (-g12 * bx + g11 * by),
            );
            d -= step;
            if step.length_squared() < params.epsilon * params.epsilon {
                break;
            }
        }

        if level > 0 {
            d *= 2.0;
        }
    }

    let pos = start + d;
    if !pos.is_finite() {
        return FlowStatus::lost(start);
    }

    FlowStatus {
        pos,
        tracked: true,
        confidence,
    }
}
