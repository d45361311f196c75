use glam::Vec2;

/// Search radius (in pixels) when snapping a feature point to nearby
/// texture.
pub const GRADIENT_SNAP_RADIUS: i32 = 10;

/// Gradient magnitude that maps to full trackability confidence.
pub const GRADIENT_CONFIDENCE_SCALE: f32 = 50.0;

/// A single-channel f32 raster, values nominally in `[0, 255]`.
///
/// Out-of-bounds reads clamp to the border, which keeps the flow window
/// math free of special cases near image edges.
#[derive(Clone, Debug)]
pub struct GrayImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl GrayImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width * height) as usize],
        }
    }

    /// Rec. 601 luma of an RGBA raster.
    pub fn from_rgba8(rgba: &image::RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        let data = rgba
            .pixels()
            .map(|p| {
                0.299 * f32::from(p.0[0]) + 0.587 * f32::from(p.0[1]) + 0.114 * f32::from(p.0[2])
            })
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Border-clamped read.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// Bilinear sample at a subpixel position, border-clamped.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as i32;
        let y0 = y0 as i32;

        let v00 = self.get(x0, y0);
        let v10 = self.get(x0 + 1, y0);
        let v01 = self.get(x0, y0 + 1);
        let v11 = self.get(x0 + 1, y0 + 1);

        let top = v00 + (v10 - v00) * fx;
        let bottom = v01 + (v11 - v01) * fx;
        top + (bottom - top) * fy
    }

    /// Central-difference gradient magnitude at an integer position.
    pub fn gradient_magnitude(&self, x: i32, y: i32) -> f32 {
        let gx = (self.get(x + 1, y) - self.get(x - 1, y)) * 0.5;
        let gy = (self.get(x, y + 1) - self.get(x, y - 1)) * 0.5;
        (gx * gx + gy * gy).sqrt()
    }

    /// Half-resolution copy (2×2 box filter).
    pub fn downsample(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut out = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let sx = (x * 2) as i32;
                let sy = (y * 2) as i32;
                let sum = self.get(sx, sy)
                    + self.get(sx + 1, sy)
                    + self.get(sx, sy + 1)
                    + self.get(sx + 1, sy + 1);
                out.set(x, y, sum * 0.25);
            }
        }
        out
    }

    /// Moves `p` to the strongest gradient response within
    /// [`GRADIENT_SNAP_RADIUS`], sampling every other pixel. Returns the
    /// snapped position and a trackability confidence in `[0, 1]`.
    ///
    /// A featureless neighborhood snaps nowhere and scores zero.
    pub fn snap_to_gradient(&self, p: Vec2) -> (Vec2, f32) {
        let cx = p.x.round() as i32;
        let cy = p.y.round() as i32;

        let mut best = p;
        let mut best_mag = 0.0f32;

        let r = GRADIENT_SNAP_RADIUS;
        let mut y = -r;
        while y <= r {
            let mut x = -r;
            while x <= r {
                let mag = self.gradient_magnitude(cx + x, cy + y);
                if mag > best_mag {
                    best_mag = mag;
                    best = Vec2::new((cx + x) as f32, (cy + y) as f32);
                }
                x += 2;
            }
            y += 2;
        }

        if best_mag > 0.0 {
            (best, (best_mag / GRADIENT_CONFIDENCE_SCALE).min(1.0))
        } else {
            (p, 0.0)
        }
    }
}
