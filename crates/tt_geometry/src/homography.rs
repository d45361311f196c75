use glam::{Vec2, Vec3};

/// A 3×3 projective transform between two planes, row-major.
///
/// Estimated per frame by the vision backend and composed incrementally onto
/// tracker corners. The row-major layout matches the estimator's convention;
/// it is deliberately distinct from the column-major [`glam::Mat4`] used for
/// text transforms.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Homography(pub [f32; 9]);

impl Homography {
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
    ]);

    #[inline]
    pub const fn from_row_major(coefficients: [f32; 9]) -> Self {
        Self(coefficients)
    }

    /// All coefficients are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Largest absolute coefficient difference to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }

    /// Transforms `(x, y)` in homogeneous coordinates, preserving `z`.
    ///
    /// A malformed matrix (non-finite coefficients, or a vanishing
    /// denominator at this point) leaves the input unchanged; the caller
    /// keeps its last good position instead of exploding.
    pub fn apply(&self, p: Vec3) -> Vec3 {
        if !self.is_finite() {
            return p;
        }

        let h = &self.0;
        let w = h[6] * p.x + h[7] * p.y + h[8];
        if !w.is_finite() || w.abs() < 1e-8 {
            return p;
        }

        Vec3::new(
            (h[0] * p.x + h[1] * p.y + h[2]) / w,
            (h[3] * p.x + h[4] * p.y + h[5]) / w,
            p.z,
        )
    }

    /// [`Self::apply`] for plain 2D points.
    #[inline]
    pub fn apply_pt(&self, p: Vec2) -> Vec2 {
        self.apply(p.extend(0.0)).truncate()
    }

    /// Applies `h` if present, otherwise behaves as the identity.
    #[inline]
    pub fn apply_opt(p: Vec3, h: Option<&Self>) -> Vec3 {
        match h {
            Some(h) => h.apply(p),
            None => p,
        }
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::IDENTITY
    }
}
