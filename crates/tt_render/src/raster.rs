use std::sync::Arc;

use ab_glyph::{Font as _, FontArc, Glyph, PxScale, ScaleFont as _, point};
use glam::Vec2;
use parking_lot::Mutex;

use tt_text::{TextAlign, TextBaseline, TextStyle};

/// Anti-aliased coverage of a laid-out string, `[0, 1]` per pixel.
///
/// `offset` is the top-left of the mask relative to the text origin (the
/// point that later lands on the projected screen position), in unscaled
/// glyph pixels. Alignment and baseline are already folded in.
#[derive(Clone, Debug)]
pub struct CoverageMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
    pub offset: Vec2,
}

impl CoverageMask {
    pub fn new(width: u32, height: u32, offset: Vec2) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; (width * height) as usize],
            offset,
        }
    }

    /// Zero outside the mask.
    #[inline]
    pub fn coverage(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            0.0
        } else {
            self.data[(y as u32 * self.width + x as u32) as usize]
        }
    }

    /// Bilinear coverage at a subpixel position.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as i32;
        let y0 = y0 as i32;

        let v00 = self.coverage(x0, y0);
        let v10 = self.coverage(x0 + 1, y0);
        let v01 = self.coverage(x0, y0 + 1);
        let v11 = self.coverage(x0 + 1, y0 + 1);

        let top = v00 + (v10 - v00) * fx;
        let bottom = v01 + (v11 - v01) * fx;
        top + (bottom - top) * fy
    }

    /// Additive write, saturating at full coverage.
    #[inline]
    pub fn add(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            let cell = &mut self.data[(y * self.width + x) as usize];
            *cell = (*cell + value).min(1.0);
        }
    }
}

/// Where the text origin sits relative to baseline-left coordinates.
///
/// The returned shift is *added* to baseline-relative glyph positions to
/// express them relative to the aligned origin.
pub(crate) fn origin_shift(
    advance_width: f32,
    ascent: f32,
    descent: f32,
    style: &TextStyle,
) -> Vec2 {
    let dx = match style.align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -advance_width * 0.5,
        TextAlign::Right => -advance_width,
    };
    // `descent` is negative (below the baseline), screen y grows downward.
    let dy = match style.baseline {
        TextBaseline::Top => ascent,
        TextBaseline::Middle => (ascent + descent) * 0.5,
        TextBaseline::Alphabetic => 0.0,
        TextBaseline::Bottom => descent,
    };
    Vec2::new(dx, dy)
}

/// The glyph seam: layout/measure and rasterize, nothing else.
///
/// Splitting this from placement keeps the projection math testable without
/// font data, and lets embedders swap in their own text stack.
pub trait GlyphRasterizer {
    /// Unscaled axis-aligned size of the rendered string: advance width by
    /// em height.
    fn measure(&self, content: &str, style: &TextStyle) -> Vec2;

    /// Rasterizes the string at its nominal size. The mask is positioned
    /// relative to the aligned origin via [`CoverageMask::offset`].
    fn rasterize(&self, content: &str, style: &TextStyle) -> Arc<CoverageMask>;
}

// ----------------------------------------------------------------------------

type MaskCacheKey = (String, u32);

/// [`GlyphRasterizer`] backed by `ab_glyph` over caller-supplied font bytes.
///
/// One instance wraps one font face; the style's family/weight/italic pick
/// which instance to use at a higher level (there is no font database in
/// here). Rasterized strings are cached per (content, size).
pub struct AbGlyphRasterizer {
    font: FontArc,
    cache: Mutex<ahash::HashMap<MaskCacheKey, Arc<CoverageMask>>>,
}

impl AbGlyphRasterizer {
    pub fn from_font_bytes(bytes: Vec<u8>) -> Result<Self, ab_glyph::InvalidFont> {
        Ok(Self {
            font: FontArc::try_from_vec(bytes)?,
            cache: Mutex::new(ahash::HashMap::default()),
        })
    }

    /// Baseline-relative glyph layout: positioned glyphs, total advance,
    /// ascent and descent.
    fn layout(&self, content: &str, size: f32) -> (Vec<Glyph>, f32, f32, f32) {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);

        let mut glyphs = Vec::with_capacity(content.chars().count());
        let mut x = 0.0f32;
        let mut previous = None;
        for c in content.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                x += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(x, 0.0)));
            x += scaled.h_advance(id);
            previous = Some(id);
        }

        (glyphs, x, scaled.ascent(), scaled.descent())
    }
}

impl GlyphRasterizer for AbGlyphRasterizer {
    fn measure(&self, content: &str, style: &TextStyle) -> Vec2 {
        let (_, advance, ascent, descent) = self.layout(content, style.size);
        Vec2::new(advance, ascent - descent)
    }

    fn rasterize(&self, content: &str, style: &TextStyle) -> Arc<CoverageMask> {
        let key = (content.to_owned(), style.size.to_bits());
        {
            let cache = self.cache.lock();
            if let Some(mask) = cache.get(&key) {
                return mask.clone();
            }
        }

        let (glyphs, advance, ascent, descent) = self.layout(content, style.size);
        let shift = origin_shift(advance, ascent, descent, style);

        // Tight pixel bounds over all outlines, in baseline coordinates.
        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        let outlined: Vec<_> = glyphs
            .into_iter()
            .filter_map(|glyph| self.font.outline_glyph(glyph))
            .collect();
        for outline in &outlined {
            let bounds = outline.px_bounds();
            min = min.min(Vec2::new(bounds.min.x, bounds.min.y));
            max = max.max(Vec2::new(bounds.max.x, bounds.max.y));
        }

        let mask = if outlined.is_empty() {
            // Whitespace-only content still needs a valid (empty) mask.
            Arc::new(CoverageMask::new(0, 0, shift))
        } else {
            let width = (max.x - min.x).ceil() as u32 + 1;
            let height = (max.y - min.y).ceil() as u32 + 1;
            let mut mask = CoverageMask::new(width, height, min + shift);
            for outline in &outlined {
                let bounds = outline.px_bounds();
                let dx = (bounds.min.x - min.x) as i32;
                let dy = (bounds.min.y - min.y) as i32;
                outline.draw(|x, y, coverage| {
                    let mx = x as i32 + dx;
                    let my = y as i32 + dy;
                    if mx >= 0 && my >= 0 {
                        mask.add(mx as u32, my as u32, coverage);
                    }
                });
            }
            Arc::new(mask)
        };

        self.cache.lock().insert(key, mask.clone());
        mask
    }
}
