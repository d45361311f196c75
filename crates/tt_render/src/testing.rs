//! Font-free test double for the glyph seam.

use std::sync::Arc;

use glam::Vec2;

use tt_text::TextStyle;

use crate::raster::{CoverageMask, GlyphRasterizer, origin_shift};

/// Em-box proportions of the fake font.
const ADVANCE_PER_EM: f32 = 0.6;
const ASCENT_PER_EM: f32 = 0.8;

/// Renders every character as a filled box of 60% em advance; deterministic
/// glyph geometry with no font data, for tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxGlyphs;

impl GlyphRasterizer for BoxGlyphs {
    fn measure(&self, content: &str, style: &TextStyle) -> Vec2 {
        let chars = content.chars().count() as f32;
        Vec2::new(chars * style.size * ADVANCE_PER_EM, style.size)
    }

    fn rasterize(&self, content: &str, style: &TextStyle) -> Arc<CoverageMask> {
        let size = style.size;
        let advance = size * ADVANCE_PER_EM;
        let ascent = size * ASCENT_PER_EM;
        let descent = ascent - size; // negative

        let num_chars = content.chars().count() as u32;
        if num_chars == 0 {
            return Arc::new(CoverageMask::new(0, 0, Vec2::ZERO));
        }

        let width = (num_chars as f32 * advance).ceil() as u32;
        let height = size.ceil() as u32;
        let shift = origin_shift(num_chars as f32 * advance, ascent, descent, style);

        // Mask top-left sits at (0, -ascent) in baseline coordinates.
        let mut mask = CoverageMask::new(width, height, Vec2::new(0.0, -ascent) + shift);

        // One box per character, with a one-pixel gutter between boxes.
        for i in 0..num_chars {
            let left = (i as f32 * advance).round() as u32;
            let right = (((i + 1) as f32 * advance).round() as u32).saturating_sub(1);
            for y in 0..height {
                for x in left..right.min(width) {
                    mask.add(x, y, 1.0);
                }
            }
        }

        Arc::new(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_scales_with_content_and_size() {
        let style = TextStyle::default(); // 38 px
        let one = BoxGlyphs.measure("a", &style);
        let three = BoxGlyphs.measure("abc", &style);
        assert!((three.x - one.x * 3.0).abs() < 1e-4);
        assert_eq!(one.y, 38.0);
    }

    #[test]
    fn rasterize_fills_boxes() {
        let style = TextStyle::default();
        let mask = BoxGlyphs.rasterize("ab", &style);
        assert!(mask.width > 0 && mask.height > 0);
        // Middle of the first box is covered.
        assert_eq!(mask.coverage(5, 10), 1.0);
    }

    #[test]
    fn empty_string_is_an_empty_mask() {
        let mask = BoxGlyphs.rasterize("", &TextStyle::default());
        assert_eq!((mask.width, mask.height), (0, 0));
    }
}
