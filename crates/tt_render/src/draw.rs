use glam::Vec2;

use tt_text::{TextStore, TextStyle};
use tt_tracker::{PlanarStore, PointStore};
use tt_types::{FrameNr, Rgba8};

use crate::place::{PlacedText, place_text};
use crate::raster::{CoverageMask, GlyphRasterizer};

/// Stroke width under the fill, in unscaled glyph pixels.
pub const STROKE_WIDTH_PX: f32 = 2.0;

/// Ring of sample offsets approximating a stroke of [`STROKE_WIDTH_PX`].
const STROKE_RING: [(f32, f32); 8] = [
    (2.0, 0.0),
    (-2.0, 0.0),
    (0.0, 2.0),
    (0.0, -2.0),
    (1.5, 1.5),
    (1.5, -1.5),
    (-1.5, 1.5),
    (-1.5, -1.5),
];

/// Draws every visible text of `frame` into `canvas`.
///
/// Elements are drawn in id order, so later-created texts end up on top;
/// the same stacking the hit test assumes. Selection and hover state never
/// reach the canvas; exported frames only carry content styling.
pub fn render_overlays(
    canvas: &mut image::RgbaImage,
    points: &PointStore,
    planars: &PlanarStore,
    texts: &TextStore,
    rasterizer: &dyn GlyphRasterizer,
    frame: FrameNr,
) {
    let viewport = Vec2::new(canvas.width() as f32, canvas.height() as f32);

    for text in texts.iter().filter(|t| t.shown_at(frame)) {
        let Some(placed) = place_text(points, planars, text, frame, viewport) else {
            tt_log::debug!("{}: anchor is gone, skipping", text.id);
            continue;
        };
        if !placed.on_canvas {
            continue;
        }
        let mask = rasterizer.rasterize(&text.content, &text.style);
        draw_text(canvas, &placed, &text.style, &mask);
    }
}

/// Composites one rasterized string into the canvas: a black stroke pass
/// under a fill pass in the style color, both at the placed opacity.
///
/// The mask is mapped through rotate/scale by inverse sampling, so the
/// same coverage serves every orientation and zoom.
pub fn draw_text(
    canvas: &mut image::RgbaImage,
    placed: &PlacedText,
    style: &TextStyle,
    mask: &CoverageMask,
) {
    if mask.width == 0 || mask.height == 0 {
        return;
    }
    let scale = placed.scale;
    if scale.x.abs() < 1e-4 || scale.y.abs() < 1e-4 {
        return;
    }

    let (sin, cos) = placed.rotation.sin_cos();
    let rotate = |p: Vec2| Vec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
    let unrotate = |p: Vec2| Vec2::new(p.x * cos + p.y * sin, -p.x * sin + p.y * cos);

    // Screen-space bounding box of the transformed mask, padded for the
    // stroke ring.
    let pad = STROKE_WIDTH_PX;
    let corners = [
        Vec2::new(-pad, -pad),
        Vec2::new(mask.width as f32 + pad, -pad),
        Vec2::new(mask.width as f32 + pad, mask.height as f32 + pad),
        Vec2::new(-pad, mask.height as f32 + pad),
    ];
    let mut min = Vec2::new(f32::MAX, f32::MAX);
    let mut max = Vec2::new(f32::MIN, f32::MIN);
    for corner in corners {
        let screen = placed.screen + rotate((corner + mask.offset) * scale);
        min = min.min(screen);
        max = max.max(screen);
    }

    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil() as i64).clamp(0, i64::from(canvas.width())) as u32;
    let y1 = (max.y.ceil() as i64).clamp(0, i64::from(canvas.height())) as u32;

    let fill = style.color;
    let fill_alpha = f32::from(fill.a()) / 255.0 * placed.opacity;
    let stroke_alpha = placed.opacity;

    for y in y0..y1 {
        for x in x0..x1 {
            let screen = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let local = unrotate(screen - placed.screen) / scale - mask.offset;

            let fill_cov = mask.sample(local.x, local.y);
            let mut stroke_cov = fill_cov;
            for (dx, dy) in STROKE_RING {
                if stroke_cov >= 1.0 {
                    break;
                }
                stroke_cov = stroke_cov.max(mask.sample(local.x + dx, local.y + dy));
            }

            if stroke_cov > 0.0 {
                blend(canvas, x, y, Rgba8::BLACK, stroke_cov * stroke_alpha);
            }
            if fill_cov > 0.0 {
                blend(canvas, x, y, fill, fill_cov * fill_alpha);
            }
        }
    }
}

/// Source-over blend of `color` at `alpha` onto one canvas pixel.
fn blend(canvas: &mut image::RgbaImage, x: u32, y: u32, color: Rgba8, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x, y);
    for channel in 0..3 {
        let src = f32::from(color.0[channel]);
        let old = f32::from(dst.0[channel]);
        dst.0[channel] = (src * alpha + old * (1.0 - alpha)).round() as u8;
    }
    let old_a = f32::from(dst.0[3]) / 255.0;
    dst.0[3] = ((alpha + old_a * (1.0 - alpha)) * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use tt_text::Anchor;
    use tt_types::TextId;

    use crate::testing::BoxGlyphs;

    use super::*;

    fn black_canvas(w: u32, h: u32) -> image::RgbaImage {
        image::RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 255]))
    }

    fn placed_at(screen: Vec2) -> PlacedText {
        PlacedText {
            text_id: TextId::from_u64(1),
            screen,
            rotation: 0.0,
            scale: Vec2::ONE,
            opacity: 1.0,
            on_canvas: true,
        }
    }

    #[test]
    fn draw_puts_fill_pixels_on_the_canvas() {
        let mut canvas = black_canvas(200, 100);
        let style = TextStyle::default(); // white fill
        let mask = BoxGlyphs.rasterize("X", &style);

        draw_text(&mut canvas, &placed_at(Vec2::new(100.0, 60.0)), &style, &mask);

        let white_pixels = canvas
            .pixels()
            .filter(|p| p.0[0] > 200 && p.0[1] > 200 && p.0[2] > 200)
            .count();
        assert!(white_pixels > 0, "the glyph body should be filled white");
    }

    #[test]
    fn opacity_dims_the_fill() {
        let style = TextStyle::default();
        let mask = BoxGlyphs.rasterize("X", &style);

        let mut opaque = black_canvas(200, 100);
        draw_text(&mut opaque, &placed_at(Vec2::new(100.0, 60.0)), &style, &mask);

        let mut dimmed = black_canvas(200, 100);
        let mut placed = placed_at(Vec2::new(100.0, 60.0));
        placed.opacity = 0.3;
        draw_text(&mut dimmed, &placed, &style, &mask);

        let brightest = |img: &image::RgbaImage| img.pixels().map(|p| p.0[0]).max().unwrap();
        assert!(brightest(&opaque) > brightest(&dimmed));
        assert!(brightest(&dimmed) > 0);
    }

    #[test]
    fn stroke_outlines_in_black_on_a_light_background() {
        let mut canvas =
            image::RgbaImage::from_pixel(200, 100, image::Rgba([200, 200, 200, 255]));
        let style = TextStyle::default();
        let mask = BoxGlyphs.rasterize("X", &style);

        draw_text(&mut canvas, &placed_at(Vec2::new(100.0, 60.0)), &style, &mask);

        // Some pixels must now be darker than the background: the stroke.
        let dark_pixels = canvas.pixels().filter(|p| p.0[0] < 60).count();
        assert!(dark_pixels > 0, "the stroke should darken the outline");
    }

    #[test]
    fn empty_content_draws_nothing() {
        let mut canvas = black_canvas(64, 64);
        let before = canvas.clone();
        let style = TextStyle::default();
        let mask = BoxGlyphs.rasterize("", &style);

        draw_text(&mut canvas, &placed_at(Vec2::new(32.0, 32.0)), &style, &mask);
        assert_eq!(canvas, before);
    }

    #[test]
    fn render_overlays_skips_dangling_anchors() {
        let mut canvas = black_canvas(64, 64);
        let before = canvas.clone();

        let points = PointStore::new();
        let planars = PlanarStore::new();
        let mut texts = TextStore::new();
        texts.create(Anchor::Point(tt_types::PointId::from_u64(77)), FrameNr::ZERO);

        render_overlays(&mut canvas, &points, &planars, &texts, &BoxGlyphs, FrameNr::ZERO);
        assert_eq!(canvas, before);
    }
}
