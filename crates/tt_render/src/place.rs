use glam::{Vec2, Vec3};

use tt_geometry::{Homography, project_to_screen};
use tt_text::{Anchor, TextElement, TextStore};
use tt_tracker::{PlanarStore, PointStore};
use tt_types::{FrameNr, TextId};

use crate::raster::{GlyphRasterizer, origin_shift};

/// Distance from the implied camera to the z=0 plane, used for the depth
/// scale cue.
pub const CAMERA_Z: f32 = 500.0;

/// Depth distances inside this read fully opaque…
const OPACITY_NEAR: f32 = 300.0;

/// …and beyond this at the floor opacity, with a linear ramp in between.
const OPACITY_FAR: f32 = 800.0;

const OPACITY_FLOOR: f32 = 0.3;

/// Screen placement of one text element at one frame: everything the pixel
/// pass needs, and nothing it has to recompute.
#[derive(Clone, Copy, Debug)]
pub struct PlacedText {
    pub text_id: TextId,

    /// Projected screen position of the text origin.
    pub screen: Vec2,

    /// In-plane rotation, radians.
    pub rotation: f32,

    /// Effective scale: style scale × depth scale × foreshortening.
    pub scale: Vec2,

    /// Depth-derived opacity in `[OPACITY_FLOOR, 1]`.
    pub opacity: f32,

    /// False when the origin projects outside the canvas; such texts are
    /// not drawn.
    pub on_canvas: bool,
}

/// Computes where `text` lands at `frame`.
///
/// Planar anchors are expected to be synced to `frame` already (the caller
/// owns navigation); point anchors answer from their committed history.
/// Returns `None` when the anchor has been deleted; the element is simply
/// skipped, dangling references are not an error.
pub fn place_text(
    points: &PointStore,
    planars: &PlanarStore,
    text: &TextElement,
    frame: FrameNr,
    viewport: Vec2,
) -> Option<PlacedText> {
    let (anchor, homography) = match text.anchor {
        Anchor::Point(id) => {
            let point = points.get(id)?;
            (point.position_at(frame), None)
        }
        Anchor::Planar(id) => {
            let tracker = planars.get(id)?;
            (tracker.center, tracker.homography)
        }
    };

    let offset = text.transform.position;
    let mut world = Vec3::new(anchor.x + offset.x, anchor.y + offset.y, offset.z);
    if homography.is_some() {
        world = Homography::apply_opt(world, homography.as_ref());
    }

    let screen = project_to_screen(world, viewport);
    let on_canvas = screen.x >= 0.0
        && screen.x <= viewport.x
        && screen.y >= 0.0
        && screen.y <= viewport.y;

    // Depth scale: objects in front of z=0 grow, behind shrink. A divisor
    // at or behind the camera would flip the image; clamp to neutral.
    let divisor = CAMERA_Z - world.z;
    let depth_scale = if divisor > 0.0 { CAMERA_Z / divisor } else { 1.0 };

    // Cheap foreshortening: out-of-plane rotation squashes the raster.
    let rotation_deg = text.transform.rotation_deg;
    let foreshorten = Vec2::new(
        rotation_deg.y.to_radians().cos(),
        rotation_deg.x.to_radians().cos(),
    );

    let depth = (CAMERA_Z - world.z).abs();
    let opacity = if depth <= OPACITY_NEAR {
        1.0
    } else if depth >= OPACITY_FAR {
        OPACITY_FLOOR
    } else {
        let t = (depth - OPACITY_NEAR) / (OPACITY_FAR - OPACITY_NEAR);
        1.0 - (1.0 - OPACITY_FLOOR) * t
    };

    Some(PlacedText {
        text_id: text.id,
        screen,
        rotation: rotation_deg.z.to_radians(),
        scale: text.transform.scale * depth_scale * foreshorten,
        opacity,
        on_canvas,
    })
}

/// Topmost text whose bounds contain `at`, or `None`.
///
/// Bounds are the measured glyph box at depth zero with the style scale
/// applied, tested axis-aligned (rotation is ignored, like the authoring
/// canvas does). Later elements sit on top.
pub fn hit_test(
    points: &PointStore,
    planars: &PlanarStore,
    texts: &TextStore,
    rasterizer: &dyn GlyphRasterizer,
    frame: FrameNr,
    viewport: Vec2,
    at: Vec2,
) -> Option<TextId> {
    let mut candidates: Vec<&TextElement> =
        texts.iter().filter(|t| t.shown_at(frame)).collect();
    candidates.reverse();

    for text in candidates {
        let Some(placed) = place_text(points, planars, text, frame, viewport) else {
            continue;
        };

        let size = rasterizer.measure(&text.content, &text.style);
        let scale = text.transform.scale.abs();

        // Same origin convention as rasterization: ascent ≈ 80% of the em.
        // In origin-relative coordinates the em box spans
        // x ∈ [dx, dx + advance], y ∈ [dy − ascent, dy − descent].
        let ascent = size.y * 0.8;
        let descent = size.y * -0.2;
        let shift = origin_shift(size.x, ascent, descent, &text.style);

        let min = placed.screen + Vec2::new(shift.x, shift.y - ascent) * scale;
        let max = min + size * scale;
        if at.x >= min.x && at.x <= max.x && at.y >= min.y && at.y <= max.y {
            return Some(text.id);
        }
    }

    None
}
