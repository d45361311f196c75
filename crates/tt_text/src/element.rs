use glam::Vec2;

use tt_geometry::Transform3D;
use tt_types::{FrameNr, PointId, Rgba8, TextId, TrackerId};

/// What a text element is glued to.
///
/// Exactly one of the two; the "both set" and "neither set" states are
/// unrepresentable by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum Anchor {
    /// Follow a single tracked feature point.
    Point(PointId),
    /// Follow a planar tracker's center (and its homography).
    Planar(TrackerId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum TextBaseline {
    Top,
    Middle,
    #[default]
    Alphabetic,
    Bottom,
}

/// Font and paint settings of a text element.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TextStyle {
    pub font_family: String,
    /// Nominal glyph size in canvas pixels.
    pub size: f32,
    pub weight: FontWeight,
    pub italic: bool,
    pub color: Rgba8,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_owned(),
            size: 38.0,
            weight: FontWeight::Bold,
            italic: false,
            color: Rgba8::WHITE,
            align: TextAlign::Center,
            baseline: TextBaseline::Alphabetic,
        }
    }
}

/// A styled string glued to a tracked anchor.
///
/// `transform` is an *offset* from the anchor, not an absolute pose: the
/// anchor contributes the world x/y, the transform contributes the rest.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct TextElement {
    pub id: TextId,
    pub name: String,
    pub content: String,
    pub visible: bool,
    pub selected: bool,
    /// The element exists on frames at or after this one.
    pub created_frame: FrameNr,
    pub transform: Transform3D,
    pub style: TextStyle,
    pub anchor: Anchor,
}

impl TextElement {
    pub(crate) fn new(id: TextId, anchor: Anchor, created_frame: FrameNr, ordinal: u64) -> Self {
        Self {
            id,
            name: format!("Text {ordinal}"),
            content: "Text".to_owned(),
            visible: true,
            selected: false,
            created_frame,
            transform: Transform3D {
                position: glam::Vec3::ZERO,
                rotation_deg: glam::Vec3::ZERO,
                scale: Vec2::new(1.2, 1.2),
            },
            style: TextStyle::default(),
            anchor,
        }
    }

    /// Whether the element is drawn at `frame`.
    #[inline]
    pub fn shown_at(&self, frame: FrameNr) -> bool {
        self.visible && frame >= self.created_frame
    }
}
