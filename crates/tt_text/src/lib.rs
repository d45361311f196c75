//! The tracktext text model.
//!
//! A [`TextElement`] is a styled string glued to exactly one [`Anchor`];
//! either a tracked feature point or a planar tracker. Elements reference
//! their anchor by id; a deleted anchor makes the element a render-time
//! skip, never a crash.

mod element;
mod store;

pub use self::element::{
    Anchor, FontWeight, TextAlign, TextBaseline, TextElement, TextStyle,
};
pub use self::store::TextStore;
