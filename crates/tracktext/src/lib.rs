//! Motion-tracked text overlays for video.
//!
//! tracktext glues stylized text labels to tracked regions of a scene so
//! that the labels stay attached to surfaces or feature points as the
//! camera and subjects move:
//!
//! * [`TrackerContext`] holds the session state: tracked points, planar
//!   trackers and text elements.
//! * [`advance_frame`] runs the tracking engine over a frame pair through a
//!   [`VisionBackend`] (the built-in [`SoftwareVision`], or your own).
//! * [`place_text`] / [`render_overlays`] project and draw the overlays.
//! * [`export`] composites the annotated timeline into an encoder sink.
//! * [`ProjectDoc`] persists the whole session as a structured document.
//!
//! This crate is a facade: everything lives in the `tt_*` crates and is
//! re-exported here for convenience.

mod project;

pub use self::project::{ProjectDoc, ProjectError, SourceRef};

pub use tt_export::{
    CancelToken, Codec, EncoderConfig, EncoderSink, ExportError, ExportProgress, ExportSettings,
    ExportStage, ExportSummary, FrameSource, QualityPreset, RgbaFrame, SinkError, SourceError,
    export,
};
pub use tt_geometry::{Homography, Transform3D, point_in_convex_quad, project_to_screen};
pub use tt_render::{
    AbGlyphRasterizer, CoverageMask, GlyphRasterizer, PlacedText, draw_text, hit_test,
    place_text, render_overlays,
};
pub use tt_text::{
    Anchor, FontWeight, TextAlign, TextBaseline, TextElement, TextStore, TextStyle,
};
pub use tt_tracker::{
    PlanarCorner, PlanarStore, PlanarTracker, PointStore, TrackState, TrackingPoint,
    TrajectoryEntry,
};
pub use tt_tracking::{
    FrameReport, PlanarOutcome, TrackerContext, UpdateFailure, advance_frame,
};
pub use tt_types::{FrameNr, PointId, Rgba8, TextId, TrackerId};
pub use tt_vision::{
    FlowParams, FlowStatus, GrayImage, HomographyFit, HomographyParams, ImagePyramid,
    SoftwareVision, VisionBackend,
};
