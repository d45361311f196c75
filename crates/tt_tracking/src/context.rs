use glam::Vec2;

use tt_text::TextStore;
use tt_tracker::{PlanarStore, PointStore};
use tt_types::{FrameNr, TrackerId};
use tt_vision::GrayImage;

use crate::driver::seed_features;

/// All mutable tracking state of a session: feature points, planar trackers
/// and text elements.
///
/// The context is a plain value owned by the application root and passed by
/// `&mut` into every operation. Everything is mutated from one logical
/// executor, so there is no locking anywhere.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct TrackerContext {
    pub points: PointStore,
    pub planars: PlanarStore,
    pub texts: TextStore,
}

impl TrackerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewinds all stores to a consistent snapshot of `frame`, so that
    /// readers (rendering, export) observe one coherent moment in time.
    pub fn sync_to_frame(&mut self, frame: FrameNr) {
        self.points.sync_to_frame(frame);
        self.planars.sync_all_to_frame(frame);
    }

    /// Creates a planar tracker from a user click and seeds its feature
    /// grid. With a grayscale raster the grid points snap to nearby texture
    /// for better trackability.
    pub fn create_planar_tracker(
        &mut self,
        click: Vec2,
        video_dims: Vec2,
        frame: FrameNr,
        gray: Option<&GrayImage>,
    ) -> TrackerId {
        let id = self.planars.create(click, video_dims, frame);
        let tracker = self
            .planars
            .get_mut(id)
            .expect("the tracker that was just created");
        seed_features(&mut self.points, tracker, gray, frame);
        id
    }

    /// Manual corner adjustment; see [`tt_tracker::PlanarTracker::set_corner`].
    ///
    /// Returns `false` if the tracker does not exist.
    pub fn adjust_corner(&mut self, id: TrackerId, corner: usize, pos: Vec2) -> bool {
        let Some(tracker) = self.planars.get_mut(id) else {
            return false;
        };
        tracker.set_corner(corner, pos);
        true
    }
}
