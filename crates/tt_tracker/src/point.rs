use std::collections::BTreeMap;

use glam::Vec2;
use itertools::Itertools as _;

use tt_types::{FrameNr, IdGen, PointId};

/// Default optical-flow window, in pixels.
pub const DEFAULT_WINDOW_SIZE: u32 = 21;

/// Default per-frame displacement limit, in pixels. A point that appears to
/// jump farther than this in one frame is treated as lost.
pub const DEFAULT_SEARCH_RADIUS: f32 = 21.0;

/// A single tracked feature.
///
/// `frame_positions` is the authoritative, frame-indexed history; `pos` is a
/// mirror of the most recent commit so readers get a consistent snapshot
/// without a map lookup. `trajectory` is the append-only log of tracked
/// commits, in commit order (which is not necessarily frame order after a
/// scrub).
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct TrackingPoint {
    pub id: PointId,

    /// Mirror of the last committed position.
    pub pos: Vec2,

    /// Trackability estimate in `[0, 1]`.
    pub confidence: f32,

    pub active: bool,

    #[serde(with = "crate::frame_pairs")]
    pub frame_positions: BTreeMap<FrameNr, Vec2>,

    /// Append-only audit log of `(position, frame)` commits.
    pub trajectory: Vec<(Vec2, FrameNr)>,

    /// Displacement limit hint for the flow primitive, in pixels.
    pub search_radius: f32,

    /// Window-size hint for the flow primitive, in pixels.
    pub adaptive_window_size: u32,
}

impl TrackingPoint {
    fn new(id: PointId, pos: Vec2, frame: FrameNr, confidence: f32) -> Self {
        Self {
            id,
            pos,
            confidence,
            active: true,
            frame_positions: BTreeMap::from([(frame, pos)]),
            trajectory: vec![(pos, frame)],
            search_radius: DEFAULT_SEARCH_RADIUS,
            adaptive_window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Position at `frame`: the exact history entry if present, else the
    /// live mirror. Never fails; a point with a single commit answers for
    /// every frame.
    #[inline]
    pub fn position_at(&self, frame: FrameNr) -> Vec2 {
        self.frame_positions.get(&frame).copied().unwrap_or(self.pos)
    }

    /// Frame of the most recent history entry.
    pub fn latest_frame(&self) -> Option<FrameNr> {
        self.frame_positions.keys().next_back().copied()
    }
}

/// Arena of [`TrackingPoint`]s with stable ids.
///
/// Iteration order is id order, which makes every whole-store pass
/// deterministic.
#[derive(Clone, Debug, Default)]
pub struct PointStore {
    points: BTreeMap<PointId, TrackingPoint>,
    id_gen: IdGen,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point whose history starts at `frame` with full confidence.
    pub fn create(&mut self, pos: Vec2, frame: FrameNr) -> PointId {
        self.create_with_confidence(pos, frame, 1.0)
    }

    pub fn create_with_confidence(
        &mut self,
        pos: Vec2,
        frame: FrameNr,
        confidence: f32,
    ) -> PointId {
        let id = PointId::from_u64(self.id_gen.mint());
        self.points
            .insert(id, TrackingPoint::new(id, pos, frame, confidence.clamp(0.0, 1.0)));
        id
    }

    #[inline]
    pub fn get(&self, id: PointId) -> Option<&TrackingPoint> {
        self.points.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: PointId) -> Option<&mut TrackingPoint> {
        self.points.get_mut(&id)
    }

    pub fn remove(&mut self, id: PointId) -> Option<TrackingPoint> {
        self.points.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackingPoint> {
        self.points.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackingPoint> {
        self.points.values_mut()
    }

    /// Ids of points that are still being tracked, in id order.
    pub fn active_ids(&self) -> Vec<PointId> {
        self.points
            .values()
            .filter(|p| p.active)
            .map(|p| p.id)
            .collect_vec()
    }

    /// Commits a tracked position for `frame`: history entry, live mirror
    /// and trajectory are updated together, so a reader never sees a
    /// half-written frame.
    ///
    /// Returns `false` if the point does not exist.
    pub fn commit(&mut self, id: PointId, frame: FrameNr, pos: Vec2) -> bool {
        let Some(point) = self.points.get_mut(&id) else {
            return false;
        };

        point.frame_positions.insert(frame, pos);
        point.pos = pos;
        point.trajectory.push((pos, frame));
        true
    }

    /// Resets every live mirror to the point's position at `frame`, giving
    /// readers a consistent snapshot after nonlinear navigation.
    pub fn sync_to_frame(&mut self, frame: FrameNr) {
        for point in self.points.values_mut() {
            point.pos = point.position_at(frame);
        }
    }
}

// ----------------------------------------------------------------------------

use serde::{Deserialize as _, Serialize as _};

#[derive(serde::Deserialize, serde::Serialize)]
struct PointStoreDoc {
    points: Vec<TrackingPoint>,
    id_gen: IdGen,
}

impl serde::Serialize for PointStore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PointStoreDoc {
            points: self.points.values().cloned().collect(),
            id_gen: self.id_gen.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for PointStore {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = PointStoreDoc::deserialize(deserializer)?;
        let mut id_gen = doc.id_gen;
        let mut points = BTreeMap::new();
        for point in doc.points {
            id_gen.reserve_through(point.id.as_u64());
            points.insert(point.id, point);
        }
        Ok(Self { points, id_gen })
    }
}

// ----------------------------------------------------------------------------
