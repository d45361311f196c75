use std::collections::BTreeMap;

use glam::Vec2;

use tt_geometry::{Homography, quad_center, quad_is_convex};
use tt_types::{FrameNr, IdGen, PointId, TrackerId};

/// Target number of interior feature points per tracker (the 4 corners come
/// on top at seeding time).
pub const N_GRID: usize = 26;

/// Coordinates beyond this are treated as a degenerate transform.
pub const COORD_LIMIT: f32 = 10_000.0;

/// One corner of a planar tracker's quadrilateral.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlanarCorner {
    pub pos: Vec2,
    pub active: bool,
}

/// Snapshot of the quad at one frame. The frame number is the key of
/// [`PlanarTracker::trajectory`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TrajectoryEntry {
    pub center: Vec2,
    /// TL, TR, BR, BL.
    pub corners: [Vec2; 4],
}

/// Tracking health of a planar tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum TrackState {
    /// Created or manually repositioned; no homography yet.
    Idle,
    /// The last update produced a usable homography.
    Tracking,
    /// The last update fell back to feature regeneration or reverted a
    /// degenerate transform; the quad held still for that frame.
    Degraded,
    /// Too many consecutive bad frames; the automatic driver has given up.
    /// Only a manual corner adjustment revives the tracker.
    Lost,
}

/// A quadrilateral region of interest whose motion is estimated by one
/// 3×3 homography per frame.
///
/// `corners`/`center` are the *current* quad; `trajectory` is the
/// frame-indexed record the quad can be rewound from. `frame_homographies`
/// and `homography` are derived caches; cheap to rebuild, excluded from
/// persistence.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct PlanarTracker {
    pub id: TrackerId,

    /// TL, TR, BR, BL.
    pub corners: [PlanarCorner; 4],

    /// Always the arithmetic mean of the four corners.
    pub center: Vec2,

    /// Feature points inside the quad; the points themselves live in the
    /// shared point store.
    pub feature_points: Vec<PointId>,

    /// Last successful homography (previous frame → current frame).
    #[serde(skip)]
    pub homography: Option<Homography>,

    /// Per-frame homographies, rebuilt by tracking. Not persisted.
    #[serde(skip)]
    pub frame_homographies: BTreeMap<FrameNr, Homography>,

    #[serde(with = "crate::frame_pairs")]
    pub trajectory: BTreeMap<FrameNr, TrajectoryEntry>,

    /// Inlier fraction of the last homography fit, in `[0, 1]`.
    pub confidence: f32,

    /// Set by manual corner edits; cleared by the next feature regeneration.
    pub needs_feature_regen: bool,

    pub state: TrackState,

    /// Consecutive updates that did not produce a usable homography.
    pub strikes: u32,

    pub active: bool,
}

impl PlanarTracker {
    /// A tracker seeded from a user click: a centered axis-aligned square
    /// with side `0.2 · min(W, H)`.
    pub fn at_click(id: TrackerId, click: Vec2, video_dims: Vec2, frame: FrameNr) -> Self {
        let half = 0.1 * video_dims.x.min(video_dims.y);
        let corners = [
            click + Vec2::new(-half, -half), // TL
            click + Vec2::new(half, -half),  // TR
            click + Vec2::new(half, half),   // BR
            click + Vec2::new(-half, half),  // BL
        ];

        let mut trajectory = BTreeMap::new();
        trajectory.insert(
            frame,
            TrajectoryEntry {
                center: click,
                corners,
            },
        );

        Self {
            id,
            corners: corners.map(|pos| PlanarCorner { pos, active: true }),
            center: click,
            feature_points: Vec::new(),
            homography: None,
            frame_homographies: BTreeMap::new(),
            trajectory,
            confidence: 1.0,
            needs_feature_regen: false,
            state: TrackState::Idle,
            strikes: 0,
            active: true,
        }
    }

    /// Current corner positions, TL/TR/BR/BL.
    #[inline]
    pub fn quad(&self) -> [Vec2; 4] {
        [
            self.corners[0].pos,
            self.corners[1].pos,
            self.corners[2].pos,
            self.corners[3].pos,
        ]
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        tt_geometry::point_in_convex_quad(p, &self.quad())
    }

    pub fn recompute_center(&mut self) {
        self.center = quad_center(&self.quad());
    }

    /// Replaces the quad wholesale, keeping `center` in sync.
    pub fn set_quad(&mut self, quad: [Vec2; 4]) {
        for (corner, pos) in self.corners.iter_mut().zip(quad) {
            corner.pos = pos;
        }
        self.recompute_center();
    }

    /// Manual corner adjustment.
    ///
    /// Updates the corner and center, rewrites the *latest* trajectory entry
    /// in place (the edit corrects that frame rather than adding a new one),
    /// and requests feature regeneration so the next tracked frame starts
    /// from the edited quad. A `Lost` tracker comes back to life as `Idle`.
    pub fn set_corner(&mut self, corner: usize, pos: Vec2) {
        self.corners[corner].pos = pos;
        self.recompute_center();

        if let Some((&frame, _)) = self.trajectory.iter().next_back() {
            self.trajectory.insert(
                frame,
                TrajectoryEntry {
                    center: self.center,
                    corners: self.quad(),
                },
            );
        }

        self.needs_feature_regen = true;
        if self.state == TrackState::Lost {
            self.state = TrackState::Idle;
            self.active = true;
        }
        self.strikes = 0;
    }

    /// Records the current quad into the trajectory at `frame`.
    pub fn record_frame(&mut self, frame: FrameNr) {
        self.trajectory.insert(
            frame,
            TrajectoryEntry {
                center: self.center,
                corners: self.quad(),
            },
        );
    }

    /// Rewinds or fast-forwards the quad to `frame`:
    ///
    /// 1. an exact trajectory entry wins;
    /// 2. else the most recent entry before `frame`;
    /// 3. else the earliest entry after it;
    /// 4. else nothing changes.
    ///
    /// The cached homography follows along (latest at or before `frame`).
    pub fn sync_to_frame(&mut self, frame: FrameNr) {
        let entry = self
            .trajectory
            .get(&frame)
            .or_else(|| self.trajectory.range(..frame).next_back().map(|(_, e)| e))
            .or_else(|| self.trajectory.range(frame..).next().map(|(_, e)| e))
            .copied();

        if let Some(entry) = entry {
            self.set_quad(entry.corners);
            self.center = entry.center;
        }

        self.homography = self
            .frame_homographies
            .range(..=frame)
            .next_back()
            .map(|(_, h)| *h);
    }

    /// The quad invariants that every mutation must maintain.
    pub fn quad_is_sane(&self) -> bool {
        let quad = self.quad();
        quad_is_convex(&quad)
            && quad
                .iter()
                .all(|c| c.is_finite() && c.x.abs() <= COORD_LIMIT && c.y.abs() <= COORD_LIMIT)
            && (self.center - quad_center(&quad)).length() < 1e-3
    }
}

/// Uniform feature-point lattice over a convex quad: up to [`N_GRID`]
/// interior points by bilinear interpolation (top edge TL→TR, bottom edge
/// BL→BR), followed by the four corners.
pub fn generate_grid(quad: &[Vec2; 4]) -> Vec<Vec2> {
    let side = (N_GRID as f32).sqrt().ceil() as usize;
    let mut grid = Vec::with_capacity(N_GRID + 4);

    'rows: for row in 0..side {
        for col in 0..side {
            if grid.len() >= N_GRID {
                break 'rows;
            }
            let u = (col as f32 + 0.5) / side as f32;
            let v = (row as f32 + 0.5) / side as f32;
            let top = quad[0].lerp(quad[1], u);
            let bottom = quad[3].lerp(quad[2], u);
            grid.push(top.lerp(bottom, v));
        }
    }

    grid.extend_from_slice(quad);
    grid
}

// ----------------------------------------------------------------------------

/// Arena of [`PlanarTracker`]s with stable ids.
#[derive(Clone, Debug, Default)]
pub struct PlanarStore {
    trackers: BTreeMap<TrackerId, PlanarTracker>,
    id_gen: IdGen,
}

impl PlanarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker from a user click. Feature seeding is the driver's
    /// job; it needs the frame raster.
    pub fn create(&mut self, click: Vec2, video_dims: Vec2, frame: FrameNr) -> TrackerId {
        let id = TrackerId::from_u64(self.id_gen.mint());
        self.trackers
            .insert(id, PlanarTracker::at_click(id, click, video_dims, frame));
        id
    }

    #[inline]
    pub fn get(&self, id: TrackerId) -> Option<&PlanarTracker> {
        self.trackers.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: TrackerId) -> Option<&mut PlanarTracker> {
        self.trackers.get_mut(&id)
    }

    pub fn remove(&mut self, id: TrackerId) -> Option<PlanarTracker> {
        self.trackers.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Trackers in id order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanarTracker> {
        self.trackers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlanarTracker> {
        self.trackers.values_mut()
    }

    pub fn sync_all_to_frame(&mut self, frame: FrameNr) {
        for tracker in self.trackers.values_mut() {
            tracker.sync_to_frame(frame);
        }
    }
}

// ----------------------------------------------------------------------------

use serde::{Deserialize as _, Serialize as _};

#[derive(serde::Deserialize, serde::Serialize)]
struct PlanarStoreDoc {
    trackers: Vec<PlanarTracker>,
    id_gen: IdGen,
}

impl serde::Serialize for PlanarStore {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PlanarStoreDoc {
            trackers: self.trackers.values().cloned().collect(),
            id_gen: self.id_gen.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for PlanarStore {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = PlanarStoreDoc::deserialize(deserializer)?;
        let mut id_gen = doc.id_gen;
        let mut trackers = BTreeMap::new();
        for tracker in doc.trackers {
            id_gen.reserve_through(tracker.id.as_u64());
            trackers.insert(tracker.id, tracker);
        }
        Ok(Self { trackers, id_gen })
    }
}

// ----------------------------------------------------------------------------
