//! The tracktext tracker stores.
//!
//! This crate is the in-memory state of a tracking session:
//!
//! * [`PointStore`]: tracked feature points with per-frame position
//!   histories and append-only trajectories.
//! * [`PlanarStore`]: planar trackers: a quadrilateral region, its feature
//!   grid, per-frame homographies and a frame-indexed trajectory.
//!
//! Histories are `BTreeMap`s keyed by [`tt_types::FrameNr`], so "latest at or
//! before frame f" queries are `O(log n)`. All mutation happens from one
//! logical executor; readers always observe fully committed frames.

pub mod frame_pairs;

mod planar;
mod point;

pub use self::planar::{
    COORD_LIMIT, N_GRID, PlanarCorner, PlanarStore, PlanarTracker, TrackState, TrajectoryEntry,
    generate_grid,
};
pub use self::point::{
    DEFAULT_SEARCH_RADIUS, DEFAULT_WINDOW_SIZE, PointStore, TrackingPoint,
};
