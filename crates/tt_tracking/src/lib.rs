//! The tracktext tracking driver.
//!
//! [`advance_frame`] runs once per new frame: it flows every active feature
//! point through the vision backend, then updates each planar tracker
//! (homography fit, corner propagation, trajectory append), with feature
//! regeneration and a strike-based loss policy when things go wrong.
//!
//! All state lives in a [`TrackerContext`] owned by the caller and passed
//! into every operation; there are no process-wide singletons. Failures
//! inside the driver are local: they are logged and reported in the
//! [`FrameReport`], never raised to the caller.

mod context;
mod driver;

pub use self::context::TrackerContext;
pub use self::driver::{
    CONFIDENCE_FLOOR, FrameReport, LOST_AFTER_STRIKES, MIN_FEATURE_SPACING, MIN_FEATURES,
    PlanarOutcome, UpdateFailure, advance_frame, regenerate_features, seed_features,
};
