//! Vision primitives for the tracktext tracking engine.
//!
//! The engine consumes exactly two operations, both behind the
//! [`VisionBackend`] trait:
//!
//! * [`VisionBackend::pyramidal_lk`]: sparse optical flow over grayscale
//!   pyramids;
//! * [`VisionBackend::find_homography`]: RANSAC homography with an inlier
//!   mask.
//!
//! [`SoftwareVision`] is the built-in pure-Rust backend: pyramidal
//! Lucas-Kanade with a min-eigenvalue trackability score, and DLT homography
//! fitting under a deterministic RANSAC loop. Heavier backends (e.g. an
//! OpenCV binding) can slot in behind the same trait.

mod backend;
mod flow;
mod gray;
mod homography;
mod pyramid;

pub use self::backend::{SoftwareVision, VisionBackend};
pub use self::flow::{FlowParams, FlowStatus, track_point};
pub use self::gray::{GRADIENT_CONFIDENCE_SCALE, GRADIENT_SNAP_RADIUS, GrayImage};
pub use self::homography::{HomographyFit, HomographyParams, homography_from_four, ransac_homography};
pub use self::pyramid::ImagePyramid;
