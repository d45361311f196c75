use glam::Vec2;

use crate::{
    FlowParams, FlowStatus, HomographyFit, HomographyParams, ImagePyramid, ransac_homography,
    track_point,
};

/// The two vision operations the tracking engine needs.
///
/// The engine never looks inside; any implementation that can flow points
/// between two pyramids and fit a homography with an inlier mask will do.
pub trait VisionBackend {
    /// Tracks each of `points` from `prev` to `curr`. The returned vector
    /// is index-aligned with the input.
    fn pyramidal_lk(
        &self,
        prev: &ImagePyramid,
        curr: &ImagePyramid,
        points: &[Vec2],
        params: &FlowParams,
    ) -> Vec<FlowStatus>;

    /// Robustly fits `src → dst`. `None` means no usable model was found.
    fn find_homography(
        &self,
        src: &[Vec2],
        dst: &[Vec2],
        params: &HomographyParams,
    ) -> Option<HomographyFit>;
}

/// The built-in pure-Rust backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareVision;

impl VisionBackend for SoftwareVision {
    fn pyramidal_lk(
        &self,
        prev: &ImagePyramid,
        curr: &ImagePyramid,
        points: &[Vec2],
        params: &FlowParams,
    ) -> Vec<FlowStatus> {
        points
            .iter()
            .map(|&p| track_point(prev, curr, p, params))
            .collect()
    }

    fn find_homography(
        &self,
        src: &[Vec2],
        dst: &[Vec2],
        params: &HomographyParams,
    ) -> Option<HomographyFit> {
        ransac_homography(src, dst, params)
    }
}
