use std::future::Future;

use crate::SourceError;

/// A seekable video frame source.
///
/// The compositor acquires the source at export start and drives it one
/// timestamp at a time: `seek`, await decode, read `current_frame`. Seeking
/// is the suspension point; a real decoder does its work there.
pub trait FrameSource {
    /// Native width and height of the decoded frames.
    fn dimensions(&self) -> (u32, u32);

    fn duration_secs(&self) -> f64;

    /// Positions the source at `t_secs` and resolves when the frame at that
    /// timestamp is decoded and readable.
    fn seek(&mut self, t_secs: f64) -> impl Future<Output = Result<(), SourceError>>;

    /// The most recently decoded raster. Only valid after a successful
    /// [`Self::seek`].
    fn current_frame(&self) -> &image::RgbaImage;
}
