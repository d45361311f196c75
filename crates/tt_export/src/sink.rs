use std::future::Future;

use crate::{RgbaFrame, SinkError};

/// Output codec requested from the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Codec {
    #[default]
    H264,
    Vp9,
    Av1,
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::H264 => "h264",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
        })
    }
}

/// Everything the encoder needs to know before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderConfig {
    pub codec: Codec,
    pub width: u32,
    pub height: u32,
    /// Bits per second.
    pub bitrate: u32,
    pub framerate: f64,
    /// Every n-th frame is a keyframe.
    pub keyframe_interval: u32,
}

/// Where composed frames go.
///
/// `submit` is async so a backed-up encoder can exert back-pressure on the
/// export loop instead of buffering without bound.
pub trait EncoderSink {
    fn configure(&mut self, config: &EncoderConfig) -> Result<(), SinkError>;

    /// Hands one composed frame to the encoder, in presentation order.
    fn submit(&mut self, frame: RgbaFrame) -> impl Future<Output = Result<(), SinkError>>;

    /// Drains everything buffered. Called once, after the last frame.
    fn flush(&mut self) -> impl Future<Output = Result<(), SinkError>>;

    /// Releases encoder resources. Called on every exit path, including
    /// cancellation and errors.
    fn close(&mut self);
}
