//! The tracktext export compositor.
//!
//! [`export`] walks the output timeline frame by frame: seek the source,
//! resample to the output size, draw the tracked overlays, hand the
//! composed raster to the encoder sink with its presentation timestamp.
//!
//! Scheduling is single-threaded cooperative. The loop suspends at source
//! seeks, sink submissions and once between frames; shared state is plain
//! `&mut`, no locks. Cancellation is observed at the top of every iteration
//! and at every suspension point, and surfaces as
//! [`ExportError::Cancelled`] without a partial flush.

mod cancel;
mod compositor;
mod error;
mod frame;
mod progress;
mod settings;
mod sink;
mod source;

pub use self::cancel::CancelToken;
pub use self::compositor::{ExportSummary, export};
pub use self::error::{ExportError, SinkError, SourceError};
pub use self::frame::RgbaFrame;
pub use self::progress::{ExportProgress, ExportStage};
pub use self::settings::{ExportSettings, QualityPreset};
pub use self::sink::{Codec, EncoderConfig, EncoderSink};
pub use self::source::FrameSource;
