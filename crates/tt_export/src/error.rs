/// Errors that abort a whole export.
///
/// Everything else that can go wrong during an export (a tracker update
/// failing, a text with a dangling anchor) is local by design and never
/// reaches this type.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("frame source unavailable after frame {last_frame}: {reason}")]
    SourceUnavailable { last_frame: i64, reason: String },

    #[error("output write failed: {reason}")]
    OutputWrite { reason: String },

    /// User-initiated; reported, but not an error in logs.
    #[error("export cancelled")]
    Cancelled,
}

/// Failure reported by a [`crate::FrameSource`].
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct SourceError(pub String);

/// Failure reported by an [`crate::EncoderSink`].
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct SinkError(pub String);
