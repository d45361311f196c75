/// Phase of an export run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
}

/// One progress tick, delivered to the export callback.
///
/// Progress is reported per frame; local tracking/rendering hiccups are
/// folded into `message` rather than failing the export.
#[derive(Clone, Debug)]
pub struct ExportProgress {
    pub stage: ExportStage,

    /// Percent complete, `0.0 ..= 100.0`.
    pub progress: f32,

    pub current_frame: i64,
    pub total_frames: i64,

    /// Naive linear estimate from the frames done so far.
    pub eta_secs: f64,

    pub message: String,
}
