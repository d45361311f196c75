use std::time::Instant;

use tt_render::{GlyphRasterizer, render_overlays};
use tt_tracking::TrackerContext;
use tt_types::FrameNr;

use crate::{
    CancelToken, EncoderSink, ExportError, ExportProgress, ExportSettings, ExportStage,
    FrameSource, RgbaFrame,
};

/// What a finished export did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportSummary {
    pub frames_encoded: i64,
    pub width: u32,
    pub height: u32,
}

/// Composites and encodes the whole timeline.
///
/// For every output frame `k`: seek the source to `k/fps`, draw the decoded
/// raster resampled to the output size, sync the tracker state to `k`, draw
/// every visible text, submit with presentation timestamp `k/fps`. Frames
/// are submitted strictly in timestamp order; the loop yields between
/// frames so progress callbacks and cancellation stay responsive.
///
/// The sink is closed on every exit path. Cancellation returns
/// [`ExportError::Cancelled`] without flushing partial output.
pub async fn export<S: FrameSource, K: EncoderSink>(
    ctx: &mut TrackerContext,
    rasterizer: &dyn GlyphRasterizer,
    source: &mut S,
    sink: &mut K,
    settings: &ExportSettings,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(&ExportProgress),
) -> Result<ExportSummary, ExportError> {
    let result = run(
        ctx,
        rasterizer,
        source,
        sink,
        settings,
        cancel,
        &mut on_progress,
    )
    .await;
    sink.close();
    result
}

async fn run<S: FrameSource, K: EncoderSink>(
    ctx: &mut TrackerContext,
    rasterizer: &dyn GlyphRasterizer,
    source: &mut S,
    sink: &mut K,
    settings: &ExportSettings,
    cancel: &CancelToken,
    on_progress: &mut impl FnMut(&ExportProgress),
) -> Result<ExportSummary, ExportError> {
    let started = Instant::now();
    let total_frames = settings.total_frames(source.duration_secs());
    let source_dims = source.dimensions();

    sink.configure(&settings.encoder_config())
        .map_err(|err| ExportError::OutputWrite {
            reason: err.to_string(),
        })?;

    on_progress(&ExportProgress {
        stage: ExportStage::Preparing,
        progress: 0.0,
        current_frame: 0,
        total_frames,
        eta_secs: f64::INFINITY,
        message: "configured encoder".to_owned(),
    });

    for k in 0..total_frames {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let t = k as f64 / settings.fps;
        source
            .seek(t)
            .await
            .map_err(|err| ExportError::SourceUnavailable {
                last_frame: k - 1,
                reason: err.to_string(),
            })?;
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        // Compose: source frame at output size, then the overlays.
        let decoded = source.current_frame();
        let mut canvas = if source_dims == (settings.width, settings.height) {
            decoded.clone()
        } else {
            image::imageops::resize(
                decoded,
                settings.width,
                settings.height,
                image::imageops::FilterType::Triangle,
            )
        };

        let frame = FrameNr::new(k);
        ctx.sync_to_frame(frame);
        render_overlays(
            &mut canvas,
            &ctx.points,
            &ctx.planars,
            &ctx.texts,
            rasterizer,
            frame,
        );

        sink.submit(RgbaFrame {
            image: canvas,
            pts_secs: t,
            keyframe: k % i64::from(settings.keyframe_interval) == 0,
        })
        .await
        .map_err(|err| ExportError::OutputWrite {
            reason: err.to_string(),
        })?;
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let done = k + 1;
        let elapsed = started.elapsed().as_secs_f64();
        on_progress(&ExportProgress {
            stage: ExportStage::Rendering,
            progress: done as f32 / total_frames as f32 * 100.0,
            current_frame: k,
            total_frames,
            eta_secs: elapsed / done as f64 * (total_frames - done) as f64,
            message: format!("frame {done}/{total_frames}"),
        });

        // Give the executor a chance between frames.
        yield_now().await;
    }

    sink.flush().await.map_err(|err| ExportError::OutputWrite {
        reason: err.to_string(),
    })?;

    on_progress(&ExportProgress {
        stage: ExportStage::Finalizing,
        progress: 100.0,
        current_frame: total_frames.saturating_sub(1),
        total_frames,
        eta_secs: 0.0,
        message: "flushed".to_owned(),
    });
    tt_log::info!("export finished: {total_frames} frames");

    Ok(ExportSummary {
        frames_encoded: total_frames,
        width: settings.width,
        height: settings.height,
    })
}

/// One-shot cooperative yield; runtime-agnostic.
async fn yield_now() {
    let mut yielded = false;
    std::future::poll_fn(move |cx| {
        if yielded {
            std::task::Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        }
    })
    .await;
}
