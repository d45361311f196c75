//! End-to-end runs of the export loop against synthetic sources and a
//! collecting sink.

use glam::{Vec2, Vec3};

use tt_export::{
    CancelToken, EncoderConfig, EncoderSink, ExportError, ExportSettings, ExportStage,
    FrameSource, QualityPreset, RgbaFrame, SinkError, SourceError, export,
};
use tt_render::testing::BoxGlyphs;
use tt_text::Anchor;
use tt_tracking::TrackerContext;
use tt_types::FrameNr;

// ---

/// Solid-color frames whose shade encodes the seek count.
struct SyntheticSource {
    width: u32,
    height: u32,
    duration: f64,
    seeks: u32,
    current: image::RgbaImage,
}

impl SyntheticSource {
    fn new(width: u32, height: u32, duration: f64) -> Self {
        Self {
            width,
            height,
            duration,
            seeks: 0,
            current: image::RgbaImage::new(width, height),
        }
    }
}

impl FrameSource for SyntheticSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration_secs(&self) -> f64 {
        self.duration
    }

    async fn seek(&mut self, t_secs: f64) -> Result<(), SourceError> {
        let shade = (t_secs * 60.0).round() as u8;
        self.current =
            image::RgbaImage::from_pixel(self.width, self.height, image::Rgba([shade, 40, 60, 255]));
        self.seeks += 1;
        Ok(())
    }

    fn current_frame(&self) -> &image::RgbaImage {
        &self.current
    }
}

#[derive(Default)]
struct CollectingSink {
    config: Option<EncoderConfig>,
    frames: Vec<RgbaFrame>,
    flushed: bool,
    closed: bool,
    fail_submissions: bool,
}

impl EncoderSink for CollectingSink {
    fn configure(&mut self, config: &EncoderConfig) -> Result<(), SinkError> {
        self.config = Some(config.clone());
        Ok(())
    }

    async fn submit(&mut self, frame: RgbaFrame) -> Result<(), SinkError> {
        if self.fail_submissions {
            return Err(SinkError("disk full".to_owned()));
        }
        self.frames.push(frame);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.flushed = true;
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

// ---

#[tokio::test]
async fn exports_every_frame_in_timestamp_order() -> anyhow::Result<()> {
    let mut ctx = TrackerContext::new();
    let mut source = SyntheticSource::new(128, 96, 1.0);
    let mut sink = CollectingSink::default();
    let settings = ExportSettings::with_preset(128, 96, 24.0, QualityPreset::High);
    let mut stages = Vec::new();

    let summary = export(
        &mut ctx,
        &BoxGlyphs,
        &mut source,
        &mut sink,
        &settings,
        &CancelToken::new(),
        |p| stages.push(p.stage),
    )
    .await?;

    assert_eq!(summary.frames_encoded, 24);
    assert_eq!(sink.frames.len(), 24);
    assert!(sink.flushed);
    assert!(sink.closed);
    assert_eq!(sink.config.as_ref().map(|c| c.bitrate), Some(8_000_000));

    for (k, frame) in sink.frames.iter().enumerate() {
        assert_eq!(frame.pts_secs, k as f64 / 24.0);
        // High preset keys every 15th frame.
        assert_eq!(frame.keyframe, k % 15 == 0);
    }
    // Strictly increasing timestamps.
    assert!(
        sink.frames
            .windows(2)
            .all(|w| w[0].pts_secs < w[1].pts_secs)
    );

    assert_eq!(stages.first(), Some(&ExportStage::Preparing));
    assert_eq!(stages.last(), Some(&ExportStage::Finalizing));
    Ok(())
}

#[tokio::test]
async fn resamples_to_the_output_size() -> anyhow::Result<()> {
    let mut ctx = TrackerContext::new();
    let mut source = SyntheticSource::new(64, 48, 0.5);
    let mut sink = CollectingSink::default();
    let settings = ExportSettings::with_preset(128, 96, 10.0, QualityPreset::Low);

    export(
        &mut ctx,
        &BoxGlyphs,
        &mut source,
        &mut sink,
        &settings,
        &CancelToken::new(),
        |_| {},
    )
    .await?;

    assert_eq!(sink.frames.len(), 5);
    for frame in &sink.frames {
        assert_eq!(frame.image.dimensions(), (128, 96));
    }
    Ok(())
}

#[tokio::test]
async fn cancellation_stops_without_flushing() {
    let mut ctx = TrackerContext::new();
    let mut source = SyntheticSource::new(64, 48, 10.0);
    let mut sink = CollectingSink::default();
    let settings = ExportSettings::with_preset(64, 48, 30.0, QualityPreset::Medium);
    let cancel = CancelToken::new();

    let result = {
        let cancel_from_callback = cancel.clone();
        export(
            &mut ctx,
            &BoxGlyphs,
            &mut source,
            &mut sink,
            &settings,
            &cancel,
            move |p| {
                if p.current_frame >= 4 {
                    cancel_from_callback.cancel();
                }
            },
        )
        .await
    };

    assert!(matches!(result, Err(ExportError::Cancelled)));
    assert_eq!(sink.frames.len(), 5);
    assert!(!sink.flushed, "cancellation must not flush partial output");
    assert!(sink.closed, "resources are released on every exit path");
}

#[tokio::test]
async fn submit_failure_aborts_with_output_write() {
    let mut ctx = TrackerContext::new();
    let mut source = SyntheticSource::new(64, 48, 1.0);
    let mut sink = CollectingSink {
        fail_submissions: true,
        ..CollectingSink::default()
    };
    let settings = ExportSettings::with_preset(64, 48, 30.0, QualityPreset::Medium);

    let result = export(
        &mut ctx,
        &BoxGlyphs,
        &mut source,
        &mut sink,
        &settings,
        &CancelToken::new(),
        |_| {},
    )
    .await;

    assert!(matches!(result, Err(ExportError::OutputWrite { .. })));
    assert!(!sink.flushed);
    assert!(sink.closed);
}

#[tokio::test]
async fn overlays_reach_the_composed_frames() -> anyhow::Result<()> {
    // Text anchored near the projection origin lands mid-canvas.
    let mut ctx = TrackerContext::new();
    let point_id = ctx.points.create(Vec2::new(0.0, 0.0), FrameNr::ZERO);
    let text_id = ctx.texts.create(Anchor::Point(point_id), FrameNr::ZERO);
    ctx.texts.get_mut(text_id).unwrap().content = "mark".to_owned();

    let mut source = SyntheticSource::new(128, 96, 0.2);
    let mut sink = CollectingSink::default();
    let settings = ExportSettings::with_preset(128, 96, 10.0, QualityPreset::Medium);

    export(
        &mut ctx,
        &BoxGlyphs,
        &mut source,
        &mut sink,
        &settings,
        &CancelToken::new(),
        |_| {},
    )
    .await?;

    // A plain export of the same source, no texts.
    let mut bare_ctx = TrackerContext::new();
    let mut bare_source = SyntheticSource::new(128, 96, 0.2);
    let mut bare_sink = CollectingSink::default();
    export(
        &mut bare_ctx,
        &BoxGlyphs,
        &mut bare_source,
        &mut bare_sink,
        &settings,
        &CancelToken::new(),
        |_| {},
    )
    .await?;

    assert_ne!(
        sink.frames[0].image.as_raw(),
        bare_sink.frames[0].image.as_raw(),
        "the overlay must change pixels"
    );
    Ok(())
}

#[tokio::test]
async fn identical_inputs_export_identical_bytes() -> anyhow::Result<()> {
    let mut template = TrackerContext::new();
    let point_id = template.points.create(Vec2::new(0.1, -0.05), FrameNr::ZERO);
    let text_id = template.texts.create(Anchor::Point(point_id), FrameNr::ZERO);
    {
        let text = template.texts.get_mut(text_id).unwrap();
        text.content = "glued".to_owned();
        text.transform.position = Vec3::new(0.05, 0.0, 120.0);
        text.transform.rotation_deg = Vec3::new(0.0, 20.0, 10.0);
    }
    let settings = ExportSettings::with_preset(160, 120, 12.0, QualityPreset::Medium);

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut ctx = template.clone();
        let mut source = SyntheticSource::new(160, 120, 0.5);
        let mut sink = CollectingSink::default();
        export(
            &mut ctx,
            &BoxGlyphs,
            &mut source,
            &mut sink,
            &settings,
            &CancelToken::new(),
            |_| {},
        )
        .await?;
        runs.push(sink.frames);
    }

    let (a, b) = (&runs[0], &runs[1]);
    assert_eq!(a.len(), b.len());
    for (fa, fb) in a.iter().zip(b.iter()) {
        assert_eq!(fa.pts_secs, fb.pts_secs);
        assert_eq!(fa.keyframe, fb.keyframe);
        assert_eq!(fa.image.as_raw(), fb.image.as_raw());
    }
    Ok(())
}
