use crate::{Codec, EncoderConfig};

/// Bitrate/keyframe trade-off presets for the encoder sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityPreset {
    Low,
    Medium,
    High,
}

impl QualityPreset {
    /// Bits per second.
    pub fn bitrate(self) -> u32 {
        match self {
            Self::Low => 1_000_000,
            Self::Medium => 3_000_000,
            Self::High => 8_000_000,
        }
    }

    pub fn keyframe_interval(self) -> u32 {
        match self {
            Self::Low => 60,
            Self::Medium => 30,
            Self::High => 15,
        }
    }
}

/// Output parameters of one export run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    /// Output frames per second; also the timeline step.
    pub fps: f64,
    pub codec: Codec,
    pub bitrate: u32,
    pub keyframe_interval: u32,
}

impl ExportSettings {
    pub fn with_preset(width: u32, height: u32, fps: f64, preset: QualityPreset) -> Self {
        Self {
            width,
            height,
            fps,
            codec: Codec::default(),
            bitrate: preset.bitrate(),
            keyframe_interval: preset.keyframe_interval(),
        }
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            codec: self.codec,
            width: self.width,
            height: self.height,
            bitrate: self.bitrate,
            framerate: self.fps,
            keyframe_interval: self.keyframe_interval,
        }
    }

    /// Number of output frames for a source of `duration_secs`.
    pub fn total_frames(&self, duration_secs: f64) -> i64 {
        (duration_secs * self.fps).floor() as i64
    }
}
