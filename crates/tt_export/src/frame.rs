/// A composed output frame on its way to the encoder.
#[derive(Clone, Debug)]
pub struct RgbaFrame {
    pub image: image::RgbaImage,

    /// Presentation timestamp, seconds.
    pub pts_secs: f64,

    /// Whether the encoder should emit this as a keyframe.
    pub keyframe: bool,
}
