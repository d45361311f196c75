/// A frame index on the video timeline.
///
/// Frame numbers are signed so that "the frame before the first one" stays
/// representable while a tracking pass warms up.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    serde::Deserialize,
    serde::Serialize,
)]
#[serde(transparent)]
pub struct FrameNr(i64);

impl FrameNr {
    pub const ZERO: Self = Self(0);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    #[inline]
    pub const fn new(frame: i64) -> Self {
        Self(frame)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// The frame immediately before this one.
    #[inline]
    pub const fn prev(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// The frame immediately after this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<i64> for FrameNr {
    #[inline]
    fn from(frame: i64) -> Self {
        Self(frame)
    }
}

impl std::fmt::Display for FrameNr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
