use crate::GrayImage;

/// Coarse-to-fine stack of grayscale images; level 0 is full resolution,
/// each further level halves it.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<GrayImage>,
}

impl ImagePyramid {
    /// Smallest dimension a pyramid level is allowed to shrink to.
    const MIN_LEVEL_SIZE: u32 = 16;

    /// Builds levels `0..=max_level`, stopping early when the image gets
    /// too small to carry a flow window.
    pub fn build(base: GrayImage, max_level: u32) -> Self {
        let mut levels = Vec::with_capacity(max_level as usize + 1);
        levels.push(base);

        for _ in 0..max_level {
            let last = levels.last().expect("at least the base level");
            if last.width() / 2 < Self::MIN_LEVEL_SIZE || last.height() / 2 < Self::MIN_LEVEL_SIZE
            {
                break;
            }
            levels.push(last.downsample());
        }

        Self { levels }
    }

    #[inline]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn level(&self, level: usize) -> &GrayImage {
        &self.levels[level]
    }

    /// The full-resolution image.
    #[inline]
    pub fn finest(&self) -> &GrayImage {
        &self.levels[0]
    }
}
