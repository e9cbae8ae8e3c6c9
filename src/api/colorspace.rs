use crate::tuning::NEAR_LOSSLESS;

/// The color space that palette colors are clustered and compared in.
///
/// By default, [`ImagePipeline`](crate::ImagePipeline) picks the color space from the palette
/// size: [`ColorSpace::Lab`] up to 256 colors and [`ColorSpace::Srgb`] above that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Weighted Euclidean distance on the sRGB channels.
    ///
    /// This is cheaper and is the right choice for near-lossless palettes of more than 256 colors.
    Srgb,
    /// CIELAB, with a blend of Euclidean distance and CIEDE2000.
    Lab,
}

impl ColorSpace {
    /// The automatic choice for a palette size.
    #[must_use]
    pub const fn for_palette_size(palette_size: usize) -> Self {
        if palette_size > NEAR_LOSSLESS {
            Self::Srgb
        } else {
            Self::Lab
        }
    }
}
