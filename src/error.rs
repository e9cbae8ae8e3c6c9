//! The error type returned when a quantization request is invalid.

use thiserror::Error;

/// An error for invalid quantization inputs.
///
/// Quantization itself cannot fail, so every variant describes a problem with the
/// arguments and is reported before any work is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantizeError {
    /// The pixel buffer is empty or one of the dimensions is zero.
    #[error("image dimensions cannot be zero")]
    EmptyImage,

    /// The pixel buffer does not hold exactly `width * height` pixels.
    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        /// The length of the pixel buffer.
        len: usize,
        /// The given image width.
        width: u32,
        /// The given image height.
        height: u32,
    },

    /// A palette needs room for at least two colors.
    #[error("palette size must be at least 2, got {0}")]
    PaletteSize(u16),

    /// The saliency map does not have one value per pixel.
    #[error("saliency map length {len} does not match the {expected} pixels of the image")]
    SaliencyMismatch {
        /// The length of the saliency map.
        len: usize,
        /// The number of pixels in the image.
        expected: usize,
    },
}
