//! Contains the types and functions for the high level API.

mod colorspace;
mod image_pipeline;

pub use colorspace::ColorSpace;
pub use image_pipeline::ImagePipeline;

use crate::{PaletteSize, Pixel, QuantizeError, QuantizeOutput};

/// Quantizes an ARGB image to at most `max_colors` colors with the default options.
///
/// This is a shorthand for [`ImagePipeline`] with the given palette size and dither setting.
///
/// # Errors
/// Returns an error if the image is empty, if `pixels.len() != width * height`,
/// or if `max_colors` is less than `2`.
///
/// # Examples
/// ```
/// # use pnnquant::{quantize, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let red = 0xFFFF_0000;
/// let blue = 0xFF00_00FF;
/// let pixels = [red, blue, blue, red];
///
/// let output = quantize(&pixels, 2, 2, 2, false)?;
/// assert_eq!(output.palette.len(), 2);
/// assert_eq!(output.pixels(), pixels);
/// # Ok(())
/// # }
/// ```
pub fn quantize(
    pixels: &[Pixel],
    width: u32,
    height: u32,
    max_colors: u16,
    dither: bool,
) -> Result<QuantizeOutput, QuantizeError> {
    let mut pipeline = ImagePipeline::new(pixels, width, height)?;
    let size = PaletteSize::try_from(max_colors)?;
    Ok(pipeline.palette_size(size).dither(dither).indexed_palette())
}
