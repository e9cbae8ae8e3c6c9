//! Contains various types needed across the crate.

use crate::QuantizeError;
use palette::{rgb::channels::Argb, Srgba};
use std::fmt::Display;

/// A pixel packed as `0xAARRGGBB`.
pub type Pixel = u32;

/// Unpacks an ARGB pixel into its sRGB color and alpha channels.
#[inline]
pub(crate) fn unpack(pixel: Pixel) -> Srgba<u8> {
    Srgba::from_u32::<Argb>(pixel)
}

/// Packs channels back into an ARGB pixel.
#[inline]
pub(crate) fn pack(red: u8, green: u8, blue: u8, alpha: u8) -> Pixel {
    Srgba::new(red, green, blue, alpha).into_u32::<Argb>()
}

/// Returns the alpha channel of an ARGB pixel.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn alpha(pixel: Pixel) -> u8 {
    (pixel >> 24) as u8
}

/// Opaque black.
pub const BLACK: Pixel = 0xFF00_0000;

/// Opaque white.
pub const WHITE: Pixel = 0xFFFF_FFFF;

/// This type is used to specify the (maximum) number of colors to include in a palette.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// at least `2`. Sizes above [`MAX_COLORS`](crate::MAX_COLORS) are allowed and are treated
/// as a near-lossless re-dither of the image.
///
/// # Examples
/// Use `into` to create [`PaletteSize`]s from `u8`s (values below `2` are raised to `2`),
/// or `try_into` for `u16`s:
/// ```
/// # use pnnquant::{PaletteSize, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let size = PaletteSize::from(16);
/// let size = PaletteSize::try_from(1024u16)?;
/// assert!(PaletteSize::try_from(1u16).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// The smallest palette that can be requested.
    pub const MIN: Self = Self(2);

    /// Gets the inner `u16` value.
    #[must_use]
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    /// The palette size as a `usize` for lengths and comparisons.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self(crate::MAX_COLORS)
    }
}

impl From<PaletteSize> for u16 {
    fn from(val: PaletteSize) -> Self {
        val.into_inner()
    }
}

impl From<u8> for PaletteSize {
    fn from(value: u8) -> Self {
        Self(u16::from(value).max(Self::MIN.0))
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = QuantizeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value >= Self::MIN.0 {
            Ok(Self(value))
        } else {
            Err(QuantizeError::PaletteSize(value))
        }
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_inner())
    }
}

/// The output struct returned by quantization functions.
///
/// It contains the color `palette` for the image, alongside `counts` which has
/// the number of pixels assigned to each palette color, and an index into `palette`
/// for each pixel in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeOutput {
    /// The computed ARGB color palette.
    ///
    /// If the image had a fully transparent pixel, the transparent entry is at index `0`.
    pub palette: Vec<Pixel>,
    /// The number of pixels assigned to each palette color.
    pub counts: Vec<u32>,
    /// The palette index of each pixel.
    pub indices: Vec<u16>,
}

impl QuantizeOutput {
    /// Builds the output from a palette and per-pixel indices, tallying the counts.
    pub(crate) fn new(palette: Vec<Pixel>, indices: Vec<u16>) -> Self {
        let mut counts = vec![0u32; palette.len()];
        for &i in &indices {
            counts[usize::from(i)] += 1;
        }
        Self { palette, counts, indices }
    }

    /// Maps every index back to its palette color.
    #[must_use]
    pub fn pixels(&self) -> Vec<Pixel> {
        self.indices
            .iter()
            .map(|&i| self.palette[usize::from(i)])
            .collect()
    }
}
