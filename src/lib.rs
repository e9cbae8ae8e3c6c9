//! A library for perceptual image quantization using pairwise nearest neighbor clustering.
//!
//! `pnnquant` reduces a 32-bit ARGB image to a small color palette. The palette is found by
//! greedily merging the bins of a color histogram, comparing colors in CIELAB with CIEDE2000
//! (or with weighted sRGB for near-lossless palettes). Pixels are then mapped to the palette
//! with error diffusion along a Gilbert space-filling curve, or with a randomized nearest color
//! pick refined by blue noise when dithering is turned off.
//!
//! Fully transparent pixels are preserved: if the image has one and the palette has more than
//! two colors, its exact color becomes the first palette entry.
//!
//! # Features
//! - `image`: enables integration with the [`image`] crate (enabled by default).
//!
//! # High-Level API
//! To get started with the high-level API, see [`ImagePipeline`], or [`quantize`] for the
//! common case:
//! ```no_run
//! # use pnnquant::{ImagePipeline, ColorSpace};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgba8();
//!
//! let quantized = ImagePipeline::try_from(&img)?
//!     .palette_size(64) // set the max number of colors in the palette
//!     .dither(false) // turn error diffusion off
//!     .colorspace(Some(ColorSpace::Lab))
//!     .quantized_rgbaimage();
//! # Ok(())
//! # }
//! ```
//!
//! # Low-Level API
//! The building blocks are public as well: [`cielab`] for color conversion and CIEDE2000,
//! [`histogram`] and [`pnn`] for palette generation, [`resolver`] for palette lookups, and
//! [`dither`] for the Gilbert curve ditherer and blue noise.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod color_counts;
mod error;
mod traits;
mod tuning;
mod types;

pub mod cielab;
pub mod dither;
pub mod histogram;
pub mod metric;
pub mod pnn;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use api::*;
pub use color_counts::*;
pub use error::QuantizeError;
pub use traits::*;
pub use types::*;

/// The largest palette size that is quantized in CIELAB by default is `256`.
///
/// Larger palettes are allowed and are treated as a near-lossless re-dither.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;
