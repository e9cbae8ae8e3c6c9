//! A 64x64 blue-noise tile and the dithering steps that use it.
//!
//! Blue noise has almost no low-frequency energy, so perturbations taken from it read as fine
//! grain instead of visible patterns.

use crate::{
    cielab::{u_diff, y_diff},
    resolver::{PaletteResolver, Resolution},
    tuning::{BLUE_NOISE_STRENGTH, DIFFUSE_THRESHOLD},
    types::{pack, unpack},
    ColorMetric, Pixel,
};
use rand::Rng;

/// The tile value for the pixel with row-major `index`, wrapping every 4096 pixels.
#[inline]
pub(crate) fn tile(index: usize) -> i8 {
    BLUE_NOISE[index & 4095]
}

/// Whether the tile marks pixel `index` (in row-major order) as part of a "diffuse" region.
#[inline]
pub(crate) fn is_diffuse(index: usize) -> bool {
    tile(index) > DIFFUSE_THRESHOLD
}

/// Pushes `pixel` toward or away from `qpixel` by an amount taken from the tile at `index`.
///
/// Every channel `c` becomes `c + adj * (c - q)` clamped to `0..=255`, where `adj` is the tile
/// value mapped into about `-1.0..=1.0` and scaled by `strength * weight`.
#[must_use]
pub fn diffuse(pixel: Pixel, qpixel: Pixel, weight: f32, strength: f32, index: usize) -> Pixel {
    let adj = (f32::from(tile(index)) + 0.5) / 127.5 * strength * weight;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let shift = |c: u8, q: u8| {
        let c = f32::from(c);
        (c + adj * (c - f32::from(q))).clamp(0.0, 255.0) as u8
    };

    let p = unpack(pixel);
    let q = unpack(qpixel);
    pack(
        shift(p.red, q.red),
        shift(p.green, q.green),
        shift(p.blue, q.blue),
        shift(p.alpha, q.alpha),
    )
}

/// Refines already resolved `indices` with blue noise.
///
/// This is used instead of error diffusion when dithering is off. A pixel is perturbed with
/// [`diffuse`] and resolved again only where the tile passes the diffuse threshold and the
/// resolved color differs visibly from the source in luma or chroma.
pub fn dither<M: ColorMetric, R: Rng>(
    pixels: &[Pixel],
    indices: &mut [u16],
    resolver: &mut PaletteResolver<M, R>,
    resolution: Resolution,
    weight: f32,
) {
    let palette = resolver.palette();
    let accepted = palette.len().saturating_sub(12).max(2);
    #[allow(clippy::cast_precision_loss)]
    let (luma, chroma) = (accepted as f64, 2.0 * accepted as f64);

    let mut changed = 0usize;
    for (i, (&pixel, index)) in pixels.iter().zip(indices.iter_mut()).enumerate() {
        if !is_diffuse(i) {
            continue;
        }

        let qpixel = palette[usize::from(*index)];
        if y_diff(pixel, qpixel).abs() > luma || u_diff(pixel, qpixel).abs() > chroma {
            let adjusted = diffuse(pixel, qpixel, weight, BLUE_NOISE_STRENGTH, i);
            let new = resolver.resolve(adjusted, resolution);
            changed += usize::from(new != *index);
            *index = new;
        }
    }

    log::trace!("blue noise pass changed {changed} of {} pixels", indices.len());
}

/// The blue-noise tile, row-major with 64 values per row.
#[rustfmt::skip]
pub(crate) static BLUE_NOISE: [i8; 4096] = [
    -111, -33, 105, 24, -14, 59, -128, 102, -53, -79, 30, 51, -113, 63, 86, 126,
    -41, 92, 23, 68, 121, -109, 88, 24, 109, 54, -67, -7, 103, -31, -69, -101,
    -45, 35, 113, 0, -64, 32, -87, -14, 67, -54, 79, -38, 2, 63, -86, 35,
    94, -123, 22, -19, 111, -40, -79, -3, -66, -101, -52, -118, 108, 23, 57, 97,
    37, 0, -49, 66, -61, -31, 79, 39, -23, 8, -44, 96, -61, -84, -32, 12,
    -74, -102, 105, -119, -63, -11, 9, -97, -19, -57, 116, 42, -118, 29, -2, 76,
    -61, 96, -37, 63, -119, 86, 52, 116, -123, -25, 99, -103, 119, -22, 110, -101,
    -8, -62, 44, -93, -52, 73, -112, 127, -35, 105, 68, 34, 78, -4, -58, -81,
    113, 76, -120, -90, 10, 127, -73, -96, 87, -115, 122, 18, -8, 41, -117, -14,
    72, 35, 5, 54, -45, 44, -72, 100, 63, -111, 14, 83, -43, -96, 56, 106,
    -126, -13, -77, 12, 107, -104, -42, -2, 40, 10, -79, 28, 48, -72, -53, 75,
    -40, 115, 68, 7, 97, 20, -15, 62, 27, 4, -83, -16, -70, 121, -126, 13,
    -18, -68, 46, 88, 31, -108, -41, 52, -10, -66, 65, -106, 79, 115, 25, 101,
    -94, -58, -20, -81, 112, -29, 78, -121, 33, -32, -87, -15, -75, 120, 9, -26,
    23, 42, 71, -95, -29, 25, -72, 103, -93, 60, -60, 84, -14, -125, 56, 13,
    28, -112, -77, -31, -105, -69, 43, -90, -122, 89, -45, 52, -98, -28, 65, -42,
    25, -103, 120, -6, -22, 99, 70, 3, 111, 32, -34, -87, -22, -50, -68, 47,
    -43, 117, 86, -104, 61, 21, -89, -2, -48, 127, 75, 24, 94, -53, 67, -85,
    -110, 88, -54, 126, 54, -17, 75, -52, -113, 123, -31, -108, 20, 93, -3, -89,
    101, -18, 52, 120, -5, 83, 103, -55, -23, 117, -108, 18, 100, 42, 90, -89,
    81, 56, -36, -79, -53, -119, 21, -83, -54, -122, 49, 100, 2, -102, 59, -120,
    -5, 65, 15, -127, -7, -57, 90, 107, 49, -64, 3, -125, 45, -106, -8, -37,
    112, -70, -4, -117, 6, -84, 95, 33, -11, 70, 3, 109, -83, -36, 122, -116,
    -65, 80, -49, 35, -126, -40, 10, 56, -75, 37, 82, -62, -10, -112, -53, 2,
    -123, -60, 16, 104, 42, 60, -99, 93, -17, 84, 14, -74, 71, 111, 11, 94,
    -27, -76, 31, -35, 122, 39, -113, -21, -79, 66, -98, -23, 114, -62, 31, 78,
    50, 16, -43, 36, 81, -62, -128, 14, -40, 50, -69, 42, -48, 32, 64, -24,
    43, 3, -97, 66, -83, 27, 109, -100, -8, 68, -36, 8, 124, -78, 32, 111,
    97, -25, 73, -95, -1, 117, -65, -33, 38, 124, -96, -59, 29, -38, -82, 36,
    -97, 76, -62, 96, -92, 71, -41, 17, -105, 30, 102, -36, 60, 11, 91, -122,
    -92, -22, 98, -105, 110, -33, 59, 118, -103, -88, 91, -119, 78, -99, -58, 87,
    -79, 108, 18, 93, -27, -64, 73, -114, -48, 24, -90, -119, 53, 70, -41, -14,
    47, -84, -113, 32, -44, -12, 78, 9, -111, -47, 60, -6, -126, -16, 85, -54,
    126, -114, 8, 51, -15, -73, 4, 84, 119, -10, -51, 76, -91, -76, -16, -47,
    120, 62, -79, 45, -10, -94, 24, -23, 102, -56, -6, -26, 11, 104, -15, 24,
    -109, -38, -56, -118, 125, -15, 45, 2, 115, 95, -66, 107, -29, -96, 17, -71,
    66, 6, 126, 89, -72, -123, 110, 54, -77, -23, 104, 80, 47, 116, -107, 56,
    -3, -22, 107, -47, -102, 112, 59, -59, -117, 46, -71, 21, -112, 40, 103, 1,
    -109, 26, -58, 9, 70, -48, 84, -78, 4, 74, 26, 126, -75, 55, -127, 0,
    118, 61, -9, 49, 10, -92, 88, -34, -80, 59, -18, 39, -2, 91, 116, -108,
    -8, -36, -56, 51, -23, 17, -89, 30, 73, 3, -114, -87, -32, 17, -72, -42,
    23, 40, -84, 86, 20, -124, 34, -28, -87, 97, 6, 87, 125, -29, 53, -67,
    73, -37, 90, -122, 123, -68, -116, 39, 53, -107, -44, 65, -92, -35, 44, -66,
    74, -99, 35, -73, 77, -110, -55, 32, -127, 12, -104, 84, -58, -122, -49, 36,
    -92, 108, 23, -105, 64, 100, -37, -101, -53, 118, 23, 40, -63, 98, 66, -95,
    103, -121, 69, -68, 46, -39, -5, 104, 67, -44, -21, -128, -5, -55, -98, 14,
    115, -12, -88, -27, 31, -1, 98, -18, 115, -65, -122, 36, -9, 113, 90, -46,
    -86, 95, -30, 114, -44, 99, 57, -24, 120, 77, -42, 22, -86, 60, -21, 78,
    -66, -125, 85, -79, 1, -62, 82, 44, -7, -73, 89, -45, -12, -117, 5, -25,
    83, -59, -32, 3, 123, -94, 76, -76, 25, -100, 56, 35, -83, 83, 64, -116,
    37, -75, 51, 106, 62, -109, -39, -86, 14, -30, 106, 80, -57, -115, 13, 30,
    -20, 8, -123, 24, -83, -2, 18, -67, -94, -6, -73, 48, 125, 4, 27, 101,
    49, 11, -15, 40, 122, -113, -18, 108, -125, -28, 55, -107, 125, 78, 50, -78,
    119, 32, -11, -109, 93, -56, -19, -113, 11, 120, -63, 107, -36, 22, 98, -20,
    -49, 79, 12, -100, -56, 20, 47, 69, 91, -99, -1, 20, -23, -78, 69, -104,
    123, 56, -62, -13, 66, -102, 109, 43, 69, 96, -116, 106, -34, -111, -77, -40,
    119, -54, 68, -31, -45, -86, 57, 19, 95, -92, 69, 13, -83, 30, -51, -5,
    -105, 57, -88, 14, 61, 28, 109, 52, 89, -49, -13, 69, -108, -70, 3, -92,
    108, -125, -4, -42, 93, -92, 120, -10, -51, -75, 59, 87, -95, 52, 100, -3,
    -52, -112, 105, 88, 39, -33, -119, -16, -47, 8, 33, -60, -11, 89, 71, -100,
    -1, -114, 99, -97, 78, 33, 6, -68, -41, 36, -1, -57, 101, -33, -128, 19,
    95, -42, 110, 81, -123, -82, -36, -69, 1, -117, -88, 13, 46, 123, -43, 58,
    27, -66, 127, 39, 81, -24, -63, -127, 28, 44, -114, 122, -46, 37, -32, -70,
    82, 33, -38, -93, -74, 127, -57, 86, -81, -103, -26, 63, -90, 17, 42, -26,
    60, 27, -81, 15, 111, -122, -54, 120, 75, -115, 115, -17, -98, 63, 113, -65,
    45, -17, -74, -51, -24, 44, -7, -101, 75, 41, 101, -25, 80, -119, -9, 89,
    -28, -105, 67, -16, -74, -111, 10, 74, 98, -36, -18, -64, 6, -124, 110, -16,
    -85, 15, 50, 1, 79, 12, 59, 26, 103, 50, 121, 82, -119, -51, 114, -71,
    -13, 86, -61, 48, -22, -6, 63, -101, -26, -80, 49, -70, 82, 34, -22, -90,
    74, -116, 37, 5, 98, 127, 65, 19, 117, -44, 29, -75, -55, -97, 35, -81,
    -58, 50, 7, -86, 26, 103, 57, -4, -84, 110, 15, 67, -88, 92, 24, -101,
    61, 118, -128, -50, -104, -23, -90, -10, -122, -39, 13, -67, -6, 30, 95, -128,
    -35, 127, -108, -43, 91, -75, 102, 20, -10, 87, 25, 4, -46, -112, 11, 90,
    -3, 118, -98, 24, -65, -111, -90, -58, -27, -124, 87, -3, 52, 104, 72, 17,
    116, 97, -114, -34, 117, 42, -59, -43, -98, 35, -110, 82, 50, -39, 0, 74,
    -60, -27, -8, 102, 31, 113, -68, 74, 1, -76, -96, 42, 109, -41, -83, 10,
    -94, 40, 67, 4, -118, 36, -90, 53, -38, -125, 98, -104, 108, 53, -78, -39,
    -58, 66, -30, 58, 78, -40, 89, 3, 55, -81, -104, 113, -37, 7, -21, -122,
    -44, -10, 75, -51, -96, -12, -121, 86, 125, -68, -27, -8, -55, -76, 123, -117,
    40, 90, -71, 66, -115, 53, -46, 39, 118, 92, 61, -21, 72, -111, 55, 77,
    -53, 21, -69, -30, 118, 72, -47, -65, 123, 39, -56, -31, -9, 72, 125, -123,
    21, 99, -83, -10, -126, 38, -18, 27, 107, 67, -12, 21, -64, -110, 63, -71,
    -92, 27, 46, 92, 12, 69, -28, 22, 1, 62, 95, -121, 106, 31, -19, -92,
    -45, 19, -84, 7, -33, 94, 18, -109, -30, -55, 22, -102, -61, 2, -28, 106,
    -104, -5, 83, -84, 16, -14, -112, 9, 79, -97, 66, 15, -89, -63, 38, -18,
    50, -106, -48, 14, 115, -76, 99, -98, -67, -49, 43, 77, -87, 120, 36, 85,
    106, 1, -66, -119, -78, 112, 51, -107, -80, -48, 43, 19, -100, 71, 9, 100,
    58, 111, -103, 81, -59, -94, -13, -82, 85, -126, -11, 101, 122, 27, -74, 46,
    117, -121, 97, 57, -100, 107, 30, 94, -4, -74, -19, 114, 27, -114, 87, 6,
    -71, 107, 32, 84, -60, 53, -31, -120, 13, 123, -116, -24, 93, -52, -15, -40,
    51, -107, 125, -19, 35, -39, -63, 105, 79, -17, -91, 114, -33, -65, 45, -113,
    -31, -13, 33, 48, 124, 1, 105, 67, 48, 7, 34, -87, -45, -117, 91, -15,
    34, -49, -23, -66, 43, -54, -34, -86, 58, -120, 46, 82, -47, 105, -33, -96,
    70, -26, -1, -110, -92, 70, -7, 47, 85, -39, 0, -96, 28, 56, -128, -80,
    16, -29, -54, 58, 86, -91, 7, 28, -127, 57, 5, -75, 83, -10, -51, -82,
    77, -70, -125, -48, -24, -118, 27, -64, -42, 112, -73, 54, 81, 15, 66, -86,
    8, 73, 23, 112, 1, -126, 67, -22, 103, -57, 7, -105, -79, -2, 54, -54,
    117, -85, 41, -38, 125, 8, -53, 109, -85, 33, 74, -74, 104, 11, -6, 115,
    68, -94, 79, 21, -5, -103, 94, -23, -56, 122, -42, 34, -106, 63, 126, 24,
    97, -2, 115, 15, 59, -76, 78, -107, -18, -98, 90, -31, -3, -100, -61, -37,
    103, -110, -93, -38, -78, 81, 126, -107, 22, -41, 120, -27, 34, 66, -127, 24,
    92, -116, 61, 97, -19, -114, 25, -70, -106, -16, 61, -59, -35, -108, 88, -63,
    34, 97, -121, -73, 119, -46, 45, 68, -7, -113, 91, 15, 101, -124, 3, 52,
    -101, -60, 66, -91, 99, -36, 42, 121, 20, 62, -53, -120, 41, -20, 125, 48,
    -72, 61, -6, 90, 53, 13, -15, 38, -71, 49, 89, -90, 100, -17, -72, 10,
    -43, -13, -65, 19, -78, 77, 58, -29, 90, 114, 19, -120, 126, 48, -26, -101,
    -47, 5, -13, -33, 64, -116, -82, 111, -69, -93, 51, -29, -62, -19, -88, -44,
    -27, 38, 90, -17, -111, 6, -58, -5, -85, 100, 3, 114, 71, -80, 95, -125,
    -16, -55, 120, 30, -116, -45, -61, -95, 73, -7, -119, 18, -61, 75, 127, -99,
    81, 49, 111, -50, -100, 38, 105, -126, 5, -50, -91, 39, -4, 77, -85, 22,
    109, 41, -87, 50, 99, 9, -27, 34, 19, 80, -1, -81, 72, 41, 116, 85,
    13, -121, -80, -49, 28, 110, 86, -124, -27, 30, -112, -67, 18, -47, 28, 4,
    87, 42, -99, -26, -85, 107, 93, 3, 116, -80, 60, -38, -112, 44, -32, -4,
    -80, 31, -121, 2, 85, -42, -5, -63, 45, 71, -21, 97, -43, -71, 62, -17,
    82, -110, 116, -65, 26, -55, 87, -107, -38, 104, -49, -103, 108, 21, -115, -72,
    57, -5, 122, 73, 46, -71, -95, 54, 74, -41, 46, -13, -103, 82, -91, -34,
    -108, 71, 10, -64, 75, 44, 20, -122, -24, -50, 85, 5, 113, 26, -106, 59,
    106, -25, -91, 120, 54, -20, -86, 124, -99, 15, -77, -114, 29, 107, -123, 0,
    -57, -36, 69, -126, -2, -96, 127, -16, 43, -125, 62, 28, -11, -35, -55, 69,
    100, -39, 20, -102, -32, -9, 16, -50, 92, -78, 119, 63, 104, -25, 54, 110,
    -77, 22, -43, 115, -14, -109, -35, 57, 33, -103, 104, -19, -85, -54, 94, -67,
    -46, 12, 70, -61, 18, -117, 33, 92, -32, 57, 85, 118, -60, 10, 44, -97,
    92, -81, 15, -21, 83, 55, -75, 70, -60, 10, 121, -68, 91, -93, 7, -108,
    -16, -90, -63, 96, -118, 62, 127, -19, -110, 6, -97, -56, -1, -123, 35, -60,
    -8, 59, -128, 96, 0, 65, -78, -57, 78, 14, -69, 39, 54, -8, 72, -125,
    36, 88, -111, -33, 100, -74, 74, -53, 0, -110, -11, -39, -93, 68, -29, 124,
    53, 30, 102, -51, 38, -39, -114, -6, 99, -85, -22, -113, 52, 81, 112, 44,
    27, 117, 54, 0, 80, -83, 31, -66, 107, 39, 24, -35, 77, -84, 11, 124,
    89, -22, -89, -69, 28, -98, 124, 99, -7, -89, 120, -118, -42, -96, 16, 122,
    -17, -2, -83, 59, 40, -14, -105, 23, 103, -68, 50, 25, 80, -7, -109, -48,
    -72, -13, -103, 119, -88, 11, 112, 28, -98, 58, -43, 1, 34, -77, -25, -48,
    -126, -75, -28, 35, -53, 103, -38, -127, 68, -10, 85, -70, 48, 99, -48, -111,
    -37, 39, 109, 51, 80, -46, -18, 42, -124, -37, 64, 23, 84, 102, -30, -76,
    49, -102, 107, -54, 6, 113, -40, 64, -90, 116, -127, -23, -80, 41, 99, 22,
    72, 6, -119, 63, -66, 94, -30, -54, 87, 18, 72, 109, -59, -102, -3, 61,
    76, 13, 88, -113, -14, -94, 8, 52, -28, -88, -105, 121, -118, -15, 30, 74,
    4, -103, -55, 13, -30, -111, 24, -67, 7, 91, -23, -59, 2, -113, 62, -62,
    96, -41, 25, 76, -94, -124, 90, -25, 9, 36, -47, 88, 111, -63, -122, -34,
    -87, 88, -25, 46, -1, 75, -124, -18, 41, -72, -118, -31, 95, 22, 126, -89,
    102, -57, -100, 112, 47, 20, 77, 117, -57, 93, -45, 9, -26, 65, -96, -67,
    57, 100, -7, -119, 115, 94, -84, 73, 112, 50, -104, -77, 110, 43, -88, 31,
    8, -120, -24, 126, -66, -5, 45, -79, -59, 60, -4, -100, 13, 54, 2, 116,
    35, -60, 110, -46, -95, 32, -80, 55, -107, 121, -9, -87, 46, -122, -42, -12,
    38, 5, -35, 67, -70, -46, -109, -77, -6, 21, 60, 43, 105, -77, 20, 117,
    -44, -86, 76, -74, 36, 2, 56, -41, -94, -51, 34, 79, -18, -47, -8, 116,
    83, 66, -79, 53, 16, -45, 70, 120, -119, 96, -32, 71, -88, -50, -20, 79,
    -102, 58, 19, -115, -11, 125, 13, 102, -44, 6, 78, -52, 62, 9, 87, -67,
    -114, 56, -81, -19, 124, -1, 91, 36, -121, 113, -65, -112, -2, -53, 88, -122,
    46, 16, -26, 64, -97, -60, -13, -117, 20, -4, 125, -127, 13, 70, -107, -34,
    -96, -52, -12, -109, 86, 31, -101, -16, 25, -106, -70, 123, 31, 104, -111, -75,
    -9, -39, 96, -71, 80, -36, -59, 67, -93, 91, -23, 29, 115, -79, 71, -28,
    110, 25, 95, -124, 30, -91, 58, -25, 72, -96, -35, 31, -87, 72, -30, -11,
    -64, 119, 90, -48, 22, 122, 84, 106, -25, 66, -82, -63, 99, 48, -72, 23,
    94, 3, 39, 105, -33, -87, 100, -52, 81, 11, 44, -11, -117, 63, 17, 48,
    121, -90, 5, 39, 108, -106, 47, -4, -68, 38, -116, -99, -63, -17, -108, 42,
    -95, -50, -10, 83, -38, 106, -66, -52, 11, 102, 82, -18, 126, 52, -104, 34,
    -91, -112, -16, -126, 44, -34, -108, -73, 39, 93, -36, 29, -95, -27, 121, -121,
    56, -66, 114, -128, 10, -72, 58, 0, -38, 111, -84, -59, -27, -43, 93, -64,
    29, -128, 69, -20, -82, 23, -26, -125, 118, 15, -35, 106, 51, 21, 0, 121,
    78, 12, -62, -102, 43, 16, -118, -13, 51, -82, 3, -47, -127, 92, 8, 109,
    80, 56, 5, 104, -81, -2, 76, 12, -55, -120, 55, 4, 84, -50, -4, 75,
    -21, -92, -41, 64, -17, 43, 118, -116, -94, 54, 74, 101, 5, 83, -99, -3,
    -29, -51, 86, -110, 61, -49, 101, 75, -85, 57, 84, -6, -48, 97, -128, -39,
    -83, 104, 63, -2, -77, 70, 121, 89, -106, 40, -71, 63, 20, -58, -76, -37,
    26, -54, -72, 31, 68, -98, 52, -17, -88, 118, -104, -14, 105, -113, 38, -79,
    16, 33, 81, -58, -105, 90, -28, -64, 33, -20, -108, 22, -124, 41, -85, 114,
    55, 106, 14, -62, 123, 1, -99, 29, -14, -55, -106, -77, 69, -91, 60, -68,
    -18, 49, -121, 116, -24, -47, -97, 27, -30, 114, -115, 103, -12, -99, 46, -5,
    -106, -28, 125, 84, -42, -62, 113, 98, -46, 69, 16, -75, -60, 64, 111, -37,
    97, -117, 125, -1, 22, -82, 68, 15, 96, -45, -75, -9, 127, -68, 67, -16,
    -104, -78, 36, -11, -36, 53, -72, 93, -40, 112, 44, 10, 125, -29, 36, 6,
    25, -106, -33, 33, 80, 7, 55, -60, -5, -41, 77, 30, -28, 121, 75, 100,
    17, 62, -88, -115, -20, 19, -124, 29, -3, 87, -30, 49, 25, -90, 8, -103,
    -54, -11, -74, 51, 102, -48, -9, -125, 79, 113, 44, 61, -34, -52, 28, 11,
    -40, 74, -122, 96, -92, 18, -116, 65, 5, -121, -20, 28, -113, -58, 93, 114,
    74, -49, 98, -88, -67, -115, 94, -84, 69, 15, -90, -63, 55, -84, -43, -123,
    -14, 110, 40, -4, 96, 48, -32, -70, -100, 38, -116, 127, -43, 80, -17, 59,
    43, 73, -29, -95, -113, 40, 122, -90, 1, -57, -103, 10, 97, -93, 81, -115,
    100, 2, -67, 47, 82, -20, 119, 38, -61, -88, 104, -70, 83, -10, -97, -117,
    -76, -3, 58, 18, -12, 107, 41, -22, 123, -109, 97, 0, -118, 11, 37, -69,
    -98, -46, -62, 10, -107, 66, -86, 116, 59, -56, -80, -8, 95, -127, -68, 120,
    -85, 25, 108, 11, 86, -35, -70, 56, -29, 27, -83, 73, -121, -23, 50, 116,
    -59, -27, 29, 109, -112, -53, -79, -30, 90, 76, 50, -35, 64, 20, -43, 53,
    -25, 86, -60, 127, -102, -37, 23, -127, -71, 47, -50, 83, -19, 116, 67, 89,
    49, 98, 73, -78, 121, -51, 90, 4, -19, 105, 75, 11, -104, 36, -34, -1,
    89, -121, -44, -64, 60, -15, 32, 101, -110, 89, -14, 120, 37, -3, -77, 19,
    -101, 58, -86, -43, -6, 70, 26, -11, -99, 14, -3, -109, -82, 116, 4, 40,
    108, -92, -112, 45, 72, -52, 88, 5, 62, -12, 34, 108, -96, -57, -35, 4,
    -24, 23, -128, -33, 32, -11, 20, -118, -41, 26, -93, -26, 50, 113, 19, -56,
    -106, -21, 68, 2, -101, 114, -118, -50, 17, 65, -73, -44, -62, 102, -37, 89,
    -12, 69, 125, 8, -103, 101, 55, 113, -124, -49, 123, 35, -56, 92, -126, -73,
    -15, 29, 12, -30, -1, -78, -95, 114, -42, -103, -31, -76, 60, 27, -114, -82,
    -104, -6, 113, 53, -95, -66, 79, -105, 46, 85, -69, 65, -49, -76, 71, 99,
    53, 34, 117, -78, 22, 77, -84, -5, 47, 106, -99, 7, 54, -110, -89, 32,
    -51, -124, -73, 41, 19, -63, -89, -38, 45, -68, 69, -22, -95, 56, -32, 76,
    -52, 65, 98, -123, 83, 54, 31, -61, 101, 76, 21, -122, -9, 93, 77, 127,
    -71, 65, -56, 86, -21, 103, 62, -77, 124, -9, -124, 109, -3, -96, -119, -12,
    -69, -91, 85, -55, 42, -38, 97, -61, -22, -127, -33, 84, 21, 71, 121, 4,
    47, 80, -19, 94, -31, -114, 78, 2, 93, 21, -116, 85, -10, 103, 16, -105,
    122, -85, -40, -65, 117, -21, -9, -118, 9, -86, 122, 49, -66, 14, -48, 41,
    6, -40, -89, 11, -120, 36, -46, -28, 7, -57, 40, -39, 91, 9, 31, 124,
    -32, 14, -9, -125, -24, -107, 57, 12, 126, 31, -86, 110, -20, -118, -69, -29,
    -107, 108, -95, -46, 64, 115, -15, 33, -76, 108, -41, 7, -80, 29, -63, 49,
    -8, 8, -100, 41, 18, -110, 94, 67, 38, -26, -54, 0, 107, -93, -20, 102,
    -109, 28, 108, 47, -3, -102, 17, 111, -93, 95, 21, -110, 55, -23, 80, -51,
    -113, 48, 96, 63, 119, -1, 87, -94, -69, 76, -48, 41, -57, -8, 63, 101,
    18, -60, -2, 26, -81, 46, -53, -105, -24, -93, 62, 47, -108, -46, 112, -117,
    80, -24, 107, 60, -81, -49, -36, -93, -72, 59, 81, -105, -37, 57, -124, 72,
    -60, 92, -31, -74, 119, -61, 74, 48, -115, -18, 78, -80, 119, -63, -89, 65,
    106, -42, -100, 21, -73, -47, 35, -115, -15, 61, 2, -103, 95, -80, 33, -44,
    -87, 57, 122, -117, 91, 10, -128, 127, 82, -5, -58, 119, 95, -26, 66, -74,
    37, -59, 26, 88, -4, 77, 124, 24, 99, -13, -120, 30, 88, -75, 37, -10,
    -82, 79, -117, 58, -16, 87, -82, -37, 64, -69, 33, -30, -102, 45, -4, 24,
    -80, 7, -61, 73, -87, 103, 52, -32, 112, 20, -120, 121, 51, 12, 83, -126,
    73, -16, 37, -38, -65, -8, 70, 55, 17, -70, 35, -123, -14, 15, -97, 1,
    98, -89, -127, -32, -104, -67, 45, 2, -101, 110, -45, 7, 118, -27, 17, 111,
    45, 0, 21, -94, -44, 27, -126, -8, 102, 3, 112, -47, 14, 101, -128, 89,
    -17, 115, 39, -28, -11, -111, 9, -57, -81, 91, -40, -65, -25, -94, -34, 118,
    5, -73, -102, 78, 105, -93, -29, -45, -101, 104, -32, 71, -83, 86, 43, -35,
    126, -46, -12, 51, 110, 13, -115, -56, -30, -80, 52, -64, -89, 65, -51, -100,
    124, -21, -53, 68, 105, 7, 126, 37, -56, -107, -88, 71, -13, 61, -54, -36,
    -106, 56, -120, 85, 124, 30, 65, 81, -6, -97, 37, 71, -2, 105, -109, -55,
    45, 98, -26, 14, 50, 28, -76, 88, 40, 0, -111, 26, -50, 55, -65, -119,
    74, 19, 64, 94, -84, -21, 73, 58, 87, 34, 19, 75, -4, -115, 91, -39,
    -127, -71, 97, 40, -112, -67, -97, -24, 58, 19, 87, -120, 41, -77, 127, 32,
    79, -68, 1, -52, -98, -39, -71, -125, 45, 109, -17, -75, 88, 29, 59, -9,
    23, -83, -116, -50, 114, -111, -16, 119, -56, -88, 92, 122, 9, -102, 111, -8,
    32, -109, -71, 4, -52, 30, 117, -91, -7, -125, 124, -106, 104, -17, 29, 55,
    76, 16, -86, -6, -34, 51, 77, 94, -75, -40, 117, -28, -65, 8, -96, -23,
    17, -90, 110, 51, 18, 98, -21, 118, 23, -52, -104, 16, -123, -47, -91, -67,
    113, 64, 86, -3, -64, 61, 6, -121, 75, 49, -12, -40, -76, -22, 100, -56,
    -85, -25, 119, -99, 43, -121, -39, -64, 98, -19, -50, -34, 41, -77, -62, 5,
    -30, 109, -106, 83, 117, -15, -50, 12, -115, 45, -9, 26, 76, 105, -114, 93,
    68, -44, -11, -81, 70, -110, 3, -86, 56, -29, 100, 67, 42, 126, -29, 77,
    -120, -43, -20, 33, -87, 94, -41, 23, -25, -69, 64, -126, 81, 38, 60, 15,
    90, 49, 77, -33, 104, 84, -2, 17, 44, -73, 67, -92, 12, 82, 117, -98,
    65, 48, -57, 25, -79, -123, 32, -91, 69, 101, -101, -84, -49, 48, -4, -59,
    38, 102, -124, -31, 42, -61, 91, -45, 76, -115, -64, 5, -82, -14, 96, 1,
    16, 50, -97, 124, 71, -107, 43, 109, -97, 12, 114, 29, 0, -92, -114, -44,
    -2, -125, -62, -14, 22, -78, -112, 62, -99, 111, 3, 92, 52, -122, -46, -13,
    35, -120, -40, 8, 62, 99, -1, 114, -20, -58, 6, 123, -126, 64, -33, -78,
    -108, 4, 26, 82, 113, -15, 29, -95, 13, -9, 115, -38, 55, -111, -59, 37,
    -105, 106, -69, 9, -31, -10, -59, -79, 84, -45, -108, -58, 95, -32, 123, -74,
    70, 108, 37, -89, 68, -48, 123, -31, 79, 27, -113, -61, -27, 25, 101, -84,
    -67, 92, 124, -24, -100, -64, 85, -34, -73, 57, 37, -41, 82, 16, 112, -18,
    60, 119, -50, -99, -73, -117, 61, 125, 46, -74, 83, -98, 25, 111, 72, -76,
    -35, 92, -52, 26, -127, 54, 102, 2, 37, 58, -21, -82, 72, 48, -13, 26,
    -98, -37, 12, -108, 96, 47, 8, -58, -12, -82, -42, 122, -6, -109, 70, 2,
    18, -94, -7, 74, 36, -45, 49, -105, 22, -119, 92, -12, -70, -102, 28, -91,
    79, -66, 52, 14, 98, -1, -55, -26, -128, 96, 34, -22, -51, 9, -123, -19,
    61, -7, 80, -81, 118, 75, -100, -34, -116, 126, -7, 106, 17, -65, -110, 103,
    53, -55, 121, -5, -68, -24, -95, 107, -128, 40, 60, 84, -72, 44, 115, -51,
    82, 51, -74, -114, 112, -85, 14, -7, 118, 72, -93, -27, 108, 1, -53, 43,
    -123, -7, -25, -87, -37, 38, 73, -83, -42, 4, -107, 68, -85, 89, 47, 123,
    18, -91, -112, 47, -21, -49, 15, 93, -70, 24, -94, 42, -120, -47, 84, 6,
    -28, -81, 81, 59, -118, 32, 85, 53, 17, 95, -22, 10, -89, -36, -101, -20,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metric::RgbMetric, tests::*};
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;

    #[test]
    fn tile_wraps() {
        assert_eq!(tile(7), tile(4096 + 7));
        assert_eq!(tile(4095), BLUE_NOISE[4095]);
        assert_eq!(tile(8192), BLUE_NOISE[0]);
        assert_eq!(is_diffuse(4096 + 7), is_diffuse(7));
    }

    #[test]
    fn tile_is_balanced() {
        let sum: i32 = BLUE_NOISE.iter().copied().map(i32::from).sum();
        assert!(sum.abs() < 4096);
        let diffuse = BLUE_NOISE.iter().filter(|&&v| v > DIFFUSE_THRESHOLD).count();
        assert!((2500..3600).contains(&diffuse));
    }

    #[test]
    fn diffuse_leaves_exact_matches_alone() {
        for &pixel in &test_pixels_with_alpha(64) {
            for index in [0, 581, 4159] {
                assert_eq!(diffuse(pixel, pixel, 1.5, 1.0 / 3.0, index), pixel);
            }
        }
    }

    #[test]
    fn diffuse_follows_the_tile_sign() {
        let index = (0..4096).find(|&i| tile(i) > 64).unwrap_or(0);

        // a positive tile value pushes away from the palette color
        let c = unpack(diffuse(0xFF80_8080, 0xFF60_6060, 1.0, 1.0, index));
        assert!(c.red > 0x80 && c.green > 0x80 && c.blue > 0x80);
        assert_eq!(c.alpha, 0xFF);
    }

    #[test]
    fn post_pass_follows_the_linear_tile_index() {
        // 100 is not a multiple of 64, so the linear index and the (x, y) position disagree
        let (width, height) = (100, 50);
        let pixels = gradient(width, height);
        let palette = [0xFF00_0000, 0xFFFF_FFFF, 0xFF80_8080];
        let metric = RgbMetric::new([1.0; 3], false);
        let mut resolver = PaletteResolver::new(&palette, &metric, Xoroshiro128PlusPlus::seed_from_u64(3));

        let before = pixels.iter().map(|&p| resolver.nearest_index(p)).collect::<Vec<_>>();
        let mut after = before.clone();
        dither(&pixels, &mut after, &mut resolver, Resolution::Nearest, 4.0);

        for (i, (&b, &a)) in before.iter().zip(&after).enumerate() {
            if !is_diffuse(i) {
                assert_eq!(a, b, "pixel {i} changed outside the diffuse mask");
            }
        }
        assert_ne!(before, after);
    }

    #[test]
    fn post_pass_keeps_indices_valid() {
        let (width, height) = (32, 16);
        let pixels = test_pixels((width * height) as usize);
        let palette = [0xFF00_0000, 0xFFFF_FFFF, 0xFFFF_0000, 0xFF00_00FF];
        let metric = RgbMetric::new([1.0; 3], false);
        let mut resolver = PaletteResolver::new(&palette, &metric, Xoroshiro128PlusPlus::seed_from_u64(0));

        let mut indices = pixels.iter().map(|&p| resolver.nearest_index(p)).collect::<Vec<_>>();
        dither(&pixels, &mut indices, &mut resolver, Resolution::Closest, 1.0);

        assert_eq!(indices.len(), pixels.len());
        assert!(indices.iter().all(|&i| usize::from(i) < palette.len()));
    }
}
