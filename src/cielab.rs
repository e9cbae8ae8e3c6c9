//! Conversions between ARGB pixels and CIELAB, and the CIEDE2000 color difference.
//!
//! The CIEDE2000 implementation follows "The CIEDE2000 Color-Difference Formula: Implementation
//! Notes, Supplementary Test Data, and Mathematical Observations" by Sharma, Wu, and Dalal
//! (Color Res. Appl., vol. 30, no. 1, 2005). It is exposed both as a single function and as its
//! partial terms, so that distance cascades can compare each term against the best distance
//! found so far and stop early.
//!
//! # Examples
//! ```
//! # use pnnquant::cielab::{ciede2000, to_lab};
//! let red = to_lab(0xFFFF_0000);
//! let orange = to_lab(0xFFFF_8000);
//! assert!(ciede2000(&red.lab, &orange.lab) > 0.0);
//! assert_eq!(ciede2000(&red.lab, &red.lab), 0.0);
//! ```

use crate::types::{alpha, unpack, Pixel};
use palette::{rgb::channels::Argb, white_point::D65, IntoColor, Lab, LinSrgb, Srgb, WithAlpha};
use std::{
    collections::HashMap,
    f64::consts::{PI, TAU},
};

/// CIELAB with a D65 white point and `f64` components.
pub type Lab64 = Lab<D65, f64>;

/// A CIELAB color that keeps the alpha channel (in `0.0..=255.0`) of the pixel it came from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabColor {
    /// The color in CIELAB.
    pub lab: Lab64,
    /// The alpha channel of the original pixel.
    pub alpha: f64,
}

/// `25^7`, used by the G factor and the chroma rotation factor.
const POW25_7: f64 = 6_103_515_625.0;

/// Gamma-decodes the color channels of a pixel.
fn linear(pixel: Pixel) -> LinSrgb<f64> {
    unpack(pixel).color.into_format::<f64>().into_linear()
}

/// Converts an ARGB pixel to CIELAB, keeping its alpha.
#[must_use]
pub fn to_lab(pixel: Pixel) -> LabColor {
    LabColor {
        lab: linear(pixel).into_color(),
        alpha: f64::from(alpha(pixel)),
    }
}

/// Converts a CIELAB color back to an ARGB pixel, clamping every channel to `0..=255`.
#[must_use]
pub fn to_argb(color: &LabColor) -> Pixel {
    let linear: LinSrgb<f64> = color.lab.into_color();
    let srgb: Srgb<f64> = linear.into_encoding();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha = color.alpha.round().clamp(0.0, 255.0) as u8;

    srgb.into_format::<u8>()
        .with_alpha(alpha)
        .into_u32::<Argb>()
}

/// The lightness term `ΔL' / (k_L * S_L)` with `k_L = 1`.
#[must_use]
pub fn lightness_term(lab1: &Lab64, lab2: &Lab64) -> f64 {
    let delta_l = lab2.l - lab1.l;
    let bar_l = (lab1.l + lab2.l) / 2.0;
    let t = (bar_l - 50.0) * (bar_l - 50.0);
    let s_l = 1.0 + 0.015 * t / (20.0 + t).sqrt();
    delta_l / s_l
}

/// Intermediate values of the chroma term that the hue term reuses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaPrimes {
    /// `a'` of the first color.
    a1: f64,
    /// `a'` of the second color.
    a2: f64,
    /// `C'` of the first color.
    c1: f64,
    /// `C'` of the second color.
    c2: f64,
}

/// The chroma term `ΔC' / (k_C * S_C)` with `k_C = 1`.
#[must_use]
pub fn chroma_term(lab1: &Lab64, lab2: &Lab64) -> (f64, ChromaPrimes) {
    let bar_c = (lab1.a.hypot(lab1.b) + lab2.a.hypot(lab2.b)) / 2.0;
    let bar_c7 = bar_c.powi(7);
    let g = 0.5 * (1.0 - (bar_c7 / (bar_c7 + POW25_7)).sqrt());

    let a1 = (1.0 + g) * lab1.a;
    let a2 = (1.0 + g) * lab2.a;
    let c1 = a1.hypot(lab1.b);
    let c2 = a2.hypot(lab2.b);

    let s_c = 1.0 + 0.045 * (c1 + c2) / 2.0;
    ((c2 - c1) / s_c, ChromaPrimes { a1, a2, c1, c2 })
}

/// The mean chroma and mean hue that the rotation term needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueMeans {
    /// `C̄'`
    bar_c: f64,
    /// `h̄'` in radians.
    bar_h: f64,
}

/// Hue angle in `0..2π`, defined as `0` for achromatic colors.
#[allow(clippy::float_cmp)]
fn hue_angle(b: f64, a_prime: f64) -> f64 {
    if b == 0.0 && a_prime == 0.0 {
        0.0
    } else {
        let h = b.atan2(a_prime);
        if h < 0.0 {
            h + TAU
        } else {
            h
        }
    }
}

/// The hue term `ΔH' / (k_H * S_H)` with `k_H = 1`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn hue_term(lab1: &Lab64, lab2: &Lab64, primes: &ChromaPrimes) -> (f64, HueMeans) {
    let product = primes.c1 * primes.c2;
    let h1 = hue_angle(lab1.b, primes.a1);
    let h2 = hue_angle(lab2.b, primes.a2);

    let delta_h = if product == 0.0 {
        0.0
    } else {
        let d = h2 - h1;
        if d < -PI {
            d + TAU
        } else if d > PI {
            d - TAU
        } else {
            d
        }
    };
    let delta_big_h = 2.0 * product.sqrt() * (delta_h / 2.0).sin();

    let sum = h1 + h2;
    let bar_h = if product == 0.0 {
        sum
    } else if (h1 - h2).abs() <= PI {
        sum / 2.0
    } else if sum < TAU {
        (sum + TAU) / 2.0
    } else {
        (sum - TAU) / 2.0
    };

    let bar_c = (primes.c1 + primes.c2) / 2.0;
    let t = 1.0 - 0.17 * (bar_h - 30f64.to_radians()).cos()
        + 0.24 * (2.0 * bar_h).cos()
        + 0.32 * (3.0 * bar_h + 6f64.to_radians()).cos()
        - 0.20 * (4.0 * bar_h - 63f64.to_radians()).cos();
    let s_h = 1.0 + 0.015 * bar_c * t;

    (delta_big_h / s_h, HueMeans { bar_c, bar_h })
}

/// The rotation term `R_T * (ΔC'/S_C) * (ΔH'/S_H)`.
#[must_use]
pub fn rotation_term(means: &HueMeans, chroma: f64, hue: f64) -> f64 {
    let x = (means.bar_h - 275f64.to_radians()) / 25f64.to_radians();
    let delta_theta = 30f64.to_radians() * (-(x * x)).exp();
    let bar_c7 = means.bar_c.powi(7);
    let r_c = 2.0 * (bar_c7 / (bar_c7 + POW25_7)).sqrt();
    -(2.0 * delta_theta).sin() * r_c * chroma * hue
}

/// The squared CIEDE2000 difference, the sum of all partial terms.
///
/// Distance cascades accumulate exactly this value term by term.
#[must_use]
pub fn ciede2000_squared(lab1: &Lab64, lab2: &Lab64) -> f64 {
    let lightness = lightness_term(lab1, lab2);
    let (chroma, primes) = chroma_term(lab1, lab2);
    let (hue, means) = hue_term(lab1, lab2, &primes);
    lightness * lightness + chroma * chroma + hue * hue + rotation_term(&means, chroma, hue)
}

/// The CIEDE2000 color difference `ΔE00`.
#[must_use]
pub fn ciede2000(lab1: &Lab64, lab2: &Lab64) -> f64 {
    ciede2000_squared(lab1, lab2).max(0.0).sqrt()
}

/// Relative luminance (`Y`) of a pixel.
fn luminance(pixel: Pixel) -> f64 {
    let c = linear(pixel);
    c.red * 0.2126 + c.green * 0.7152 + c.blue * 0.0722
}

/// The U opponent-color channel of a pixel.
fn chroma_u(pixel: Pixel) -> f64 {
    let c = unpack(pixel);
    -0.09991 * f64::from(c.red) - 0.33609 * f64::from(c.green) + 0.436 * f64::from(c.blue)
}

/// The luminance difference `Y(c2) - Y(c1)` on a `0..=100` scale.
#[must_use]
pub fn y_diff(c1: Pixel, c2: Pixel) -> f64 {
    (luminance(c2) - luminance(c1)) * 100.0
}

/// The difference `U(c2) - U(c1)` of the U opponent-color channel.
#[must_use]
pub fn u_diff(c1: Pixel, c2: Pixel) -> f64 {
    chroma_u(c2) - chroma_u(c1)
}

/// A cache of pixel to CIELAB conversions owned by one quantization call.
#[derive(Debug, Clone, Default)]
pub struct LabCache(HashMap<Pixel, LabColor>);

impl LabCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `pixel`, reusing an earlier conversion if there was one.
    pub fn get(&mut self, pixel: Pixel) -> LabColor {
        *self.0.entry(pixel).or_insert_with(|| to_lab(pixel))
    }
}
