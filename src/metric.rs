//! The sRGB and CIELAB implementations of [`ColorMetric`].

use crate::{
    cielab::{
        chroma_term, ciede2000_squared, hue_term, lightness_term, rotation_term, to_argb, Lab64,
        LabCache, LabColor,
    },
    tuning::{self, SMALL_PALETTE},
    types::{pack, unpack},
    ColorMetric, Pixel,
};
use palette::Lab;

/// Squares a value.
#[inline]
fn sqr(x: f64) -> f64 {
    x * x
}

/// Adds `term` to `total`, returning `None` once the total can no longer beat `best`.
#[inline]
fn accumulate(total: &mut f64, term: f64, best: f64) -> Option<()> {
    *total += term;
    (*total < best).then_some(())
}

/// Rounds and clamps a component to a `u8` channel.
#[inline]
fn channel(value: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/// The channels of a pixel as `[alpha, red, green, blue]`.
#[inline]
fn argb_components(pixel: Pixel) -> [f64; 4] {
    let c = unpack(pixel);
    [c.alpha, c.red, c.green, c.blue].map(f64::from)
}

/// Weighted Euclidean distance on sRGB channels.
///
/// This is the metric used for near-lossless palettes (more than 256 colors).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbMetric {
    /// Weights of the red, green, and blue channels.
    weights: [f64; 3],
    /// Whether differences in alpha count toward the distance.
    alpha: bool,
}

impl RgbMetric {
    /// Creates a new [`RgbMetric`] with the given channel weights.
    #[must_use]
    pub const fn new(weights: [f64; 3], alpha: bool) -> Self {
        Self { weights, alpha }
    }
}

impl ColorMetric for RgbMetric {
    fn components(&self, pixel: Pixel, _cache: &mut LabCache) -> [f64; 4] {
        argb_components(pixel)
    }

    fn to_pixel(&self, c: &[f64; 4]) -> Pixel {
        pack(channel(c[1]), channel(c[2]), channel(c[3]), channel(c[0]))
    }

    fn merge_cost(&self, a: &[f64; 4], b: &[f64; 4], weight: f64, best: f64) -> Option<f64> {
        let mut cost = 0.0;
        if self.alpha {
            accumulate(&mut cost, weight * sqr(b[0] - a[0]), best)?;
        }
        for (i, w) in self.weights.iter().enumerate() {
            accumulate(&mut cost, weight * w * sqr(b[i + 1] - a[i + 1]), best)?;
        }
        Some(cost)
    }

    fn nearest_distance(
        &self,
        pixel: Pixel,
        entry: Pixel,
        _palette_len: usize,
        best: f64,
        _cache: &mut LabCache,
    ) -> Option<f64> {
        let p = argb_components(pixel);
        let e = argb_components(entry);
        let mut dist = 0.0;
        accumulate(&mut dist, (e[0] - p[0]).abs(), best)?;
        for (i, w) in self.weights.iter().enumerate() {
            accumulate(&mut dist, w * (e[i + 1] - p[i + 1]).abs(), best)?;
        }
        Some(dist)
    }

    fn closest_error(&self, pixel: Pixel, entry: Pixel, _cache: &mut LabCache) -> f64 {
        let p = argb_components(pixel);
        let e = argb_components(entry);
        p.iter().zip(e).map(|(p, e)| (e - p).abs()).sum()
    }
}

/// A blend of Euclidean CIELAB distance and CIEDE2000.
///
/// The blend `ratio` is chosen by [`ColorMetric::tune`] from the palette size and the
/// number of histogram bins: `0.0` is plain Euclidean distance and `1.0` is pure CIEDE2000.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabMetric {
    /// The weight of CIEDE2000 in merge costs.
    ratio: f64,
    /// Scale of squared alpha differences.
    alpha_scale: f64,
    /// RGB channel weights used when resolving against large palettes.
    weights: [f64; 3],
    /// Whether the image has semi-transparent pixels.
    semi_transparent: bool,
}

impl LabMetric {
    /// Creates a new [`LabMetric`] using pure CIEDE2000 until it is tuned.
    #[must_use]
    pub fn new(weights: [f64; 3], semi_transparent: bool) -> Self {
        Self {
            ratio: 1.0,
            alpha_scale: if semi_transparent {
                tuning::semi_transparent_alpha_scale()
            } else {
                1.0
            },
            weights,
            semi_transparent,
        }
    }

    /// The current blend ratio.
    #[must_use]
    pub const fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Adds the CIEDE2000 partial terms scaled by `scale` to `total` one by one.
    fn accumulate_ciede2000(
        total: &mut f64,
        lab1: &Lab64,
        lab2: &Lab64,
        scale: f64,
        best: f64,
    ) -> Option<()> {
        accumulate(total, scale * sqr(lightness_term(lab1, lab2)), best)?;
        let (chroma, primes) = chroma_term(lab1, lab2);
        accumulate(total, scale * sqr(chroma), best)?;
        let (hue, means) = hue_term(lab1, lab2, &primes);
        accumulate(total, scale * sqr(hue), best)?;
        accumulate(total, scale * rotation_term(&means, chroma, hue), best)
    }
}

impl ColorMetric for LabMetric {
    fn components(&self, pixel: Pixel, cache: &mut LabCache) -> [f64; 4] {
        let LabColor { lab, alpha } = cache.get(pixel);
        [alpha, lab.l, lab.a, lab.b]
    }

    fn to_pixel(&self, c: &[f64; 4]) -> Pixel {
        to_argb(&LabColor {
            lab: Lab::new(c[1], c[2], c[3]),
            alpha: c[0],
        })
    }

    fn tune(&mut self, palette_size: usize, num_bins: usize) {
        self.ratio = tuning::lab_ratio(palette_size, num_bins, self.semi_transparent);
    }

    fn merge_cost(&self, a: &[f64; 4], b: &[f64; 4], weight: f64, best: f64) -> Option<f64> {
        let mut cost = 0.0;
        accumulate(&mut cost, weight * self.alpha_scale * sqr(b[0] - a[0]), best)?;

        let euclidean = (1.0 - self.ratio) * weight;
        if euclidean > 0.0 {
            for i in 1..4 {
                accumulate(&mut cost, euclidean * sqr(b[i] - a[i]), best)?;
            }
        }

        let perceptual = self.ratio * weight;
        if perceptual > 0.0 {
            let lab1 = Lab::new(a[1], a[2], a[3]);
            let lab2 = Lab::new(b[1], b[2], b[3]);
            Self::accumulate_ciede2000(&mut cost, &lab1, &lab2, perceptual, best)?;
        }

        Some(cost)
    }

    fn nearest_distance(
        &self,
        pixel: Pixel,
        entry: Pixel,
        palette_len: usize,
        best: f64,
        cache: &mut LabCache,
    ) -> Option<f64> {
        let p = cache.get(pixel);
        let e = cache.get(entry);

        let mut dist = 0.0;
        accumulate(&mut dist, sqr(e.alpha - p.alpha), best)?;

        if palette_len > SMALL_PALETTE {
            let p = argb_components(pixel);
            let e = argb_components(entry);
            for (i, w) in self.weights.iter().enumerate() {
                accumulate(&mut dist, w * sqr(e[i + 1] - p[i + 1]), best)?;
            }
        } else {
            Self::accumulate_ciede2000(&mut dist, &p.lab, &e.lab, 1.0, best)?;
        }

        Some(dist)
    }

    fn closest_error(&self, pixel: Pixel, entry: Pixel, cache: &mut LabCache) -> f64 {
        let p = cache.get(pixel);
        let e = cache.get(entry);
        sqr(e.alpha - p.alpha) + ciede2000_squared(&p.lab, &e.lab).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cielab::ciede2000, tests::*};
    use approx::assert_relative_eq;

    #[test]
    fn cascade_matches_full_ciede2000() {
        let metric = LabMetric::new([1.0; 3], false);
        let mut cache = LabCache::new();
        let pixels = test_pixels(64);
        for &x in &pixels {
            for &y in &pixels[..8] {
                let expected = sqr(ciede2000(&cache.get(x).lab, &cache.get(y).lab));
                let a = metric.components(x, &mut cache);
                let b = metric.components(y, &mut cache);
                if let Some(cost) = metric.merge_cost(&a, &b, 1.0, f64::INFINITY) {
                    assert_relative_eq!(cost, expected, epsilon = 1e-9, max_relative = 1e-9);
                }
            }
        }
    }

    #[test]
    fn cascade_gives_up_when_worse() {
        let metric = RgbMetric::new([1.0; 3], true);
        let mut cache = LabCache::new();
        let black = metric.components(0xFF00_0000, &mut cache);
        let white = metric.components(0xFFFF_FFFF, &mut cache);
        assert_eq!(metric.merge_cost(&black, &white, 1.0, 100.0), None);
        assert_eq!(
            metric.merge_cost(&black, &white, 0.5, f64::INFINITY),
            Some(0.5 * 3.0 * 255.0 * 255.0)
        );
    }

    #[test]
    fn tune_sets_the_blend_ratio() {
        let mut metric = LabMetric::new([1.0; 3], false);
        assert_relative_eq!(metric.ratio(), 1.0);

        metric.tune(16, 4000);
        assert_relative_eq!(metric.ratio(), 1.0);

        metric.tune(128, 4000);
        assert!((0.98..=1.0).contains(&metric.ratio()));

        // many colors from few bins lean toward plain Euclidean distance
        metric.tune(48, 100);
        assert_relative_eq!(metric.ratio(), 0.0);

        let mut semi = LabMetric::new([1.0; 3], true);
        semi.tune(128, 4000);
        assert_relative_eq!(semi.ratio(), 0.5);
        semi.tune(8, 4000);
        assert_relative_eq!(semi.ratio(), 1.0);
    }

    #[test]
    fn rgb_components_round_trip() {
        let metric = RgbMetric::new([1.0; 3], true);
        let mut cache = LabCache::new();
        for &pixel in &test_pixels_with_alpha(256) {
            assert_eq!(metric.to_pixel(&metric.components(pixel, &mut cache)), pixel);
        }
    }

    #[test]
    fn lab_components_round_trip() {
        let metric = LabMetric::new([1.0; 3], false);
        let mut cache = LabCache::new();
        for &pixel in &test_pixels_with_alpha(256) {
            assert_eq!(metric.to_pixel(&metric.components(pixel, &mut cache)), pixel);
        }
    }

    #[test]
    fn identical_colors_have_zero_distance() {
        let mut cache = LabCache::new();
        let lab = LabMetric::new([1.0; 3], true);
        let rgb = RgbMetric::new([0.299, 0.587, 0.114], false);
        for &pixel in &test_pixels(32) {
            assert_eq!(lab.nearest_distance(pixel, pixel, 8, 1.0, &mut cache), Some(0.0));
            assert_eq!(lab.nearest_distance(pixel, pixel, 64, 1.0, &mut cache), Some(0.0));
            assert_eq!(rgb.nearest_distance(pixel, pixel, 64, 1.0, &mut cache), Some(0.0));
            assert_relative_eq!(lab.closest_error(pixel, pixel, &mut cache), 0.0);
            assert_relative_eq!(rgb.closest_error(pixel, pixel, &mut cache), 0.0);
        }
    }
}
