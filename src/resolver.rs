//! Resolution of pixels to palette indices.

use crate::{cielab::LabCache, types::alpha, ColorMetric, Pixel};
use rand::Rng;
use std::collections::HashMap;

/// How a pixel is mapped to a palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Always the palette color with the smallest distance.
    Nearest,
    /// A random pick between the two best palette colors, favoring the better one.
    ///
    /// This jitter breaks up flat regions when no error diffusion is wanted.
    Closest,
}

/// The two lowest-error palette colors for a pixel.
#[derive(Debug, Clone, Copy)]
struct TopTwo {
    /// The best and second best palette indices.
    indices: [u16; 2],
    /// Their errors. A missing second candidate has an infinite error.
    errors: [f64; 2],
}

/// Maps pixels to indices of a fixed palette, caching results per exact pixel value.
///
/// A resolver belongs to a single quantization call. If the first palette entry is fully
/// transparent, every fully transparent pixel maps to index `0`.
#[derive(Debug)]
pub struct PaletteResolver<'a, M, R> {
    /// The palette being resolved against.
    palette: &'a [Pixel],
    /// The distance function.
    metric: &'a M,
    /// The source of randomness for [`Resolution::Closest`].
    rng: R,
    /// Pixel to CIELAB conversions.
    lab: LabCache,
    /// Cached nearest indices.
    nearest: HashMap<Pixel, u16>,
    /// Cached pairs of closest indices.
    closest: HashMap<Pixel, TopTwo>,
    /// Whether `palette[0]` is fully transparent.
    transparent: bool,
}

impl<'a, M: ColorMetric, R: Rng> PaletteResolver<'a, M, R> {
    /// Creates a resolver for a non-empty palette.
    pub fn new(palette: &'a [Pixel], metric: &'a M, rng: R) -> Self {
        Self {
            palette,
            metric,
            rng,
            lab: LabCache::new(),
            nearest: HashMap::new(),
            closest: HashMap::new(),
            transparent: palette.first().is_some_and(|&p| alpha(p) == 0),
        }
    }

    /// The palette being resolved against.
    #[must_use]
    pub fn palette(&self) -> &'a [Pixel] {
        self.palette
    }

    /// Whether `pixel` is pinned to the transparent entry at index `0`.
    fn is_transparent(&self, pixel: Pixel) -> bool {
        self.transparent && alpha(pixel) == 0
    }

    /// The index of the palette color nearest to `pixel`.
    ///
    /// Repeated calls with the same pixel always give the same index.
    pub fn nearest_index(&mut self, pixel: Pixel) -> u16 {
        if let Some(&index) = self.nearest.get(&pixel) {
            return index;
        }

        let index = if self.is_transparent(pixel) {
            0
        } else {
            let palette = self.palette;
            let mut best = f64::INFINITY;
            let mut index = 0;
            for (i, &entry) in palette.iter().enumerate() {
                if let Some(dist) =
                    self.metric
                        .nearest_distance(pixel, entry, palette.len(), best, &mut self.lab)
                {
                    best = dist;
                    index = i;
                }
            }
            #[allow(clippy::cast_possible_truncation)]
            {
                index as u16
            }
        };

        self.nearest.insert(pixel, index);
        index
    }

    /// Finds the two palette colors with the lowest error for `pixel`.
    fn top_two(&mut self, pixel: Pixel) -> TopTwo {
        let palette = self.palette;
        let mut top = TopTwo {
            indices: [0, 0],
            errors: [f64::INFINITY, f64::INFINITY],
        };

        #[allow(clippy::cast_possible_truncation)]
        for (i, &entry) in palette.iter().enumerate() {
            let err = self.metric.closest_error(pixel, entry, &mut self.lab);
            if err < top.errors[0] {
                top.indices = [i as u16, top.indices[0]];
                top.errors = [err, top.errors[0]];
            } else if err < top.errors[1] {
                top.indices[1] = i as u16;
                top.errors[1] = err;
            }
        }

        top
    }

    /// The index of one of the two palette colors closest to `pixel`.
    ///
    /// With errors `e1 <= e2`, the best color is picked with probability `e2 / (e1 + e2)`,
    /// and always if it matches exactly or if there is no second candidate.
    #[allow(clippy::float_cmp)]
    pub fn closest_index(&mut self, pixel: Pixel) -> u16 {
        if self.is_transparent(pixel) {
            return 0;
        }

        let top = if let Some(&top) = self.closest.get(&pixel) {
            top
        } else {
            let top = self.top_two(pixel);
            self.closest.insert(pixel, top);
            top
        };

        let [e1, e2] = top.errors;
        if e1 == 0.0 || e2.is_infinite() || self.rng.gen::<f64>() * (e1 + e2) <= e2 {
            top.indices[0]
        } else {
            top.indices[1]
        }
    }

    /// Resolves `pixel` with the given strategy.
    pub fn resolve(&mut self, pixel: Pixel, resolution: Resolution) -> u16 {
        match resolution {
            Resolution::Nearest => self.nearest_index(pixel),
            Resolution::Closest => self.closest_index(pixel),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        metric::{LabMetric, RgbMetric},
        tests::*,
    };
    use rand::SeedableRng;
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn rng(seed: u64) -> Xoroshiro128PlusPlus {
        Xoroshiro128PlusPlus::seed_from_u64(seed)
    }

    #[test]
    fn nearest_matches_brute_force() {
        let palette = test_pixels(24);
        let metric = LabMetric::new([1.0; 3], false);
        let mut resolver = PaletteResolver::new(&palette, &metric, rng(0));
        let mut cache = LabCache::new();

        for &pixel in &test_pixels_seeded(512, 7) {
            let expected = palette
                .iter()
                .map(|&e| metric.nearest_distance(pixel, e, palette.len(), f64::INFINITY, &mut cache).unwrap())
                .fold(f64::INFINITY, f64::min);

            let index = resolver.nearest_index(pixel);
            let actual = metric
                .nearest_distance(pixel, palette[usize::from(index)], palette.len(), f64::INFINITY, &mut cache)
                .unwrap();

            approx::assert_relative_eq!(actual, expected);
            assert_eq!(resolver.nearest_index(pixel), index);
        }
    }

    #[test]
    fn palette_colors_resolve_to_themselves() {
        let palette = test_pixels(64);
        let metric = RgbMetric::new([0.299, 0.587, 0.114], false);
        let mut resolver = PaletteResolver::new(&palette, &metric, rng(0));
        for (i, &pixel) in palette.iter().enumerate() {
            assert_eq!(usize::from(resolver.nearest_index(pixel)), i);
            assert_eq!(usize::from(resolver.closest_index(pixel)), i);
        }
    }

    #[test]
    fn closest_picks_one_of_the_best_two() {
        let palette = test_pixels(16);
        let metric = LabMetric::new([1.0; 3], false);
        let mut resolver = PaletteResolver::new(&palette, &metric, rng(3));
        let mut cache = LabCache::new();

        for &pixel in &test_pixels_seeded(256, 11) {
            let mut errors = palette
                .iter()
                .map(|&e| metric.closest_error(pixel, e, &mut cache))
                .collect::<Vec<_>>();
            errors.sort_by(f64::total_cmp);

            for _ in 0..4 {
                let index = resolver.closest_index(pixel);
                let err = metric.closest_error(pixel, palette[usize::from(index)], &mut cache);
                assert!(err <= errors[1]);
            }
        }
    }

    #[test]
    fn closest_is_reproducible_with_a_seed() {
        let palette = test_pixels(16);
        let pixels = test_pixels_seeded(512, 5);
        let metric = RgbMetric::new([1.0; 3], false);

        let run = || {
            let mut resolver = PaletteResolver::new(&palette, &metric, rng(42));
            pixels.iter().map(|&p| resolver.closest_index(p)).collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn transparent_pixels_use_index_zero() {
        let palette = [0x0000_0000, 0xFF00_0000, 0xFFFF_FFFF];
        let metric = RgbMetric::new([1.0; 3], true);
        let mut resolver = PaletteResolver::new(&palette, &metric, rng(0));
        for pixel in [0x00FF_FFFF, 0x0012_3456, 0x0000_0000] {
            assert_eq!(resolver.nearest_index(pixel), 0);
            assert_eq!(resolver.closest_index(pixel), 0);
        }
        assert_eq!(resolver.nearest_index(0xFFFF_FFFF), 2);
    }

    #[test]
    fn single_color_palette() {
        let palette = [0xFF80_8080];
        let metric = LabMetric::new([1.0; 3], false);
        let mut resolver = PaletteResolver::new(&palette, &metric, rng(0));
        for &pixel in &test_pixels(32) {
            assert_eq!(resolver.resolve(pixel, Resolution::Nearest), 0);
            assert_eq!(resolver.resolve(pixel, Resolution::Closest), 0);
        }
    }
}
