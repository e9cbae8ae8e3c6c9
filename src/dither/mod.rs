//! Error diffusion along a Gilbert curve.
//!
//! Pixels are visited along a space-filling curve and the residual of each pixel is pushed into
//! a short queue. The next pixel receives a weighted sum of the queued residuals, with the most
//! recent residual weighted the highest.

pub mod blue_noise;
pub mod gilbert;

use crate::{
    histogram::BinKey,
    resolver::{PaletteResolver, Resolution},
    tuning::{self, BLOCK_SIZE, BLUE_NOISE_STRENGTH, SALIENCY_BAND, SMALL_PALETTE},
    types::{pack, unpack},
    ColorMetric, Pixel,
};
use rand::Rng;
use std::collections::VecDeque;

/// A residual as `[red, green, blue, alpha]`.
type ErrorVector = [f32; 4];

/// Options for a [`GilbertDitherer`].
#[derive(Debug, Clone, Copy)]
pub struct DitherConfig<'s> {
    /// The dither weight, which decides the length of the error queue.
    pub weight: f64,
    /// Whether the image has any pixel that is not fully opaque.
    pub has_alpha: bool,
    /// The histogram key used for the small palette lookup table.
    pub key: BinKey,
    /// Optional per-pixel saliency in row-major order.
    pub saliency: Option<&'s [f32]>,
}

/// Error diffusion ditherer following a Gilbert curve.
///
/// # Examples
/// ```
/// # use pnnquant::{dither::{DitherConfig, GilbertDitherer}, histogram::BinKey, metric::RgbMetric, resolver::{PaletteResolver, Resolution}};
/// # use rand::SeedableRng;
/// # use rand_xoshiro::Xoroshiro128PlusPlus;
/// let palette = [0xFF00_0000, 0xFFFF_FFFF];
/// let metric = RgbMetric::new([1.0; 3], false);
/// let resolver = PaletteResolver::new(&palette, &metric, Xoroshiro128PlusPlus::seed_from_u64(0));
/// let config = DitherConfig { weight: 1.5, has_alpha: false, key: BinKey::Transparent, saliency: None };
///
/// let pixels = [0xFF80_8080; 16];
/// let indices = GilbertDitherer::new(resolver, Resolution::Nearest, config).dither(&pixels, 4, 4);
/// assert!(indices.contains(&0) && indices.contains(&1));
/// ```
#[derive(Debug)]
pub struct GilbertDitherer<'a, 's, M, R> {
    /// Resolves adjusted pixels to palette indices.
    resolver: PaletteResolver<'a, M, R>,
    /// The resolution strategy.
    resolution: Resolution,
    /// The options.
    config: DitherConfig<'s>,
    /// Queue weights, oldest first.
    weights: Vec<f32>,
    /// Queued residuals, oldest first.
    queue: VecDeque<ErrorVector>,
    /// Residual magnitude above which error is compressed.
    dither_max: f32,
    /// Cached index plus one per histogram key, or `0` if not yet resolved.
    lookup: Vec<u16>,
}

impl<'a, 's, M: ColorMetric, R: Rng> GilbertDitherer<'a, 's, M, R> {
    /// Creates a new ditherer that takes ownership of `resolver`.
    pub fn new(
        resolver: PaletteResolver<'a, M, R>,
        resolution: Resolution,
        config: DitherConfig<'s>,
    ) -> Self {
        let queue_len = tuning::dither_queue_len(config.weight);
        let dither_max = tuning::dither_max(
            resolver.palette().len(),
            config.weight,
            config.has_alpha,
            config.saliency.is_some(),
        );

        log::debug!(
            "gilbert dither: weight {}, queue {queue_len}, dither max {dither_max}",
            config.weight
        );

        Self {
            resolver,
            resolution,
            config,
            weights: queue_weights(queue_len),
            queue: VecDeque::from(vec![[0.0; 4]; queue_len]),
            dither_max,
            lookup: Vec::new(),
        }
    }

    /// Dithers `pixels` of a `width` by `height` image and returns one palette index per pixel.
    ///
    /// `pixels.len()` must equal `width * height`.
    pub fn dither(&mut self, pixels: &[Pixel], width: u32, height: u32) -> Vec<u16> {
        if self.lookup.is_empty() && self.resolver.palette().len() <= SMALL_PALETTE {
            self.lookup = vec![0; 1 << 16];
        }

        let mut indices = vec![0; pixels.len()];
        gilbert::traverse(width, height, &mut |x, y| {
            let i = x as usize + y as usize * width as usize;
            indices[i] = self.dither_pixel(pixels[i], i);
        });
        indices
    }

    /// Gives back the resolver along with its caches.
    pub fn into_resolver(self) -> PaletteResolver<'a, M, R> {
        self.resolver
    }

    /// The source color plus the weighted queued error, and the largest adjusted channel value.
    fn adjusted(&self, pixel: Pixel) -> (ErrorVector, f32) {
        let c = unpack(pixel);
        let mut error = [c.red, c.green, c.blue, c.alpha].map(f32::from);

        #[allow(clippy::cast_precision_loss)]
        let mut max_err = (self.queue.len() - 1) as f32;
        for (queued, &w) in self.queue.iter().zip(&self.weights) {
            for (e, &q) in error.iter_mut().zip(queued) {
                *e += q * w;
                max_err = max_err.max(*e);
            }
        }

        (error, max_err)
    }

    /// Resolves the adjusted color, going through the lookup table for small palettes.
    fn resolve(&mut self, pixel: Pixel, adjusted: Pixel, i: usize) -> u16 {
        if self.lookup.is_empty() || unpack(adjusted).alpha <= 0xF0 {
            return self.resolver.resolve(adjusted, self.resolution);
        }

        let key = self.config.key.index(adjusted);
        if self.lookup[key] == 0 {
            self.lookup[key] = self.resolver.resolve(adjusted, self.resolution) + 1;
        }
        let index = self.lookup[key] - 1;

        match self.config.saliency.map(|s| s[i]) {
            Some(saliency) if saliency > SALIENCY_BAND.0 && saliency < SALIENCY_BAND.1 => {
                let qpixel = self.resolver.palette()[usize::from(index)];
                let probe = blue_noise::diffuse(pixel, qpixel, 1.0 / saliency, BLUE_NOISE_STRENGTH, i);
                self.resolver.resolve(probe, self.resolution)
            }
            _ => index,
        }
    }

    /// Dithers the pixel with row-major index `i`.
    fn dither_pixel(&mut self, pixel: Pixel, i: usize) -> u16 {
        let (adjusted, max_err) = self.adjusted(pixel);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let [r, g, b, a] = adjusted.map(|c| c.clamp(0.0, 255.0) as u8);
        let index = self.resolve(pixel, pack(r, g, b, a), i);

        let q = unpack(self.resolver.palette()[usize::from(index)]);
        let mut error = [
            f32::from(r) - f32::from(q.red),
            f32::from(g) - f32::from(q.green),
            f32::from(b) - f32::from(q.blue),
            f32::from(a) - f32::from(q.alpha),
        ];

        self.compress(&mut error, max_err, blue_noise::is_diffuse(i));

        self.queue.pop_front();
        self.queue.push_back(error);
        index
    }

    /// Dampens large residual channels and clamps them to `dither_max`.
    ///
    /// Two-color palettes are only clamped.
    fn compress(&self, error: &mut ErrorVector, max_err: f32, diffuse: bool) {
        #[allow(clippy::cast_precision_loss)]
        let tail = (self.queue.len() - 1) as f32;
        let max = self.dither_max;
        let dampen = self.resolver.palette().len() > 2;
        for e in error {
            if dampen && e.abs() >= max {
                *e = if diffuse {
                    (*e / max_err * 20.0).tanh() * tail
                } else {
                    *e / (1.0 + max.sqrt())
                };
            }
            *e = (*e).clamp(-max, max);
        }
    }
}

/// The weights of queued residuals, oldest first, summing to one.
///
/// Each weight is `(BLOCK_SIZE + 1)^(1 / (len - 1))` times the previous one.
fn queue_weights(len: usize) -> Vec<f32> {
    #[allow(clippy::cast_precision_loss)]
    let ratio = (BLOCK_SIZE + 1.0).powf(1.0 / (len as f32 - 1.0));

    let mut weights = vec![0.0; len];
    let mut weight = 1.0f32;
    for w in weights.iter_mut().rev() {
        *w = 1.0 / weight;
        weight *= ratio;
    }

    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    let total: f32 = weights.iter().sum();
    weights[0] += 1.0 - total;
    weights
}
