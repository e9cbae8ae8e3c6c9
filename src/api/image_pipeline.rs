//! Contains the [`ImagePipeline`] builder struct for the high level API.

use crate::{
    cielab::LabCache,
    dither::{blue_noise, DitherConfig, GilbertDitherer},
    histogram::{BinKey, Histogram},
    metric::{LabMetric, RgbMetric},
    pnn,
    resolver::{PaletteResolver, Resolution},
    tuning::{self, CountScaling, FINE_KEY_PALETTE, NEAR_LOSSLESS},
    types::alpha,
    ColorMetric, ColorSpace, PaletteSize, Pixel, QuantizeError, QuantizeOutput,
    UniqueColorCounts, BLACK, WHITE,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::borrow::Cow;
#[cfg(feature = "image")]
use {
    crate::types::{pack, unpack},
    image::RgbaImage,
};

/// A builder struct to specify options to create a quantized image or an indexed palette from an image.
///
/// # Examples
/// To start, create an [`ImagePipeline`] from a slice of ARGB pixels:
/// ```
/// # use pnnquant::{ImagePipeline, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let pixels = vec![0xFF10_2030; 64];
/// let mut pipeline = ImagePipeline::new(&pixels, 8, 8)?;
/// # Ok(())
/// # }
/// ```
///
/// Or from an [`RgbaImage`] (note that the `image` feature is needed):
/// ```no_run
/// # use pnnquant::ImagePipeline;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgba8();
/// let mut pipeline = ImagePipeline::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
///
/// Then, you can change different options like the number of colors in the palette:
/// ```
/// # use pnnquant::{ColorSpace, ImagePipeline, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// # let pixels = vec![0xFF10_2030; 64];
/// # let mut pipeline = ImagePipeline::new(&pixels, 8, 8)?;
/// let pipeline = pipeline
///     .palette_size(16)
///     .dither(false)
///     .colorspace(Some(ColorSpace::Srgb))
///     .seed(42);
/// # Ok(())
/// # }
/// ```
///
/// Finally, run the pipeline:
/// ```
/// # use pnnquant::{ImagePipeline, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// # let pixels = vec![0xFF10_2030; 64];
/// # let pipeline = ImagePipeline::new(&pixels, 8, 8)?;
/// let output = pipeline.indexed_palette();
/// assert_eq!(output.palette, vec![0xFF10_2030]);
/// assert!(output.indices.iter().all(|&i| i == 0));
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct ImagePipeline<'a> {
    /// The input image as a flat slice of ARGB pixels.
    pub(crate) pixels: Cow<'a, [Pixel]>,
    /// The dimensions of the image.
    pub(crate) dimensions: (u32, u32),
    /// The number of colors to put in the palette.
    pub(crate) k: PaletteSize,
    /// Whether or not to perform error diffusion.
    pub(crate) dither: bool,
    /// The color space, or `None` to choose from the palette size.
    pub(crate) colorspace: Option<ColorSpace>,
    /// The seed for the random number generator of [`Resolution::Closest`].
    pub(crate) seed: u64,
    /// Optional per-pixel saliency.
    pub(crate) saliency: Option<&'a [f32]>,
}

/// What the orchestrator learned about an image before quantizing it.
#[derive(Debug)]
struct Plan {
    /// The requested palette size.
    k: usize,
    /// The first fully transparent pixel, if any.
    transparent: Option<Pixel>,
    /// Whether semi-transparency is handled.
    semi_transparent: bool,
    /// Whether error diffusion is on.
    dither: bool,
    /// The color space to cluster in.
    colorspace: ColorSpace,
    /// The histogram key.
    key: BinKey,
    /// The deduplicated pixels.
    colors: UniqueColorCounts,
}

impl Plan {
    /// Whether the palette is the fixed two-color pair and no clustering runs.
    fn fixed_pair(&self) -> bool {
        self.k == 2 && self.colors.num_colors() != 2
    }
}

impl<'a> ImagePipeline<'a> {
    /// Creates a new [`ImagePipeline`] with default options
    /// and does not validate the size of the input image/slice.
    fn new_unchecked(pixels: Cow<'a, [Pixel]>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            dimensions: (width, height),
            k: PaletteSize::default(),
            dither: true,
            colorspace: None,
            seed: 0,
            saliency: None,
        }
    }

    /// Checks that the dimensions are non-zero and match the number of pixels.
    fn validate(len: usize, width: u32, height: u32) -> Result<(), QuantizeError> {
        if len == 0 || width == 0 || height == 0 {
            Err(QuantizeError::EmptyImage)
        } else if len as u64 != u64::from(width) * u64::from(height) {
            Err(QuantizeError::DimensionMismatch { len, width, height })
        } else {
            Ok(())
        }
    }

    /// Creates a new [`ImagePipeline`] with default options.
    ///
    /// # Errors
    /// Returns an error if the image is empty or if `pixels.len() != width * height`.
    pub fn new(pixels: &'a [Pixel], width: u32, height: u32) -> Result<Self, QuantizeError> {
        Self::validate(pixels.len(), width, height)?;
        Ok(Self::new_unchecked(Cow::Borrowed(pixels), width, height))
    }

    /// Sets the palette size which determines the (maximum) number of colors to have in the palette.
    ///
    /// Sizes above [`MAX_COLORS`](crate::MAX_COLORS) are a near-lossless re-dither:
    /// dithering is always on and semi-transparency is not given special treatment.
    ///
    /// The default palette size is [`MAX_COLORS`](crate::MAX_COLORS).
    pub fn palette_size(&mut self, size: impl Into<PaletteSize>) -> &mut Self {
        self.k = size.into();
        self
    }

    /// Sets whether or not to apply error diffusion dithering to the image.
    ///
    /// Without dithering, pixels pick randomly between their two closest palette colors and
    /// a blue-noise pass refines the result.
    ///
    /// The default value is `true`.
    pub fn dither(&mut self, dither: bool) -> &mut Self {
        self.dither = dither;
        self
    }

    /// Sets the color space to perform color quantization in.
    ///
    /// The default is `None`, which picks [`ColorSpace::for_palette_size`].
    pub fn colorspace(&mut self, colorspace: Option<ColorSpace>) -> &mut Self {
        self.colorspace = colorspace;
        self
    }

    /// Sets the seed value for the random number generator.
    ///
    /// The default seed is `0`.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Sets a saliency map with one value in `0.0..=1.0` per pixel in row-major order.
    ///
    /// For palettes of at most 32 colors, pixels with a saliency in `(0.65, 0.75)`
    /// get a blue-noise perturbation while dithering.
    ///
    /// # Errors
    /// Returns an error if `saliency` does not have one value per pixel.
    pub fn saliency(&mut self, saliency: &'a [f32]) -> Result<&mut Self, QuantizeError> {
        if saliency.len() == self.pixels.len() {
            self.saliency = Some(saliency);
            Ok(self)
        } else {
            Err(QuantizeError::SaliencyMismatch {
                len: saliency.len(),
                expected: self.pixels.len(),
            })
        }
    }
}

#[cfg(feature = "image")]
impl<'a> TryFrom<&'a RgbaImage> for ImagePipeline<'a> {
    type Error = QuantizeError;

    fn try_from(image: &'a RgbaImage) -> Result<Self, Self::Error> {
        let pixels = image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                pack(r, g, b, a)
            })
            .collect::<Vec<_>>();

        Self::validate(pixels.len(), image.width(), image.height())?;
        Ok(Self::new_unchecked(
            Cow::Owned(pixels),
            image.width(),
            image.height(),
        ))
    }
}

impl<'a> ImagePipeline<'a> {
    /// Scans the image and settles every option that depends on it.
    fn plan(&self) -> Plan {
        let k = self.k.as_usize();
        let near_lossless = k > NEAR_LOSSLESS;

        let transparent = self.pixels.iter().copied().find(|&p| alpha(p) == 0);
        let semi_transparent = !near_lossless
            && self.pixels.iter().any(|&p| (1..u8::MAX).contains(&alpha(p)));

        let colors = UniqueColorCounts::new(&self.pixels);
        let key = BinKey::new(semi_transparent, transparent.is_some() || k < FINE_KEY_PALETTE);
        let colorspace = self.colorspace.unwrap_or(ColorSpace::for_palette_size(k));

        log::debug!(
            "{} unique colors, transparent: {transparent:?}, semi-transparent: {semi_transparent}, {colorspace:?}",
            colors.num_colors(),
        );

        Plan {
            k,
            transparent,
            semi_transparent,
            dither: self.dither || near_lossless,
            colorspace,
            key,
            colors,
        }
    }

    /// The channel weights for the RGB parts of the metrics.
    fn channel_weights(&self, plan: &Plan) -> [f64; 3] {
        let (width, height) = self.dimensions;
        tuning::channel_weights(plan.semi_transparent, plan.k, width, height)
    }

    /// The metric for [`ColorSpace::Srgb`].
    fn rgb_metric(&self, plan: &Plan) -> RgbMetric {
        RgbMetric::new(
            self.channel_weights(plan),
            plan.semi_transparent || plan.transparent.is_some(),
        )
    }

    /// The metric for [`ColorSpace::Lab`].
    fn lab_metric(&self, plan: &Plan) -> LabMetric {
        LabMetric::new(self.channel_weights(plan), plan.semi_transparent)
    }

    /// Runs the pipeline and returns the computed color palette.
    ///
    /// If the image has a fully transparent pixel and the palette size is more than `2`,
    /// the first palette entry is that exact transparent color.
    #[must_use]
    pub fn palette(&self) -> Vec<Pixel> {
        let plan = self.plan();
        match plan.colorspace {
            ColorSpace::Srgb => build_palette(&plan, &mut self.rgb_metric(&plan)),
            ColorSpace::Lab => build_palette(&plan, &mut self.lab_metric(&plan)),
        }
    }

    /// Runs the pipeline and returns the quantized image as a list of indices into a palette.
    ///
    /// The random number generator is seeded with the value given to [`ImagePipeline::seed`],
    /// so the output is reproducible.
    #[must_use]
    pub fn indexed_palette(&self) -> QuantizeOutput {
        self.indexed_palette_with_rng(Xoroshiro128PlusPlus::seed_from_u64(self.seed))
    }

    /// Runs the pipeline with the given random number generator.
    #[must_use]
    pub fn indexed_palette_with_rng(&self, rng: impl Rng) -> QuantizeOutput {
        let plan = self.plan();
        match plan.colorspace {
            ColorSpace::Srgb => self.indexed_palette_with(&plan, self.rgb_metric(&plan), rng),
            ColorSpace::Lab => self.indexed_palette_with(&plan, self.lab_metric(&plan), rng),
        }
    }

    /// Runs the pipeline and returns the quantized ARGB pixels.
    #[must_use]
    pub fn quantized_pixels(&self) -> Vec<Pixel> {
        self.indexed_palette().pixels()
    }

    /// Computes the palette and the index of every pixel with `metric`.
    fn indexed_palette_with<M: ColorMetric>(
        &self,
        plan: &Plan,
        mut metric: M,
        rng: impl Rng,
    ) -> QuantizeOutput {
        let (width, height) = self.dimensions;
        let palette = build_palette(plan, &mut metric);

        let weight = tuning::dither_weight(plan.k, plan.semi_transparent, plan.colors.num_colors());
        // the fixed pair is always resolved deterministically
        let resolution = if plan.dither || plan.fixed_pair() {
            Resolution::Nearest
        } else {
            Resolution::Closest
        };

        let config = DitherConfig {
            weight,
            has_alpha: plan.semi_transparent || plan.transparent.is_some(),
            key: plan.key,
            saliency: self.saliency,
        };

        let mut indices = {
            let resolver = PaletteResolver::new(&palette, &metric, rng);
            let mut ditherer = GilbertDitherer::new(resolver, resolution, config);
            let mut indices = ditherer.dither(&self.pixels, width, height);

            if !plan.dither && !plan.fixed_pair() {
                let mut resolver = ditherer.into_resolver();
                #[allow(clippy::cast_precision_loss)]
                let weight = (palette.len() * palette.len()) as f32 / plan.colors.num_colors() as f32;
                blue_noise::dither(&self.pixels, &mut indices, &mut resolver, resolution, weight);
            }

            indices
        };

        if palette.first().is_some_and(|&p| alpha(p) == 0) {
            for (index, &pixel) in indices.iter_mut().zip(self.pixels.iter()) {
                if alpha(pixel) == 0 {
                    *index = 0;
                }
            }
        }

        QuantizeOutput::new(palette, indices)
    }
}

#[cfg(feature = "image")]
impl<'a> ImagePipeline<'a> {
    /// Runs the pipeline and returns the quantized image.
    #[must_use]
    pub fn quantized_rgbaimage(&self) -> RgbaImage {
        let (width, height) = self.dimensions;
        let buf = self
            .quantized_pixels()
            .into_iter()
            .flat_map(|p| {
                let c = unpack(p);
                [c.red, c.green, c.blue, c.alpha]
            })
            .collect::<Vec<_>>();

        #[allow(clippy::expect_used)]
        {
            // there is one index per pixel,
            // so buf should be large enough by nature of its construction
            RgbaImage::from_vec(width, height, buf).expect("large enough buffer")
        }
    }
}

/// Computes the palette for a planned image.
fn build_palette<M: ColorMetric>(plan: &Plan, metric: &mut M) -> Vec<Pixel> {
    let k = plan.k;
    let colors = &plan.colors;
    let distinct = colors.num_colors();
    let mut cache = LabCache::new();

    let mut palette = if plan.fixed_pair() {
        match plan.transparent {
            Some(transparent) => vec![transparent, BLACK],
            None => vec![BLACK, WHITE],
        }
    } else if distinct <= k {
        colors.colors().to_vec()
    } else {
        let mut histogram = Histogram::new(colors, plan.key, metric, &mut cache);
        if histogram.len() < k {
            histogram = Histogram::exact(colors, metric, &mut cache);
        }
        log::debug!("clustering {} bins into {k} colors", histogram.len());

        metric.tune(k, histogram.len());
        histogram.scale_counts(CountScaling::new(k, histogram.len()));
        pnn::palette(histogram, k, metric)
    };

    if let Some(transparent) = plan.transparent.filter(|_| k > 2) {
        place_transparent(&mut palette, transparent, metric, &mut cache);
    }

    palette
}

/// Makes the exact `transparent` color the first palette entry.
///
/// If the palette does not hold it already, the entry nearest to it is replaced.
fn place_transparent<M: ColorMetric>(
    palette: &mut [Pixel],
    transparent: Pixel,
    metric: &M,
    cache: &mut LabCache,
) {
    let index = palette.iter().position(|&p| p == transparent).unwrap_or_else(|| {
        let mut best = f64::INFINITY;
        let mut index = 0;
        for (i, &entry) in palette.iter().enumerate() {
            if let Some(dist) = metric.nearest_distance(transparent, entry, palette.len(), best, cache) {
                best = dist;
                index = i;
            }
        }
        index
    });

    palette[index] = transparent;
    palette.swap(0, index);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{quantize, tests::*};
    use std::collections::HashSet;

    const RED: Pixel = 0xFFFF_0000;
    const BLUE: Pixel = 0xFF00_00FF;

    #[test]
    fn rejects_invalid_input() {
        assert_eq!(ImagePipeline::new(&[], 0, 0).err(), Some(QuantizeError::EmptyImage));
        assert_eq!(ImagePipeline::new(&[BLACK], 1, 0).err(), Some(QuantizeError::EmptyImage));
        assert_eq!(
            ImagePipeline::new(&[BLACK; 5], 2, 2).err(),
            Some(QuantizeError::DimensionMismatch { len: 5, width: 2, height: 2 })
        );
        assert_eq!(quantize(&[BLACK; 4], 2, 2, 1, true).err(), Some(QuantizeError::PaletteSize(1)));

        let pixels = [BLACK; 4];
        let saliency = [0.5; 3];
        let mut pipeline = ImagePipeline::new(&pixels, 2, 2).unwrap();
        assert_eq!(
            pipeline.saliency(&saliency).err(),
            Some(QuantizeError::SaliencyMismatch { len: 3, expected: 4 })
        );
    }

    #[test]
    fn two_color_checkerboard() {
        let pixels = checkerboard(4, 4, RED, BLUE);
        let output = quantize(&pixels, 4, 4, 2, false).unwrap();

        let palette = output.palette.iter().copied().collect::<HashSet<_>>();
        assert_eq!(palette, HashSet::from([RED, BLUE]));
        assert_eq!(output.pixels(), pixels);
        assert_eq!(output.counts, vec![8, 8]);
    }

    #[test]
    fn single_gray_pixel_with_two_colors() {
        let pixels = [0xFF80_8080];
        let mut pipeline = ImagePipeline::new(&pixels, 1, 1).unwrap();
        pipeline.palette_size(2);

        for dither in [false, true] {
            for seed in 0..32 {
                let output = pipeline.dither(dither).seed(seed).indexed_palette();
                assert_eq!(output.palette, vec![BLACK, WHITE]);
                // mid-gray is lighter than the midpoint of black and white
                assert_eq!(output.indices, vec![1], "seed = {seed}, dither = {dither}");
            }
        }
    }

    #[test]
    fn fixed_pair_follows_luminance() {
        let (width, height) = (16, 16);
        let pixels = gradient(width, height);
        let mut pipeline = ImagePipeline::new(&pixels, width, height).unwrap();
        pipeline.palette_size(2).dither(false);

        let expected = pipeline.seed(0).indexed_palette();
        assert_eq!(expected.palette, vec![BLACK, WHITE]);
        for seed in 1..8 {
            assert_eq!(pipeline.seed(seed).indexed_palette(), expected);
        }
        assert_eq!(expected.indices[0], 0);
        assert_eq!(expected.indices[pixels.len() - 1], 1);
    }

    #[test]
    fn fully_transparent_image() {
        let pixels = [0x0000_0000; 4];
        for dither in [false, true] {
            let output = quantize(&pixels, 2, 2, 4, dither).unwrap();
            assert_eq!(alpha(output.palette[0]), 0);
            assert_eq!(output.indices, vec![0; 4]);
        }
    }

    #[test]
    fn transparent_color_comes_first() {
        let (width, height) = (32, 32);
        let mut pixels = test_pixels((width * height) as usize);
        for i in (0..pixels.len()).step_by(7) {
            pixels[i] = 0x0012_3456;
        }

        for k in [3, 16, 64] {
            let output = quantize(&pixels, width, height, k, true).unwrap();
            assert_eq!(output.palette[0], 0x0012_3456);
            assert_eq!(output.palette.len(), usize::from(k));
            for (&pixel, &index) in pixels.iter().zip(&output.indices) {
                if alpha(pixel) == 0 {
                    assert_eq!(index, 0);
                }
            }
        }
    }

    #[test]
    fn few_colors_are_kept_exactly() {
        let pixels = test_pixels_with_duplicates(1024, 40);
        let expected = pixels.iter().copied().collect::<HashSet<_>>();

        for k in [40, 64, 256] {
            for dither in [false, true] {
                let output = quantize(&pixels, 32, 32, k, dither).unwrap();
                let palette = output.palette.iter().copied().collect::<HashSet<_>>();
                assert_eq!(palette, expected);
                assert_eq!(output.pixels(), pixels);
            }
        }
    }

    #[test]
    fn palette_size_and_indices() {
        let (width, height) = (48, 48);
        let pixels = gradient(width, height);
        let distinct = pixels.iter().collect::<HashSet<_>>().len();

        for k in [2u16, 7, 16, 32, 48, 100, 256, 300] {
            for dither in [false, true] {
                let output = quantize(&pixels, width, height, k, dither).unwrap();
                assert_eq!(output.palette.len(), usize::from(k).min(distinct), "k = {k}");
                assert_eq!(output.indices.len(), pixels.len());
                assert!(output.indices.iter().all(|&i| usize::from(i) < output.palette.len()));
                assert_eq!(output.counts.iter().sum::<u32>() as usize, pixels.len());
            }
        }
    }

    /// Random colors whose alpha cycles through every value, starting with a transparent pixel.
    fn semi_transparent_pixels(n: usize) -> Vec<Pixel> {
        test_pixels(n)
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                #[allow(clippy::cast_possible_truncation)]
                let a = (i * 37 % 256) as u32;
                a << 24 | p & 0x00FF_FFFF
            })
            .collect()
    }

    #[test]
    fn semi_transparent_input() {
        let (width, height) = (40, 40);
        let pixels = semi_transparent_pixels((width * height) as usize);
        let distinct = pixels.iter().collect::<HashSet<_>>().len();
        let mut pipeline = ImagePipeline::new(&pixels, width, height).unwrap();

        for k in [2u16, 3, 16, 64, 256] {
            pipeline.palette_size(PaletteSize::try_from(k).unwrap());
            let plan = pipeline.plan();
            assert!(plan.semi_transparent);
            assert_eq!(plan.key, BinKey::SemiTransparent);

            for dither in [false, true] {
                let output = pipeline.dither(dither).indexed_palette();
                assert_eq!(output.palette.len(), usize::from(k).min(distinct), "k = {k}");
                assert!(output.indices.iter().all(|&i| usize::from(i) < output.palette.len()));
                assert_eq!(alpha(output.palette[0]), 0);
                if k > 2 {
                    assert!(output.palette.iter().any(|&p| (1..u8::MAX).contains(&alpha(p))));
                }
                for (&pixel, &index) in pixels.iter().zip(&output.indices) {
                    if alpha(pixel) == 0 {
                        assert_eq!(index, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn large_palettes_always_dither() {
        let (width, height) = (40, 40);
        let pixels = semi_transparent_pixels((width * height) as usize);
        let mut pipeline = ImagePipeline::new(&pixels, width, height).unwrap();
        pipeline.palette_size(PaletteSize::try_from(300u16).unwrap());

        let plan = pipeline.plan();
        assert!(plan.dither);
        assert!(!plan.semi_transparent);
        assert_eq!(plan.colorspace, ColorSpace::Srgb);

        let dithered = pipeline.dither(true).seed(1).indexed_palette();
        let plain = pipeline.dither(false).seed(2).indexed_palette();
        assert_eq!(dithered, plain);
        assert_eq!(dithered.palette.len(), 300);
    }

    #[test]
    fn seed_makes_output_reproducible() {
        let pixels = gradient(24, 24);
        let mut pipeline = ImagePipeline::new(&pixels, 24, 24).unwrap();
        pipeline.palette_size(8).dither(false).seed(7);
        assert_eq!(pipeline.indexed_palette(), pipeline.indexed_palette());
        assert_eq!(pipeline.palette(), pipeline.indexed_palette().palette);
    }

    #[test]
    fn colorspaces_and_saliency() {
        let (width, height) = (24, 24);
        let pixels = gradient(width, height);
        let saliency = (0..pixels.len()).map(|i| (i % 100) as f32 / 100.0).collect::<Vec<_>>();

        let mut pipeline = ImagePipeline::new(&pixels, width, height).unwrap();
        pipeline.palette_size(12).saliency(&saliency).unwrap();

        for colorspace in [None, Some(ColorSpace::Srgb), Some(ColorSpace::Lab)] {
            let output = pipeline.colorspace(colorspace).indexed_palette();
            assert_eq!(output.palette.len(), 12);
            assert!(output.indices.iter().all(|&i| usize::from(i) < 12));
        }
    }
}
