//! Contains the [`ColorMetric`] trait that the clusterer and the palette resolver are generic over.

use crate::{cielab::LabCache, Pixel};

/// A distance function between colors, together with the space that histogram bins accumulate in.
///
/// Bins store four components: alpha first, then three color components
/// (either R, G, B or L, a, b depending on the metric).
///
/// The distances are cascades: partial terms are added one at a time and the computation
/// stops with `None` as soon as the running total can no longer beat `best`.
pub trait ColorMetric {
    /// Maps a pixel to the components a histogram bin accumulates.
    fn components(&self, pixel: Pixel, cache: &mut LabCache) -> [f64; 4];

    /// Converts averaged bin components back to a pixel.
    fn to_pixel(&self, components: &[f64; 4]) -> Pixel;

    /// Adjusts the metric once the number of histogram bins is known.
    fn tune(&mut self, _palette_size: usize, _num_bins: usize) {}

    /// The cost of merging two bins, where `weight` is `n1 * n2 / (n1 + n2)`.
    fn merge_cost(&self, a: &[f64; 4], b: &[f64; 4], weight: f64, best: f64) -> Option<f64>;

    /// The distance from `pixel` to the palette color `entry` used for the nearest color search.
    fn nearest_distance(
        &self,
        pixel: Pixel,
        entry: Pixel,
        palette_len: usize,
        best: f64,
        cache: &mut LabCache,
    ) -> Option<f64>;

    /// The full error of `entry` for `pixel` used to rank the two closest palette colors.
    fn closest_error(&self, pixel: Pixel, entry: Pixel, cache: &mut LabCache) -> f64;
}
