//! Pairwise nearest neighbor (PNN) clustering of histogram bins.
//!
//! Starting from a [`Histogram`], the pair of bins whose merge increases the total error
//! the least is merged repeatedly until only the requested number of bins remain.
//! Each bin caches its cheapest merge among the bins ahead of it in the ring,
//! and a min-heap orders the bins by that cost.
//!
//! Heap entries are never removed or updated in place. Instead, every bin records when its
//! cached cost was computed (`tm`) and when it last changed (`mtm`). A popped entry whose bin
//! changed, whose cached neighbor changed, or whose bin was merged away is stale and is
//! recomputed or dropped.
//!
//! # Examples
//! ```
//! # use pnnquant::{pnn, cielab::LabCache, histogram::{BinKey, Histogram}, metric::RgbMetric, UniqueColorCounts};
//! let pixels = [0xFF00_0000, 0xFF10_1010, 0xFFFF_FFFF, 0xFFF0_F0F0];
//! let colors = UniqueColorCounts::new(&pixels);
//! let metric = RgbMetric::new([1.0; 3], false);
//! let histogram = Histogram::exact(&colors, &metric, &mut LabCache::new());
//! let palette = pnn::palette(histogram, 2, &metric);
//! assert_eq!(palette, vec![0xFF08_0808, 0xFFF8_F8F8]);
//! ```

use crate::{
    histogram::{Bin, Histogram},
    ColorMetric, Pixel,
};
use ordered_float::OrderedFloat;
use std::{cmp::Reverse, collections::BinaryHeap};

/// The `mtm` of a bin that was merged into another bin.
const DELETED: u32 = u32::MAX;

/// A heap entry: the cached merge cost of a bin and the bin's index.
type Entry = Reverse<(OrderedFloat<f64>, u32)>;

/// Finds the cheapest bin to merge `idx` with among the bins ahead of it in the ring.
fn find_nn<M: ColorMetric>(bins: &mut [Bin], idx: usize, metric: &M) {
    let bin = bins[idx];
    let mut nn = 0;
    let mut err = f64::INFINITY;

    let mut i = bin.fw;
    while i != 0 {
        let other = &bins[i as usize];
        let weight = bin.count * other.count / (bin.count + other.count);
        if let Some(cost) = metric.merge_cost(&bin.components, &other.components, weight, err) {
            err = cost;
            nn = i;
        }
        i = other.fw;
    }

    bins[idx].err = err;
    bins[idx].nn = nn;
}

/// The heap entry for bin `idx`.
#[allow(clippy::cast_possible_truncation)]
fn entry(bins: &[Bin], idx: usize) -> Entry {
    Reverse((OrderedFloat(bins[idx].err), idx as u32))
}

/// Merges bins until at most `k` remain and returns their colors in ring order.
///
/// If the histogram has `k` or fewer bins, every bin becomes a palette color.
#[must_use]
pub fn palette<M: ColorMetric>(histogram: Histogram, k: usize, metric: &M) -> Vec<Pixel> {
    let mut bins = histogram.into_bins();
    if bins.is_empty() {
        return Vec::new();
    }

    let mut heap = BinaryHeap::with_capacity(bins.len());
    for i in 0..bins.len() {
        find_nn(&mut bins, i, metric);
        heap.push(entry(&bins, i));
    }

    let merges = bins.len().saturating_sub(k);
    let mut merged = 0;
    while merged < merges {
        let Some(Reverse((_, b1))) = heap.pop() else {
            break;
        };
        let b1 = b1 as usize;
        let bin = bins[b1];

        if bin.mtm == DELETED {
            continue;
        }

        if bin.tm < bin.mtm || bins[bin.nn as usize].mtm > bin.tm {
            find_nn(&mut bins, b1, metric);
            #[allow(clippy::cast_possible_truncation)]
            {
                bins[b1].tm = merged as u32;
            }
            heap.push(entry(&bins, b1));
            continue;
        }

        if bin.nn == 0 {
            // only the tail of the ring has nothing ahead of it
            break;
        }

        let nb = bins[bin.nn as usize];
        let total = bin.count + nb.count;
        let tb = &mut bins[b1];
        for (c, (&c1, c2)) in tb
            .components
            .iter_mut()
            .zip(bin.components.iter().zip(nb.components))
        {
            *c = (bin.count * c1 + nb.count * c2) / total;
        }
        tb.count = total;
        merged += 1;
        #[allow(clippy::cast_possible_truncation)]
        {
            tb.mtm = merged as u32;
        }

        bins[nb.bk as usize].fw = nb.fw;
        bins[nb.fw as usize].bk = nb.bk;
        bins[bin.nn as usize].mtm = DELETED;

        heap.push(entry(&bins, b1));
    }

    log::trace!("merged {merged} of {} bins", bins.len());

    let mut palette = Vec::with_capacity(k.min(bins.len()));
    let mut i = 0;
    loop {
        palette.push(metric.to_pixel(&bins[i].components));
        i = bins[i].fw as usize;
        if i == 0 {
            break;
        }
    }
    palette
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cielab::LabCache,
        histogram::BinKey,
        metric::{LabMetric, RgbMetric},
        tests::*,
        types::unpack,
        UniqueColorCounts,
    };

    fn cluster<M: ColorMetric>(pixels: &[Pixel], k: usize, mut metric: M) -> Vec<Pixel> {
        let colors = UniqueColorCounts::new(pixels);
        let mut cache = LabCache::new();
        let histogram = Histogram::new(&colors, BinKey::Opaque, &metric, &mut cache);
        metric.tune(k, histogram.len());
        palette(histogram, k, &metric)
    }

    #[test]
    fn reduces_to_requested_size() {
        let pixels = test_pixels(1024);
        for k in [2, 3, 16, 33, 100, 256] {
            assert_eq!(cluster(&pixels, k, RgbMetric::new([1.0; 3], false)).len(), k);
            assert_eq!(cluster(&pixels, k, LabMetric::new([1.0; 3], false)).len(), k);
        }
    }

    #[test]
    fn keeps_every_bin_when_few() {
        let pixels = [0xFF00_0000, 0xFFFF_0000, 0xFF00_FF00, 0xFF00_00FF];
        let mut palette = cluster(&pixels, 16, LabMetric::new([1.0; 3], false));
        palette.sort_unstable();
        let mut expected = pixels.to_vec();
        expected.sort_unstable();
        assert_eq!(palette, expected);
    }

    #[test]
    fn separates_distinct_clusters() {
        let mut pixels = Vec::new();
        for i in 0..8u32 {
            pixels.push(0xFF00_0000 | i << 16 | i << 8 | i);
            pixels.push(0xFFF0_0000 | i << 8);
            pixels.push(0xFF00_00F0 | i << 16);
        }

        let palette = cluster(&pixels, 3, LabMetric::new([1.0; 3], false));
        assert_eq!(palette.len(), 3);

        let mut dominant = palette
            .iter()
            .map(|&p| {
                let c = unpack(p);
                if c.red > 0x80 {
                    'r'
                } else if c.blue > 0x80 {
                    'b'
                } else {
                    'k'
                }
            })
            .collect::<Vec<_>>();
        dominant.sort_unstable();
        assert_eq!(dominant, vec!['b', 'k', 'r']);
    }

    #[test]
    fn opaque_input_gives_opaque_palette() {
        let pixels = test_pixels(2048);
        let palette = cluster(&pixels, 16, RgbMetric::new([0.299, 0.587, 0.114], false));
        for &p in &palette {
            assert_eq!(unpack(p).alpha, 0xFF);
        }
    }
}
