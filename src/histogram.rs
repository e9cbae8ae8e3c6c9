//! The reduced-precision color histogram that clustering starts from.

use crate::{cielab::LabCache, tuning::CountScaling, types::unpack, ColorMetric, Pixel, UniqueColorCounts};
use bitvec::vec::BitVec;

/// The number of slots in a reduced-precision histogram.
const SLOTS: usize = 1 << 16;

/// How many bits of each channel a histogram key keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinKey {
    /// 4 bits of every channel, alpha included.
    SemiTransparent,
    /// 1 bit of alpha and 5 bits of each color channel.
    Transparent,
    /// 5 bits of red and blue and 6 bits of green; alpha is ignored.
    Opaque,
}

impl BinKey {
    /// Chooses the key for an image.
    ///
    /// `fine_alpha` should be set if the image has a fully transparent pixel
    /// or the palette is small.
    #[must_use]
    pub const fn new(semi_transparent: bool, fine_alpha: bool) -> Self {
        if semi_transparent {
            Self::SemiTransparent
        } else if fine_alpha {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }

    /// The histogram slot of a pixel, always less than `65536`.
    #[must_use]
    pub fn index(self, pixel: Pixel) -> usize {
        let c = unpack(pixel);
        let [a, r, g, b] = [c.alpha, c.red, c.green, c.blue].map(usize::from);
        match self {
            Self::SemiTransparent => (a & 0xF0) << 8 | (r & 0xF0) << 4 | (g & 0xF0) | b >> 4,
            Self::Transparent => (a & 0x80) << 8 | (r & 0xF8) << 7 | (g & 0xF8) << 2 | b >> 3,
            Self::Opaque => (r & 0xF8) << 8 | (g & 0xFC) << 3 | b >> 3,
        }
    }
}

/// A histogram bin, and later a cluster of bins.
///
/// Live bins form a ring through `fw` and `bk`, where the link value `0` (the head) means "none".
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Bin {
    /// The mean alpha followed by the mean of the three color components.
    pub(crate) components: [f64; 4],
    /// The (possibly scaled) number of pixels.
    pub(crate) count: f64,
    /// The cost of merging with `nn`.
    pub(crate) err: f64,
    /// The cheapest bin to merge with among the bins ahead in the ring.
    pub(crate) nn: u32,
    /// The next bin in the ring.
    pub(crate) fw: u32,
    /// The previous bin in the ring.
    pub(crate) bk: u32,
    /// The merge count when `err` was last computed.
    pub(crate) tm: u32,
    /// The merge count when this bin last changed, or the deleted sentinel.
    pub(crate) mtm: u32,
}

/// Histogram bins linked in ascending key order.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The non-empty bins packed densely.
    bins: Vec<Bin>,
}

impl Histogram {
    /// Accumulates colors into at most `65536` bins using `key`.
    ///
    /// Components are accumulated in the space of `metric`, and each non-empty bin
    /// is divided by its count to give its centroid.
    pub fn new<M: ColorMetric>(
        colors: &UniqueColorCounts,
        key: BinKey,
        metric: &M,
        cache: &mut LabCache,
    ) -> Self {
        let mut slots = vec![Bin::default(); SLOTS];
        let mut occupied: BitVec = BitVec::repeat(false, SLOTS);

        for (pixel, count) in colors.iter() {
            let i = key.index(pixel);
            let n = f64::from(count);
            let bin = &mut slots[i];
            for (sum, c) in bin.components.iter_mut().zip(metric.components(pixel, cache)) {
                *sum += n * c;
            }
            bin.count += n;
            occupied.set(i, true);
        }

        let bins = occupied
            .iter_ones()
            .map(|i| {
                let mut bin = slots[i];
                let d = 1.0 / bin.count;
                for c in &mut bin.components {
                    *c *= d;
                }
                bin
            })
            .collect();

        Self::linked(bins)
    }

    /// Creates one bin per unique color.
    ///
    /// This is used when the reduced-precision keys collapse the image into fewer bins
    /// than palette colors were requested.
    pub fn exact<M: ColorMetric>(colors: &UniqueColorCounts, metric: &M, cache: &mut LabCache) -> Self {
        let bins = colors
            .iter()
            .map(|(pixel, count)| Bin {
                components: metric.components(pixel, cache),
                count: f64::from(count),
                ..Bin::default()
            })
            .collect();

        Self::linked(bins)
    }

    /// Links the bins into a ring in their current order.
    #[allow(clippy::cast_possible_truncation)]
    fn linked(mut bins: Vec<Bin>) -> Self {
        for i in 1..bins.len() {
            bins[i - 1].fw = i as u32;
            bins[i].bk = (i - 1) as u32;
        }
        Self { bins }
    }

    /// Damps the pixel count of every bin.
    pub(crate) fn scale_counts(&mut self, scaling: CountScaling) {
        for bin in &mut self.bins {
            bin.count = scaling.apply(bin.count);
        }
    }

    /// The number of non-empty bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Whether the histogram has no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Takes the bins out for clustering.
    pub(crate) fn into_bins(self) -> Vec<Bin> {
        self.bins
    }
}
