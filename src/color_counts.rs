//! Contains the code for pixel deduplication.

use crate::Pixel;

/// Deduplicated pixels: each unique color with the number of times it appears.
///
/// The colors are sorted in ascending order of their packed ARGB value.
///
/// # Examples
/// ```
/// # use pnnquant::UniqueColorCounts;
/// let pixels = [0xFF00_0000, 0xFFFF_FFFF, 0xFF00_0000];
/// let counts = UniqueColorCounts::new(&pixels);
/// assert_eq!(counts.colors(), &[0xFF00_0000, 0xFFFF_FFFF]);
/// assert_eq!(counts.counts(), &[2, 1]);
/// assert_eq!(counts.total_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniqueColorCounts {
    /// The unique colors.
    colors: Vec<Pixel>,
    /// The number of times each color appears.
    counts: Vec<u32>,
    /// The sum of `counts`.
    total_count: u32,
}

impl UniqueColorCounts {
    /// Deduplicates a slice of pixels.
    #[must_use]
    pub fn new(pixels: &[Pixel]) -> Self {
        let mut sorted = pixels.to_vec();
        sorted.sort_unstable();

        let mut colors = Vec::new();
        let mut counts = Vec::<u32>::new();
        for pixel in sorted {
            if colors.last() == Some(&pixel) {
                if let Some(count) = counts.last_mut() {
                    *count += 1;
                }
            } else {
                colors.push(pixel);
                counts.push(1);
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let total_count = pixels.len() as u32;

        Self { colors, counts, total_count }
    }

    /// The unique colors in ascending order.
    #[must_use]
    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    /// The number of pixels of each unique color.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// The number of pixels before deduplication.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// The number of unique colors.
    #[must_use]
    pub fn num_colors(&self) -> usize {
        self.colors.len()
    }

    /// Iterates over each unique color together with its count.
    pub fn iter(&self) -> impl Iterator<Item = (Pixel, u32)> + '_ {
        self.colors.iter().copied().zip(self.counts.iter().copied())
    }
}
