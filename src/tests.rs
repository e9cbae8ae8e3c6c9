use crate::{types::pack, Pixel};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::collections::HashSet;

/// `n` opaque pixels generated from `seed`, possibly with repeats.
pub fn test_pixels_seeded(n: usize, seed: u64) -> Vec<Pixel> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    (0..n).map(|_| 0xFF00_0000 | rng.gen::<u32>() >> 8).collect()
}

/// `n` distinct opaque pixels.
pub fn test_pixels(n: usize) -> Vec<Pixel> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(42);
    let mut seen = HashSet::new();
    let mut pixels = Vec::with_capacity(n);
    while pixels.len() < n {
        let pixel = 0xFF00_0000 | rng.gen::<u32>() >> 8;
        if seen.insert(pixel) {
            pixels.push(pixel);
        }
    }
    pixels
}

/// `n` pixels with random alpha, including fully transparent and fully opaque ones.
pub fn test_pixels_with_alpha(n: usize) -> Vec<Pixel> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(7);
    (0..n)
        .map(|i| {
            let alpha: u8 = match i % 4 {
                0 => 0,
                1 => u8::MAX,
                _ => rng.gen(),
            };
            u32::from(alpha) << 24 | rng.gen::<u32>() >> 8
        })
        .collect()
}

/// `n` opaque pixels drawn from exactly `distinct` colors (`distinct <= n`).
pub fn test_pixels_with_duplicates(n: usize, distinct: usize) -> Vec<Pixel> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(123);
    let colors = test_pixels(distinct);
    let mut pixels = colors.clone();
    pixels.extend((distinct..n).map(|_| colors[rng.gen_range(0..distinct)]));
    pixels.shuffle(&mut rng);
    pixels
}

/// A checkerboard of `a` and `b`, starting with `a` at the top left.
pub fn checkerboard(width: u32, height: u32, a: Pixel, b: Pixel) -> Vec<Pixel> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| if (x + y) % 2 == 0 { a } else { b }))
        .collect()
}

/// A smooth opaque gradient with red along x, green along y, and blue along the diagonal.
#[allow(clippy::cast_possible_truncation)]
pub fn gradient(width: u32, height: u32) -> Vec<Pixel> {
    let (w, h) = (width.max(2) - 1, height.max(2) - 1);
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let r = (x * 255 / w) as u8;
                let g = (y * 255 / h) as u8;
                let b = ((x + y) * 255 / (w + h)) as u8;
                pack(r, g, b, u8::MAX)
            })
        })
        .collect()
}
