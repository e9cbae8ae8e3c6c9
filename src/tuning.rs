//! Empirically tuned constants and formulas.
//!
//! These values control the blend between the Euclidean and CIEDE2000 metrics, the count
//! scaling of histogram bins, and how aggressively the ditherer diffuses error. They were found
//! by visual comparison and are kept exactly as found; changing any of them changes the output
//! and needs a visual regression review.

/// Palettes up to this size use the full CIEDE2000 machinery and the strong dither weight.
pub(crate) const SMALL_PALETTE: usize = 32;

/// Palettes below this size use the finer 1-bit alpha bin key even without transparency.
pub(crate) const FINE_KEY_PALETTE: usize = 64;

/// Palettes above this size are treated as a near-lossless re-dither.
pub(crate) const NEAR_LOSSLESS: usize = 256;

/// The dither weight for small palettes and semi-transparent images.
pub(crate) const STRONG_DITHER_WEIGHT: f64 = 1.8;

/// The dither weight for two color palettes.
pub(crate) const TWO_COLOR_DITHER_WEIGHT: f64 = 1.5;

/// Upper bound of the dither weight for mid-size palettes.
pub(crate) const MAX_DITHER_WEIGHT: f64 = 0.9;

/// The error queue weights decay by `(BLOCK_SIZE + 1)^(1 / (DITHER_MAX - 1))` per step.
pub(crate) const BLOCK_SIZE: f32 = 343.0;

/// Blue-noise tile values above this mark a pixel as being in a "diffuse" region.
pub(crate) const DIFFUSE_THRESHOLD: i8 = -88;

/// Strength of the blue-noise perturbation.
pub(crate) const BLUE_NOISE_STRENGTH: f32 = 1.0 / 3.0;

/// The band of saliency values for which the ditherer perturbs the probe color.
pub(crate) const SALIENCY_BAND: (f32, f32) = (0.65, 0.75);

/// Semi-transparent alpha differences are divided by `e^1.718`.
pub(crate) fn semi_transparent_alpha_scale() -> f64 {
    1.0 / 1.718f64.exp()
}

/// Channel weights for the RGB metrics.
pub(crate) fn channel_weights(
    semi_transparent: bool,
    palette_size: usize,
    width: u32,
    height: u32,
) -> [f64; 3] {
    if semi_transparent || palette_size <= SMALL_PALETTE {
        [1.0, 1.0, 1.0]
    } else if width < 512 || height < 512 {
        [0.299, 0.587, 0.114]
    } else {
        [0.2126, 0.7152, 0.0722]
    }
}

/// How bin pixel counts are damped before clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountScaling {
    /// Counts are used as is.
    None,
    /// Square root of the count.
    Sqrt,
    /// Square root of the count, truncated to an integer.
    SqrtTruncated,
    /// Cube root of the count, truncated to an integer.
    CbrtTruncated,
}

impl CountScaling {
    /// Chooses the scaling from the palette size and the number of histogram bins.
    pub(crate) fn new(palette_size: usize, num_bins: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let proportional = (palette_size * palette_size) as f64 / num_bins as f64;
        if proportional < 0.03 {
            Self::None
        } else if palette_size < 16 {
            Self::CbrtTruncated
        } else if palette_size < FINE_KEY_PALETTE {
            Self::Sqrt
        } else {
            Self::SqrtTruncated
        }
    }

    /// Applies the scaling to a pixel count.
    pub(crate) fn apply(self, count: f64) -> f64 {
        match self {
            Self::None => count,
            Self::Sqrt => count.sqrt(),
            Self::SqrtTruncated => count.sqrt().trunc(),
            Self::CbrtTruncated => count.cbrt().trunc(),
        }
    }
}

/// The blend between Euclidean Lab distance (`0.0`) and CIEDE2000 (`1.0`).
pub(crate) fn lab_ratio(palette_size: usize, num_bins: usize, semi_transparent: bool) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let (k, bins) = (palette_size as f64, num_bins as f64);
    let proportional = k * k / bins;
    let weight = (k / bins).min(MAX_DITHER_WEIGHT);

    if palette_size <= SMALL_PALETTE {
        1.0
    } else if semi_transparent {
        0.5
    } else if palette_size < FINE_KEY_PALETTE {
        if proportional > 3.13f64.exp() {
            0.0
        } else if proportional > 2.28f64.exp() {
            (1.0 - 1.0 / proportional).clamp(0.0, 1.0)
        } else if proportional > 1.0 {
            (weight * 3.275f64.exp()).clamp(0.0, 1.0)
        } else {
            1.0
        }
    } else if palette_size > NEAR_LOSSLESS {
        (1.0 - 1.0 / proportional).clamp(0.0, 1.0)
    } else {
        (1.0 - weight * 0.7).max(0.98).min(1.0)
    }
}

/// The dither weight used by the orchestrator.
pub(crate) fn dither_weight(palette_size: usize, semi_transparent: bool, unique_colors: usize) -> f64 {
    if semi_transparent || palette_size <= SMALL_PALETTE {
        if palette_size > 2 {
            STRONG_DITHER_WEIGHT
        } else {
            TWO_COLOR_DITHER_WEIGHT
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let weight = palette_size as f64 / unique_colors.max(1) as f64;
        weight.min(MAX_DITHER_WEIGHT)
    }
}

/// The length of the error queue for a dither weight.
pub(crate) fn dither_queue_len(weight: f64) -> usize {
    if weight < 0.01 {
        if weight > 0.0025 {
            25
        } else {
            16
        }
    } else {
        9
    }
}

/// The residual magnitude above which the ditherer compresses error.
pub(crate) fn dither_max(
    palette_size: usize,
    weight: f64,
    has_alpha: bool,
    has_saliency: bool,
) -> f32 {
    let queue_len = dither_queue_len(weight);
    #[allow(clippy::cast_precision_loss)]
    let (k, dm) = (palette_size as f64, queue_len as f64);

    let edge = if has_alpha { 1.0 } else { weight.exp() + 0.25 };
    let deviation = if !has_alpha && weight > 0.002 { 0.25 } else { 1.0 };

    let mut dither_max = if has_alpha || queue_len > 9 {
        let d = dm.sqrt() + edge * deviation;
        d * d
    } else if has_saliency {
        dm * 2.0
    } else {
        dm * std::f64::consts::E
    };

    let density = if palette_size > 16 { 3200.0 } else { 1500.0 };
    let strong = (5.0 + edge) * (5.0 + edge);
    if k / weight > 5000.0 && (weight > 0.045 || (weight > 0.01 && palette_size < FINE_KEY_PALETTE)) {
        dither_max = strong;
    } else if weight < 0.03 && k / weight < density && (16..NEAR_LOSSLESS).contains(&palette_size) {
        dither_max = strong;
    }

    #[allow(clippy::cast_possible_truncation)]
    {
        dither_max as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_len_thresholds() {
        assert_eq!(dither_queue_len(STRONG_DITHER_WEIGHT), 9);
        assert_eq!(dither_queue_len(0.5), 9);
        assert_eq!(dither_queue_len(0.005), 25);
        assert_eq!(dither_queue_len(0.001), 16);
    }

    #[test]
    fn small_palettes_use_full_ciede2000() {
        for k in [2, 16, 32] {
            assert!((lab_ratio(k, 5000, false) - 1.0).abs() < f64::EPSILON);
            assert!((lab_ratio(k, 5000, true) - 1.0).abs() < f64::EPSILON);
        }
        assert!((lab_ratio(128, 5000, true) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_stays_in_unit_range() {
        for k in [33, 48, 63, 64, 100, 256, 300, 1024] {
            for bins in [k, 2 * k, 1000, 65536] {
                let ratio = lab_ratio(k, bins, false);
                assert!((0.0..=1.0).contains(&ratio), "k={k} bins={bins} ratio={ratio}");
            }
        }
    }

    #[test]
    fn count_scaling_choice() {
        assert_eq!(CountScaling::new(8, 65536), CountScaling::None);
        assert_eq!(CountScaling::new(8, 100), CountScaling::CbrtTruncated);
        assert_eq!(CountScaling::new(32, 1000), CountScaling::Sqrt);
        assert_eq!(CountScaling::new(128, 1000), CountScaling::SqrtTruncated);
        assert!((CountScaling::CbrtTruncated.apply(30.0) - 3.0).abs() < f64::EPSILON);
        assert!((CountScaling::Sqrt.apply(2.0) - 2f64.sqrt()).abs() < f64::EPSILON);
    }

    #[test]
    fn dither_max_is_positive() {
        for k in [2, 8, 16, 32, 64, 256, 512] {
            for weight in [0.001, 0.005, 0.02, 0.05, 0.5, 1.5, 1.8] {
                for has_alpha in [false, true] {
                    assert!(dither_max(k, weight, has_alpha, false) > 0.0);
                }
            }
        }
    }
}
