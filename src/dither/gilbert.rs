//! Generalized Hilbert ("gilbert") curve traversal of rectangles of any size.
//!
//! A rectangle is split into up to three sub-rectangles that are traversed recursively,
//! so that consecutive pixels on the curve are always neighbors (including diagonal neighbors
//! for some odd sizes). This keeps the error queue of the ditherer spatially local.

/// Visits every `(x, y)` of a `width` by `height` rectangle exactly once along the curve.
pub fn traverse(width: u32, height: u32, visit: &mut impl FnMut(u32, u32)) {
    if width == 0 || height == 0 {
        return;
    }

    let (w, h) = (i64::from(width), i64::from(height));
    if width >= height {
        generate(0, 0, w, 0, 0, h, visit);
    } else {
        generate(0, 0, 0, h, w, 0, visit);
    }
}

/// Traverses the rectangle at `(x, y)` spanned by the major axis `(ax, ay)`
/// and the minor axis `(bx, by)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate(
    mut x: i64,
    mut y: i64,
    ax: i64,
    ay: i64,
    bx: i64,
    by: i64,
    visit: &mut impl FnMut(u32, u32),
) {
    let w = (ax + ay).abs();
    let h = (bx + by).abs();
    let (dax, day) = (ax.signum(), ay.signum());
    let (dbx, dby) = (bx.signum(), by.signum());

    if h == 1 {
        for _ in 0..w {
            visit(x as u32, y as u32);
            x += dax;
            y += day;
        }
        return;
    }

    if w == 1 {
        for _ in 0..h {
            visit(x as u32, y as u32);
            x += dbx;
            y += dby;
        }
        return;
    }

    let (mut ax2, mut ay2) = (ax.div_euclid(2), ay.div_euclid(2));
    let (mut bx2, mut by2) = (bx.div_euclid(2), by.div_euclid(2));
    let w2 = (ax2 + ay2).abs();
    let h2 = (bx2 + by2).abs();

    if 2 * w > 3 * h {
        // long case: split in two along the major axis
        if w2 % 2 != 0 && w > 2 {
            ax2 += dax;
            ay2 += day;
        }
        generate(x, y, ax2, ay2, bx, by, visit);
        generate(x + ax2, y + ay2, ax - ax2, ay - ay2, bx, by, visit);
    } else {
        if h2 % 2 != 0 && h > 2 {
            bx2 += dbx;
            by2 += dby;
        }
        generate(x, y, bx2, by2, ax2, ay2, visit);
        generate(x + bx2, y + by2, ax, ay, bx - bx2, by - by2, visit);
        generate(
            x + (ax - dax) + (bx2 - dbx),
            y + (ay - day) + (by2 - dby),
            -bx2,
            -by2,
            -(ax - ax2),
            -(ay - ay2),
            visit,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(width: u32, height: u32) -> Vec<(u32, u32)> {
        let mut points = Vec::new();
        traverse(width, height, &mut |x, y| points.push((x, y)));
        points
    }

    #[test]
    fn small_curves() {
        assert_eq!(
            curve(4, 2),
            vec![(0, 0), (0, 1), (1, 1), (1, 0), (2, 0), (2, 1), (3, 1), (3, 0)]
        );
        assert_eq!(
            curve(3, 3),
            vec![(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (1, 1), (1, 0), (2, 0)]
        );
        assert_eq!(curve(5, 1), vec![(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)]);
        assert_eq!(curve(1, 3), vec![(0, 0), (0, 1), (0, 2)]);
        assert!(curve(0, 7).is_empty());
    }

    #[test]
    fn visits_every_pixel_once() {
        for width in 1..24 {
            for height in 1..24 {
                let points = curve(width, height);
                assert_eq!(points.len(), (width * height) as usize);

                let mut seen = vec![false; (width * height) as usize];
                for &(x, y) in &points {
                    assert!(x < width && y < height);
                    let i = (x + y * width) as usize;
                    assert!(!seen[i], "{width}x{height} visits ({x}, {y}) twice");
                    seen[i] = true;
                }
            }
        }
    }

    #[test]
    fn consecutive_pixels_are_adjacent() {
        for width in 1..24 {
            for height in 1..24 {
                let points = curve(width, height);
                for pair in points.windows(2) {
                    let (x1, y1) = pair[0];
                    let (x2, y2) = pair[1];
                    let (dx, dy) = (x1.abs_diff(x2), y1.abs_diff(y2));
                    assert!(dx <= 1 && dy <= 1 && dx + dy > 0, "{width}x{height}: {pair:?}");
                    if width % 2 == 0 && height % 2 == 0 {
                        assert_eq!(dx + dy, 1, "{width}x{height}: {pair:?}");
                    }
                }
            }
        }
    }
}
