//! Canny edge detection on an image that has already been smoothed.
//!
//! Gradients come from 3x3 Sobel operators and use the L1 magnitude
//! `|gx| + |gy|`. Non-maximum suppression quantizes the gradient direction into
//! four bins (0°, 45°, 90°, 135°) and compares each pixel with its two neighbors
//! along that direction. Hysteresis then keeps every candidate 8-connected to a
//! strong pixel.
//!
//! The outermost 1-pixel frame is never marked, so neighbor lookups stay in bounds.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

const TAN_22_5_DEG: f32 = 0.414_213_56;

/// L1 Sobel gradient magnitude, row-major
pub fn gradient_magnitude(img: &GrayImage) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);

    let gx: Vec<f32> = gx.pixels().map(|p| p[0] as f32).collect();
    let gy: Vec<f32> = gy.pixels().map(|p| p[0] as f32).collect();
    let mag = gx.iter().zip(&gy).map(|(x, y)| x.abs() + y.abs()).collect();
    (gx, gy, mag)
}

/// Binary edge map (0 or 255). Pixels above `high` seed edges, pixels above `low`
/// extend them.
pub fn canny(img: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    let (w, h) = (w as usize, h as usize);
    let (gx, gy, mag) = gradient_magnitude(img);

    let mut candidate = vec![false; w * h];
    let mut seeds = Vec::new();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }

            let abs_gx = gx[i].abs();
            let abs_gy = gy[i].abs();
            let same_sign = (gx[i] >= 0.0) == (gy[i] >= 0.0);

            // (before, after) along the gradient; `before` has the lower index
            let (before, after) = if abs_gy <= abs_gx * TAN_22_5_DEG {
                (i - 1, i + 1)
            } else if abs_gx <= abs_gy * TAN_22_5_DEG {
                (i - w, i + w)
            } else if same_sign {
                (i - w - 1, i + w + 1)
            } else {
                (i - w + 1, i + w - 1)
            };

            // Strict on one side so a tied pair yields a 1-pixel line
            if m <= mag[before] || m < mag[after] {
                continue;
            }

            candidate[i] = true;
            if m > high {
                seeds.push(i);
            }
        }
    }

    let mut marked = vec![false; w * h];
    while let Some(i) = seeds.pop() {
        if marked[i] {
            continue;
        }
        marked[i] = true;
        let (x, y) = (i % w, i / w);
        out.put_pixel(x as u32, y as u32, Luma([255]));

        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let j = ny * w + nx;
                if candidate[j] && !marked[j] {
                    seeds.push(j);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_step(width: u32, height: u32, split: u32, left: u8, right: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([if x < split { left } else { right }]))
    }

    #[test]
    fn flat_image_has_no_edges() {
        let edges = canny(&GrayImage::from_pixel(20, 20, Luma([90])), 50.0, 200.0);
        assert!(edges.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn tiny_image_is_empty() {
        let edges = canny(&GrayImage::from_pixel(2, 5, Luma([0])), 50.0, 200.0);
        assert_eq!(edges.dimensions(), (2, 5));
        assert!(edges.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn step_gives_single_pixel_line() {
        let img = vertical_step(30, 20, 15, 0, 200);
        let edges = canny(&img, 50.0, 200.0);
        for y in 1..19 {
            let row: Vec<u32> = (0..30).filter(|&x| edges.get_pixel(x, y)[0] == 255).collect();
            assert_eq!(row, vec![14], "row {}", y);
        }
    }

    #[test]
    fn weak_step_below_high_threshold_is_dropped() {
        // Unblurred step of 40 gives |gx| = 160
        let edges = canny(&vertical_step(30, 20, 15, 0, 40), 50.0, 200.0);
        assert!(edges.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn weak_pixels_connected_to_strong_ones_survive() {
        // Left half of the step is strong, right half weak, on the same line
        let img = GrayImage::from_fn(40, 20, |x, y| {
            let bright = if y < 10 { 200 } else { 40 };
            Luma([if x < 20 { 0 } else { bright }])
        });
        let edges = canny(&img, 50.0, 200.0);
        assert_eq!(edges.get_pixel(19, 4)[0], 255);
        assert_eq!(edges.get_pixel(19, 15)[0], 255);
    }

    #[test]
    fn isolated_weak_edge_is_dropped() {
        let img = GrayImage::from_fn(40, 20, |x, _| {
            Luma([match x {
                0..=9 => 0,
                10..=29 => 200,
                _ => 240,
            }])
        });
        let edges = canny(&img, 50.0, 200.0);
        assert_eq!(edges.get_pixel(9, 10)[0], 255);
        // |gx| = 4 * 40 = 160 at the second step, not linked to the first
        assert!((25..40).all(|x| edges.get_pixel(x, 10)[0] == 0));
    }
}
